use rand::Rng;

use crate::domain::entities::challenge::{AttemptOutcome, GateState, VerificationChallenge};
use crate::domain::entities::table::Table;
use crate::error::EditorError;
use crate::usecase::ports::identity::{IdentityProvider, Principal};

/// Per-operator editing context.
///
/// Created at login, threaded through every reconciliation call, dropped at logout.
/// Holds the destructive-change challenge so nothing about the gate lives in
/// process-wide state.
#[derive(Debug, Clone)]
pub struct EditSession {
    principal: Principal,
    code_length: usize,
    challenge: Option<VerificationChallenge>,
}

impl EditSession {
    pub fn start(principal: Principal, code_length: usize) -> Result<Self, EditorError> {
        if !principal.is_authenticated {
            tracing::warn!(principal = %principal.name, "rejected unauthenticated session");
            return Err(EditorError::Unauthenticated);
        }
        if code_length == 0 {
            return Err(EditorError::Config(
                "verification code length must be at least 1".to_string(),
            ));
        }
        tracing::info!(principal = %principal.name, "editing session started");
        Ok(Self {
            principal,
            code_length,
            challenge: None,
        })
    }

    pub fn from_provider(
        provider: &dyn IdentityProvider,
        code_length: usize,
    ) -> Result<Self, EditorError> {
        let principal = provider
            .current_principal()
            .ok_or(EditorError::Unauthenticated)?;
        Self::start(principal, code_length)
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn gate_state(&self) -> GateState {
        self.challenge
            .as_ref()
            .map(VerificationChallenge::state)
            .unwrap_or(GateState::NoChallenge)
    }

    pub fn challenge(&self) -> Option<&VerificationChallenge> {
        self.challenge.as_ref()
    }

    /// Issues a challenge for `gated` unless one already exists. Returns the live one.
    pub fn ensure_challenge<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        gated: &Table,
    ) -> &VerificationChallenge {
        let code_length = self.code_length;
        self.challenge.get_or_insert_with(|| {
            tracing::info!(code_length, rows = gated.row_count(), "removal challenge issued");
            VerificationChallenge::issue(rng, code_length, gated.clone())
        })
    }

    /// Submits a code against the live challenge. `None` when no challenge exists.
    pub fn attempt(&mut self, submitted: &str) -> Option<AttemptOutcome> {
        let outcome = self.challenge.as_mut()?.attempt(submitted);
        tracing::info!(?outcome, "removal confirmation attempt");
        Some(outcome)
    }

    /// Clears the challenge. Only callers outside the reconciliation flow do this.
    pub fn reset_challenge(&mut self) {
        self.challenge = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn operator() -> Principal {
        Principal::authenticated("operator")
    }

    #[test]
    fn unauthenticated_principal_cannot_start_session() {
        let principal = Principal {
            name: "guest".into(),
            is_authenticated: false,
        };
        assert!(matches!(
            EditSession::start(principal, 3),
            Err(EditorError::Unauthenticated)
        ));
    }

    #[test]
    fn zero_length_code_is_rejected() {
        assert!(matches!(
            EditSession::start(operator(), 0),
            Err(EditorError::Config(_))
        ));
    }

    #[test]
    fn challenge_is_issued_once() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut session = EditSession::start(operator(), 3).expect("session should start");
        let table = Table::empty(vec!["a".into()]);

        let first = session.ensure_challenge(&mut rng, &table).code().to_string();
        let second = session.ensure_challenge(&mut rng, &table).code().to_string();

        assert_eq!(first, second);
        assert_eq!(session.gate_state(), GateState::Pending);
    }

    #[test]
    fn reset_returns_to_no_challenge() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut session = EditSession::start(operator(), 3).expect("session should start");
        session.ensure_challenge(&mut rng, &Table::empty(Vec::new()));
        session.reset_challenge();
        assert_eq!(session.gate_state(), GateState::NoChallenge);
        assert_eq!(session.attempt("abc"), None);
    }
}
