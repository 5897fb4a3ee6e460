use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::domain::entities::table::Table;

/// Where the destructive-change gate stands for the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    NoChallenge,
    Pending,
    Confirmed,
}

/// Result of submitting a confirmation code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Confirmed,
    Mismatch,
}

/// One-time code guarding row removals, plus the table version that triggered it.
///
/// The code is never regenerated once issued; only an external session reset
/// clears it.
#[derive(Debug, Clone)]
pub struct VerificationChallenge {
    code: String,
    confirmed: bool,
    gated: Table,
}

impl VerificationChallenge {
    pub fn issue<R: Rng + ?Sized>(rng: &mut R, code_length: usize, gated: Table) -> Self {
        Self {
            code: generate_code(rng, code_length),
            confirmed: false,
            gated,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }

    /// The reconciled table that was on screen when the challenge was issued.
    pub fn gated_table(&self) -> &Table {
        &self.gated
    }

    pub fn state(&self) -> GateState {
        if self.confirmed {
            GateState::Confirmed
        } else {
            GateState::Pending
        }
    }

    pub fn prompt(&self) -> String {
        format!("Type '{}' to confirm", self.code)
    }

    /// Exact, case-sensitive comparison. A wrong code always leaves the challenge
    /// unconfirmed, even if an earlier attempt had succeeded.
    pub fn attempt(&mut self, submitted: &str) -> AttemptOutcome {
        if submitted == self.code {
            self.confirmed = true;
            AttemptOutcome::Confirmed
        } else {
            self.confirmed = false;
            AttemptOutcome::Mismatch
        }
    }
}

/// Random code drawn from `[A-Za-z0-9]`.
pub fn generate_code<R: Rng + ?Sized>(rng: &mut R, length: usize) -> String {
    rng.sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn challenge() -> VerificationChallenge {
        let mut rng = StdRng::seed_from_u64(7);
        VerificationChallenge::issue(&mut rng, 3, Table::empty(vec!["a".into()]))
    }

    #[test]
    fn generated_code_is_alphanumeric_with_requested_length() {
        let mut rng = StdRng::seed_from_u64(1);
        for length in [0, 1, 3, 16] {
            let code = generate_code(&mut rng, length);
            assert_eq!(code.chars().count(), length);
            assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn new_challenge_is_pending() {
        let challenge = challenge();
        assert_eq!(challenge.state(), GateState::Pending);
        assert!(!challenge.is_confirmed());
        assert!(challenge.prompt().contains(challenge.code()));
    }

    #[test]
    fn exact_code_confirms() {
        let mut challenge = challenge();
        let code = challenge.code().to_string();
        assert_eq!(challenge.attempt(&code), AttemptOutcome::Confirmed);
        assert_eq!(challenge.state(), GateState::Confirmed);
    }

    #[test]
    fn wrong_code_keeps_pending_and_code() {
        let mut challenge = challenge();
        let code = challenge.code().to_string();
        let wrong = format!("{code}x");
        assert_eq!(challenge.attempt(&wrong), AttemptOutcome::Mismatch);
        assert_eq!(challenge.attempt(""), AttemptOutcome::Mismatch);
        assert_eq!(challenge.state(), GateState::Pending);
        assert_eq!(challenge.code(), code);
    }

    #[test]
    fn wrong_code_after_success_revokes_confirmation() {
        let mut challenge = challenge();
        let code = challenge.code().to_string();
        challenge.attempt(&code);
        assert_eq!(challenge.attempt("???"), AttemptOutcome::Mismatch);
        assert_eq!(challenge.state(), GateState::Pending);
    }
}
