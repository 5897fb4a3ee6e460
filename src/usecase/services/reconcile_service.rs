use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::entities::challenge::{AttemptOutcome, GateState};
use crate::domain::entities::session::EditSession;
use crate::domain::entities::table::Table;
use crate::domain::rules::dates::normalize_dates;
use crate::domain::rules::row_diff::{diff_rows, RowDiff};
use crate::error::EditorError;

/// What one editing round produced, ready for the presentation layer.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub diff: RowDiff,
    /// `None` when the round had no removals and the gate was bypassed.
    pub gate: Option<GateState>,
    /// Confirmation prompt, present only while removals wait for a code.
    pub prompt: Option<String>,
    /// Outcome of the code submitted with this round, if any.
    pub attempt: Option<AttemptOutcome>,
    /// Whether the edited table (rather than the original) was accepted.
    pub edits_accepted: bool,
    /// Accepted table after date normalization.
    pub accepted: Table,
}

impl Reconciliation {
    pub fn removed_count(&self) -> usize {
        self.diff.removed_count()
    }

    pub fn added_count(&self) -> usize {
        self.diff.added_count()
    }

    /// Removals are waiting for a matching code.
    pub fn is_blocked(&self) -> bool {
        self.gate == Some(GateState::Pending)
    }
}

/// Diff, destructive-change gate, then date normalization.
pub struct ReconcileService<R = StdRng> {
    rng: R,
}

impl ReconcileService<StdRng> {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl Default for ReconcileService<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> ReconcileService<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Compares `edited` against `original` and decides which one is accepted.
    ///
    /// Removals engage the gate: a challenge is issued the first time, `submitted`
    /// (if any) is checked against it, and the original table stays in force until
    /// the session's challenge is confirmed. Additions alone never need a code.
    pub fn reconcile(
        &mut self,
        session: &mut EditSession,
        original: &Table,
        edited: &Table,
        submitted: Option<&str>,
    ) -> Result<Reconciliation, EditorError> {
        let diff = diff_rows(original, edited)?;
        tracing::debug!(
            removed = diff.removed_count(),
            added = diff.added_count(),
            "rows reconciled"
        );

        let mut attempt = None;
        let gate = if diff.has_removals() {
            tracing::warn!(removed = diff.removed_count(), "row removal requires confirmation");
            session.ensure_challenge(&mut self.rng, edited);
            if let Some(code) = submitted {
                attempt = session.attempt(code);
            }
            Some(session.gate_state())
        } else {
            None
        };
        let prompt = match gate {
            Some(GateState::Pending) => session.challenge().map(|c| c.prompt()),
            _ => None,
        };

        if diff.added_count() > 0 {
            tracing::info!(added = diff.added_count(), "rows added to the original table");
        }

        let edits_accepted = !matches!(gate, Some(GateState::Pending));
        let accepted = if edits_accepted {
            normalize_dates(edited)
        } else {
            normalize_dates(original)
        };

        Ok(Reconciliation {
            diff,
            gate,
            prompt,
            attempt,
            edits_accepted,
            accepted,
        })
    }

    /// Submits a code outside of a reconciliation round.
    pub fn confirm(&self, session: &mut EditSession, submitted: &str) -> Option<AttemptOutcome> {
        session.attempt(submitted)
    }
}
