use std::fmt;

use serde::{Deserialize, Serialize};

use super::job::Attempt;

/// The states of a single application attempt.
///
/// Each listing flows through: PENDING → IN_PROGRESS → DONE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptState {
    Pending,
    InProgress,
    Done,
}

impl fmt::Display for AttemptState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptState::Pending => write!(f, "PENDING"),
            AttemptState::InProgress => write!(f, "IN_PROGRESS"),
            AttemptState::Done => write!(f, "DONE"),
        }
    }
}

/// The four terminal outcomes an attempt can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// The Easy Apply dialog was completed and Submit was hit.
    Succeeded,
    /// The attempt failed (model, form, verification or browser error).
    Failed,
    /// The listing was not dispatched (external apply).
    Skipped,
    /// The per-application time budget ran out.
    TimedOut,
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptOutcome::Succeeded => write!(f, "succeeded"),
            AttemptOutcome::Failed => write!(f, "failed"),
            AttemptOutcome::Skipped => write!(f, "skipped"),
            AttemptOutcome::TimedOut => write!(f, "timed_out"),
        }
    }
}

/// The result of evaluating a state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Advance to the next state.
    Next(AttemptState),
    /// The attempt has reached a terminal outcome.
    Complete(AttemptOutcome),
}

/// Drives an [`Attempt`] through its lifecycle.
///
/// The machine is deliberately small: `dispatch` marks the attempt as being
/// processed, `finish` records the terminal outcome. `finish` is accepted
/// from any state so that a failing dispatch path can never leave an attempt
/// stuck in `IN_PROGRESS`.
pub struct AttemptMachine;

impl AttemptMachine {
    /// PENDING → IN_PROGRESS. Idempotent for an attempt already in progress.
    pub fn dispatch(attempt: &mut Attempt) -> Transition {
        if attempt.state == AttemptState::Pending {
            attempt.state_history.push(attempt.state);
            attempt.state = AttemptState::InProgress;
        }
        attempt.touch();
        Transition::Next(attempt.state)
    }

    /// Any state → DONE, recording the terminal outcome unconditionally.
    pub fn finish(attempt: &mut Attempt, outcome: AttemptOutcome) -> Transition {
        if attempt.state != AttemptState::Done {
            attempt.state_history.push(attempt.state);
            attempt.state = AttemptState::Done;
        }
        attempt.outcome = Some(outcome);
        attempt.touch();
        Transition::Complete(outcome)
    }
}
