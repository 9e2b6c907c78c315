use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::job::ApplicationAttempt;
use super::state::AttemptOutcome;

/// Aggregate counts for a whole run, derived entirely from the sequence of
/// [`ApplicationAttempt`] records. The outcome counts always sum to
/// `attempted`, which equals the number of listings processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub timed_out: usize,
    pub easy_apply_found: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SessionReport {
    pub fn from_attempts(attempts: &[ApplicationAttempt], started_at: DateTime<Utc>) -> Self {
        let mut report = Self {
            attempted: attempts.len(),
            succeeded: 0,
            failed: 0,
            skipped: 0,
            timed_out: 0,
            easy_apply_found: 0,
            started_at,
            finished_at: Utc::now(),
        };

        for attempt in attempts {
            if attempt.easy_apply {
                report.easy_apply_found += 1;
            }
            match attempt.outcome {
                AttemptOutcome::Succeeded => report.succeeded += 1,
                AttemptOutcome::Failed => report.failed += 1,
                AttemptOutcome::Skipped => report.skipped += 1,
                AttemptOutcome::TimedOut => report.timed_out += 1,
            }
        }

        report
    }

    /// Fraction of processed listings that ended in a submitted application.
    pub fn success_rate(&self) -> f64 {
        if self.attempted == 0 {
            return 0.0;
        }
        self.succeeded as f64 / self.attempted as f64
    }

    /// Outcome counts must sum to the total listings processed.
    pub fn is_consistent(&self) -> bool {
        self.succeeded + self.failed + self.skipped + self.timed_out == self.attempted
    }
}
