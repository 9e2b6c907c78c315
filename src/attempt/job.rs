use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::state::{AttemptOutcome, AttemptState};

/// How a listing can be applied to. Only in-platform Easy Apply listings are
/// ever dispatched to the form filler; everything else is external.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyMode {
    EasyApply,
    External,
}

impl ApplyMode {
    pub fn is_easy_apply(&self) -> bool {
        matches!(self, ApplyMode::EasyApply)
    }
}

/// A saved job listing as enumerated from the saved-jobs view.
/// Produced once by the lister; not persisted beyond the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobListing {
    pub id: String,
    pub title: String,
    pub company: String,
    pub url: String,
    pub apply_mode: ApplyMode,
}

impl JobListing {
    pub fn new(title: String, company: String, url: String, apply_mode: ApplyMode) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            company,
            url,
            apply_mode,
        }
    }
}

/// Configuration for model-call retry behavior inside the form filler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retries before marking the attempt as failed.
    pub max_retries: u32,
    /// Base delay in milliseconds for exponential backoff.
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
        }
    }
}

impl RetryConfig {
    /// Calculate the delay for a given retry attempt using exponential backoff.
    /// delay = base_delay_ms * 2^(attempt - 1)
    pub fn delay_for_attempt(&self, attempt: u32) -> u64 {
        self.base_delay_ms * 2u64.pow(attempt.saturating_sub(1))
    }
}

/// One in-flight application attempt, mutated only through
/// [`AttemptMachine`](super::state::AttemptMachine).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attempt {
    pub id: String,
    pub listing: JobListing,
    pub state: AttemptState,
    pub state_history: Vec<AttemptState>,
    pub outcome: Option<AttemptOutcome>,
    pub reason: String,
    pub form_fields_filled: Vec<String>,
    pub errors: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Attempt {
    pub fn new(listing: JobListing) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            listing,
            state: AttemptState::Pending,
            state_history: Vec::new(),
            outcome: None,
            reason: String::new(),
            form_fields_filled: Vec::new(),
            errors: Vec::new(),
            started_at: now,
            updated_at: now,
        }
    }

    pub(super) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Immutable record of one completed attempt, appended to the session log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationAttempt {
    pub attempt_id: String,
    pub job_title: String,
    pub company: String,
    pub job_url: String,
    pub easy_apply: bool,
    pub outcome: AttemptOutcome,
    pub reason: String,
    pub form_fields_filled: Vec<String>,
    pub errors: Vec<String>,
    pub state_transitions: Vec<AttemptState>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: i64,
}

impl ApplicationAttempt {
    /// Generate the log record from a finished attempt.
    ///
    /// Attempts without an outcome are recorded as failed — a finished
    /// attempt must always resolve to one of the four terminal kinds.
    pub fn from_attempt(attempt: &Attempt) -> Self {
        let now = Utc::now();
        let duration = now - attempt.started_at;
        let mut transitions = attempt.state_history.clone();
        transitions.push(attempt.state);

        Self {
            attempt_id: attempt.id.clone(),
            job_title: attempt.listing.title.clone(),
            company: attempt.listing.company.clone(),
            job_url: attempt.listing.url.clone(),
            easy_apply: attempt.listing.apply_mode.is_easy_apply(),
            outcome: attempt.outcome.unwrap_or(AttemptOutcome::Failed),
            reason: attempt.reason.clone(),
            form_fields_filled: attempt.form_fields_filled.clone(),
            errors: attempt.errors.clone(),
            state_transitions: transitions,
            started_at: attempt.started_at,
            finished_at: now,
            duration_ms: duration.num_milliseconds(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attempt::state::AttemptMachine;

    fn listing(mode: ApplyMode) -> JobListing {
        JobListing::new(
            "Backend Engineer".into(),
            "Acme".into(),
            "https://example.com/jobs/42".into(),
            mode,
        )
    }

    #[test]
    fn attempt_creation_defaults() {
        let attempt = Attempt::new(listing(ApplyMode::EasyApply));
        assert_eq!(attempt.state, AttemptState::Pending);
        assert!(attempt.outcome.is_none());
        assert!(attempt.state_history.is_empty());
        assert!(attempt.form_fields_filled.is_empty());
    }

    #[test]
    fn retry_config_exponential_backoff() {
        let config = RetryConfig {
            max_retries: 5,
            base_delay_ms: 1000,
        };
        assert_eq!(config.delay_for_attempt(1), 1000);
        assert_eq!(config.delay_for_attempt(2), 2000);
        assert_eq!(config.delay_for_attempt(3), 4000);
        assert_eq!(config.delay_for_attempt(4), 8000);
    }

    #[test]
    fn record_from_finished_attempt() {
        let mut attempt = Attempt::new(listing(ApplyMode::EasyApply));
        AttemptMachine::dispatch(&mut attempt);
        attempt.form_fields_filled.push("phone".into());
        AttemptMachine::finish(&mut attempt, AttemptOutcome::Succeeded);

        let record = ApplicationAttempt::from_attempt(&attempt);
        assert_eq!(record.attempt_id, attempt.id);
        assert_eq!(record.job_title, "Backend Engineer");
        assert!(record.easy_apply);
        assert_eq!(record.outcome, AttemptOutcome::Succeeded);
        assert_eq!(record.form_fields_filled, vec!["phone".to_string()]);
        assert_eq!(
            record.state_transitions,
            vec![
                AttemptState::Pending,
                AttemptState::InProgress,
                AttemptState::Done
            ]
        );
    }

    #[test]
    fn record_without_outcome_defaults_to_failed() {
        let attempt = Attempt::new(listing(ApplyMode::EasyApply));
        let record = ApplicationAttempt::from_attempt(&attempt);
        assert_eq!(record.outcome, AttemptOutcome::Failed);
    }

    #[test]
    fn listing_serialization_roundtrip() {
        let l = listing(ApplyMode::External);
        let json = serde_json::to_string(&l).unwrap();
        assert!(json.contains(r#""apply_mode":"external""#));
        let parsed: JobListing = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, l.id);
        assert_eq!(parsed.apply_mode, ApplyMode::External);
    }
}
