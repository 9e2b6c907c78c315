mod job;
mod report;
mod state;

pub use job::{ApplicationAttempt, ApplyMode, Attempt, JobListing, RetryConfig};
pub use report::SessionReport;
pub use state::{AttemptMachine, AttemptOutcome, AttemptState, Transition};
