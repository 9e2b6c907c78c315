//! The application loop: drives every saved listing to exactly one recorded
//! terminal outcome.
//!
//! Per-job failures never halt the batch — they are converted into attempt
//! outcomes right here at the loop boundary. Only session-level failures
//! (cannot log in, cannot load the saved-jobs view) propagate out.

use crate::attempt::{
    ApplicationAttempt, ApplyMode, Attempt, AttemptMachine, AttemptOutcome, JobListing,
    SessionReport,
};
use crate::browser::PageDriver;
use crate::config::BotConfig;
use crate::error::{AttemptError, BotError};
use crate::filler::{FillResult, FormFiller};
use crate::lister::JobLister;
use crate::openai::ChatCompleter;
use crate::session_log::SessionLogger;
use crate::ui::AttemptProgress;

pub struct ApplicationLoop<'a, D: PageDriver, C: ChatCompleter> {
    driver: &'a D,
    model: &'a C,
    config: &'a BotConfig,
}

impl<'a, D: PageDriver, C: ChatCompleter> ApplicationLoop<'a, D, C> {
    pub fn new(driver: &'a D, model: &'a C, config: &'a BotConfig) -> Self {
        Self {
            driver,
            model,
            config,
        }
    }

    /// Process all saved listings sequentially and return the final report.
    ///
    /// Every listing yields exactly one recorded attempt, including the ones
    /// whose job page cannot be opened.
    pub async fn run(
        &self,
        logger: &mut SessionLogger,
        max_jobs: Option<usize>,
    ) -> Result<SessionReport, BotError> {
        let lister = JobLister::new(self.driver);
        let mut cards = lister.saved_jobs().await?;
        if let Some(cap) = max_jobs {
            cards.truncate(cap);
        }
        let total = cards.len();
        let filler = FormFiller::new(self.driver, self.model, self.config);

        for (index, card) in cards.iter().enumerate() {
            let progress = AttemptProgress::start(index + 1, total, &card.title, &card.company);

            let mut attempt = match lister.inspect(card).await {
                Ok(listing) => Attempt::new(listing),
                Err(e) => {
                    // The job page itself would not open; record the failure
                    // and move on.
                    let mut attempt = Attempt::new(JobListing::new(
                        card.title.clone(),
                        card.company.clone(),
                        card.url.clone(),
                        ApplyMode::External,
                    ));
                    AttemptMachine::dispatch(&mut attempt);
                    attempt.reason = format!("job page unavailable: {e}");
                    attempt.errors.push(e.to_string());
                    AttemptMachine::finish(&mut attempt, AttemptOutcome::Failed);
                    let record = ApplicationAttempt::from_attempt(&attempt);
                    progress.complete(record.outcome, &record.reason);
                    logger.record(record)?;
                    continue;
                }
            };

            if attempt.listing.apply_mode.is_easy_apply() {
                AttemptMachine::dispatch(&mut attempt);
                match filler.apply(&attempt.listing).await {
                    FillResult::Submitted { fields_filled } => {
                        attempt.form_fields_filled = fields_filled;
                        AttemptMachine::finish(&mut attempt, AttemptOutcome::Succeeded);
                    }
                    FillResult::TimedOut { fields_filled } => {
                        attempt.form_fields_filled = fields_filled;
                        attempt.reason = AttemptError::TimeoutExceeded.to_string();
                        AttemptMachine::finish(&mut attempt, AttemptOutcome::TimedOut);
                    }
                    FillResult::Failed {
                        error,
                        fields_filled,
                        errors,
                    } => {
                        attempt.form_fields_filled = fields_filled;
                        attempt.errors = errors;
                        attempt.errors.push(error.to_string());
                        attempt.reason = error.to_string();
                        AttemptMachine::finish(&mut attempt, AttemptOutcome::Failed);
                    }
                }
            } else {
                // External apply: never dispatched to the form filler.
                attempt.reason = "not_easy_apply".into();
                AttemptMachine::finish(&mut attempt, AttemptOutcome::Skipped);
            }

            let record = ApplicationAttempt::from_attempt(&attempt);
            progress.complete(record.outcome, &record.reason);
            logger.record(record)?;
        }

        let report = logger.finalize()?;
        Ok(report)
    }
}
