//! Saved-jobs enumeration and Easy Apply classification.
//!
//! One pass over the saved-jobs view: enumeration yields lightweight
//! [`SavedJobCard`]s, and `inspect` opens each job page to decide whether it
//! exposes the in-platform Easy Apply control. Re-enumeration requires
//! navigating again.

use serde::Deserialize;

use crate::attempt::{ApplyMode, JobListing};
use crate::browser::{BrowserError, PageDriver};
use crate::error::BotError;

pub const SAVED_JOBS_URL: &str = "https://www.linkedin.com/my-items/saved-jobs/?cardType=SAVED";

// Pulls title/company/url out of each saved-job card. Only entries with a
// job URL are kept; LinkedIn mixes other card types into the same list.
const EXTRACT_CARDS_JS: &str = r#"
(() => {
  const cards = Array.from(document.querySelectorAll('li.reusable-search__result-container'));
  return cards.map(card => {
    const link = card.querySelector('.entity-result__title-text a');
    const company = card.querySelector('.entity-result__primary-subtitle');
    return {
      title: link ? link.innerText.trim() : '',
      company: company ? company.innerText.trim() : '',
      url: link ? link.href.split('?')[0] : ''
    };
  }).filter(c => c.url.includes('/jobs/view/'));
})()
"#;

// A listing is Easy Apply only when the top-card apply button says so.
// A plain "Apply" button redirects off-site and counts as external.
const CLASSIFY_JS: &str = r#"
(() => {
  const button = document.querySelector('.jobs-apply-button--top-card button, button.jobs-apply-button');
  const label = button ? (button.innerText + ' ' + (button.getAttribute('aria-label') || '')) : '';
  return { easy_apply: label.includes('Easy Apply') };
})()
"#;

/// One entry from the saved-jobs view, before classification.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SavedJobCard {
    pub title: String,
    pub company: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct Classification {
    easy_apply: bool,
}

/// Enumerates and classifies saved jobs through an authenticated session.
pub struct JobLister<'a, D: PageDriver> {
    driver: &'a D,
}

impl<'a, D: PageDriver> JobLister<'a, D> {
    pub fn new(driver: &'a D) -> Self {
        Self { driver }
    }

    /// Navigate to the saved-jobs view and enumerate its entries.
    ///
    /// Failure here is fatal for the run: with no listings there is nothing
    /// to process.
    pub async fn saved_jobs(&self) -> Result<Vec<SavedJobCard>, BotError> {
        self.driver
            .goto(SAVED_JOBS_URL)
            .await
            .map_err(|e| BotError::SavedJobsUnavailable(e.to_string()))?;

        let value = self
            .driver
            .eval_json(EXTRACT_CARDS_JS)
            .await
            .map_err(|e| BotError::SavedJobsUnavailable(e.to_string()))?;

        let cards: Vec<SavedJobCard> = serde_json::from_value(value)
            .map_err(|e| BotError::SavedJobsUnavailable(format!("bad card data: {e}")))?;
        Ok(cards)
    }

    /// Open the job page and classify it, leaving the page positioned on the
    /// listing so a dispatch can click the apply control directly.
    pub async fn inspect(&self, card: &SavedJobCard) -> Result<JobListing, BrowserError> {
        self.driver.goto(&card.url).await?;
        let value = self.driver.eval_json(CLASSIFY_JS).await?;
        let classification: Classification = serde_json::from_value(value)
            .map_err(|e| BrowserError::Eval(format!("bad classification data: {e}")))?;

        let mode = if classification.easy_apply {
            ApplyMode::EasyApply
        } else {
            ApplyMode::External
        };
        Ok(JobListing::new(
            card.title.clone(),
            card.company.clone(),
            card.url.clone(),
            mode,
        ))
    }
}
