//! The form-filling agent: a bounded observe-decide-act loop over the Easy
//! Apply dialog.
//!
//! Each step takes a screenshot plus a structured snapshot of the visible
//! form controls, asks the vision model for exactly one next action, applies
//! it, and re-observes. The loop terminates on submit, on an explicit
//! failure, on the per-application wall-clock budget, or on the step cap.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::{Instant, sleep};

use crate::attempt::{JobListing, RetryConfig};
use crate::browser::login::{is_challenge_url, wait_for_manual_verification};
use crate::browser::{BrowserError, PageDriver};
use crate::config::BotConfig;
use crate::error::AttemptError;
use crate::openai::{ChatCompleter, ChatMessage, ChatRequest, OpenAiError};

pub const EASY_APPLY_BUTTON: &str =
    ".jobs-apply-button--top-card button, button.jobs-apply-button";
const NEXT_BUTTON: &str = "button[aria-label='Continue to next step']";
const REVIEW_BUTTON: &str = "button[aria-label='Review your application']";
const SUBMIT_BUTTON: &str = "button[aria-label='Submit application']";

// Snapshot of the visible controls inside the Easy Apply modal, paired with
// the screenshot so the model can resolve labels to selectors.
const FORM_SNAPSHOT_JS: &str = r#"
(() => {
  const modal = document.querySelector('.jobs-easy-apply-modal') || document;
  const fields = Array.from(modal.querySelectorAll('input, select, textarea')).map(el => ({
    tag: el.tagName.toLowerCase(),
    type: el.type || '',
    id: el.id || '',
    name: el.name || '',
    value: el.value || '',
    label: (el.labels && el.labels[0]) ? el.labels[0].innerText.trim() : ''
  }));
  const buttons = Array.from(modal.querySelectorAll('button')).map(el =>
    (el.getAttribute('aria-label') || el.innerText).trim()
  );
  return { fields, buttons };
})()
"#;

/// One action decided by the model. The wire format is strict JSON with an
/// `action` discriminator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum FormAction {
    /// Fill one form control with a value taken from the profile.
    Fill {
        selector: String,
        value: String,
        #[serde(default)]
        field: String,
    },
    /// Click an arbitrary control (radio button, checkbox, dropdown option).
    Click { selector: String },
    /// Advance to the next page of the multi-step dialog.
    Next,
    /// Move to the review page.
    Review,
    /// Hit "Submit application" — only valid on the review page.
    Submit,
    /// A security verification is blocking the dialog.
    Verification,
    /// The form cannot be completed.
    Fail { reason: String },
}

/// Terminal result of one application attempt inside the dialog.
#[derive(Debug)]
pub enum FillResult {
    Submitted {
        fields_filled: Vec<String>,
    },
    TimedOut {
        fields_filled: Vec<String>,
    },
    Failed {
        error: AttemptError,
        fields_filled: Vec<String>,
        errors: Vec<String>,
    },
}

pub struct FormFiller<'a, D: PageDriver, C: ChatCompleter> {
    driver: &'a D,
    model: &'a C,
    config: &'a BotConfig,
    retry: RetryConfig,
}

impl<'a, D: PageDriver, C: ChatCompleter> FormFiller<'a, D, C> {
    pub fn new(driver: &'a D, model: &'a C, config: &'a BotConfig) -> Self {
        Self {
            driver,
            model,
            config,
            retry: RetryConfig {
                max_retries: config.model_retries,
                base_delay_ms: config.base_delay_ms,
            },
        }
    }

    /// Attempt to complete and submit the Easy Apply dialog for one listing.
    ///
    /// The page is expected to be positioned on the listing already. Browser
    /// failures mid-form are converted into a failed result; nothing here is
    /// fatal for the run.
    pub async fn apply(&self, listing: &JobListing) -> FillResult {
        let deadline =
            Instant::now() + Duration::from_secs(self.config.application_budget_secs);
        let mut fields_filled: Vec<String> = Vec::new();
        let mut errors: Vec<String> = Vec::new();
        // What happened on previous steps, fed back to the model.
        let mut history: Vec<String> = Vec::new();

        if let Err(e) = self.driver.click(EASY_APPLY_BUTTON).await {
            return FillResult::Failed {
                error: AttemptError::FormRecognition(format!(
                    "Easy Apply control not clickable: {e}"
                )),
                fields_filled,
                errors,
            };
        }

        for _step in 0..self.config.max_form_steps {
            if Instant::now() >= deadline {
                return FillResult::TimedOut { fields_filled };
            }

            match self.check_verification().await {
                Ok(None) => {}
                Ok(Some(VerificationWait::Cleared)) => continue,
                Ok(Some(VerificationWait::Expired)) => {
                    return FillResult::Failed {
                        error: AttemptError::VerificationUnresolved,
                        fields_filled,
                        errors,
                    };
                }
                Err(e) => {
                    return FillResult::Failed {
                        error: AttemptError::Browser(e.to_string()),
                        fields_filled,
                        errors,
                    };
                }
            }

            let observation = match self.observe().await {
                Ok(o) => o,
                Err(e) => {
                    return FillResult::Failed {
                        error: AttemptError::Browser(e.to_string()),
                        fields_filled,
                        errors,
                    };
                }
            };

            let action = match self.decide(listing, &observation, &history).await {
                Ok(a) => a,
                Err(error) => {
                    return FillResult::Failed {
                        error,
                        fields_filled,
                        errors,
                    };
                }
            };

            match action {
                FormAction::Fill {
                    selector,
                    value,
                    field,
                } => match self.driver.fill(&selector, &value).await {
                    Ok(()) => {
                        let label = if field.is_empty() { selector } else { field };
                        history.push(format!("filled '{label}'"));
                        fields_filled.push(label);
                    }
                    Err(e) => {
                        history.push(format!("fill on '{selector}' failed: {e}"));
                        errors.push(e.to_string());
                    }
                },
                FormAction::Click { selector } => match self.driver.click(&selector).await {
                    Ok(()) => history.push(format!("clicked '{selector}'")),
                    Err(e) => {
                        history.push(format!("click on '{selector}' failed: {e}"));
                        errors.push(e.to_string());
                    }
                },
                FormAction::Next => match self.driver.click(NEXT_BUTTON).await {
                    Ok(()) => history.push("advanced to next page".into()),
                    Err(e) => {
                        history.push(format!("next failed: {e}"));
                        errors.push(e.to_string());
                    }
                },
                FormAction::Review => match self.driver.click(REVIEW_BUTTON).await {
                    Ok(()) => history.push("moved to review page".into()),
                    Err(e) => {
                        history.push(format!("review failed: {e}"));
                        errors.push(e.to_string());
                    }
                },
                FormAction::Submit => match self.driver.click(SUBMIT_BUTTON).await {
                    Ok(()) => return FillResult::Submitted { fields_filled },
                    Err(e) => {
                        history.push(format!("submit failed: {e}"));
                        errors.push(e.to_string());
                    }
                },
                FormAction::Verification => {
                    match self.wait_for_user().await {
                        Ok(true) => history.push("verification cleared by user".into()),
                        Ok(false) => {
                            return FillResult::Failed {
                                error: AttemptError::VerificationUnresolved,
                                fields_filled,
                                errors,
                            };
                        }
                        Err(e) => {
                            return FillResult::Failed {
                                error: AttemptError::Browser(e.to_string()),
                                fields_filled,
                                errors,
                            };
                        }
                    }
                }
                FormAction::Fail { reason } => {
                    return FillResult::Failed {
                        error: AttemptError::FormRecognition(reason),
                        fields_filled,
                        errors,
                    };
                }
            }
        }

        FillResult::Failed {
            error: AttemptError::FormRecognition(format!(
                "no terminal state after {} steps",
                self.config.max_form_steps
            )),
            fields_filled,
            errors,
        }
    }

    /// Detect a challenge page and, if present, wait out the manual window.
    async fn check_verification(
        &self,
    ) -> Result<Option<VerificationWait>, BrowserError> {
        let url = self.driver.current_url().await?;
        if !is_challenge_url(&url) {
            return Ok(None);
        }
        Ok(Some(if self.wait_for_user().await? {
            VerificationWait::Cleared
        } else {
            VerificationWait::Expired
        }))
    }

    async fn wait_for_user(&self) -> Result<bool, BrowserError> {
        wait_for_manual_verification(
            self.driver,
            Duration::from_secs(self.config.intervention_window_secs),
            Duration::from_secs(self.config.verification_poll_secs),
        )
        .await
    }

    async fn observe(&self) -> Result<Observation, BrowserError> {
        Ok(Observation {
            url: self.driver.current_url().await?,
            form: self.driver.eval_json(FORM_SNAPSHOT_JS).await?,
            screenshot: self.driver.screenshot_png().await?,
        })
    }

    /// Ask the model for the next action, retrying transient service errors
    /// with exponential backoff. Unparseable decisions fail the attempt
    /// without retry.
    async fn decide(
        &self,
        listing: &JobListing,
        observation: &Observation,
        history: &[String],
    ) -> Result<FormAction, AttemptError> {
        let req = self.build_request(listing, observation, history);

        let mut attempt_no: u32 = 0;
        loop {
            match self.model.complete(&req).await {
                Ok(response) => {
                    let text = response.text();
                    return parse_decision(&text).ok_or_else(|| {
                        AttemptError::FormRecognition(format!(
                            "unparseable model decision: {text}"
                        ))
                    });
                }
                Err(e) if e.is_retryable() && attempt_no < self.retry.max_retries => {
                    attempt_no += 1;
                    let mut delay_ms = self.retry.delay_for_attempt(attempt_no);
                    if let OpenAiError::RateLimited { retry_after_ms } = &e {
                        delay_ms = delay_ms.max(*retry_after_ms);
                    }
                    eprintln!(
                        "  ↻ Model retry {attempt_no}/{}: {e} (waiting {delay_ms}ms)",
                        self.retry.max_retries
                    );
                    sleep(Duration::from_millis(delay_ms)).await;
                }
                Err(e) => {
                    return Err(AttemptError::ModelService(format!(
                        "{e} after {attempt_no} retries"
                    )));
                }
            }
        }
    }

    fn build_request(
        &self,
        listing: &JobListing,
        observation: &Observation,
        history: &[String],
    ) -> ChatRequest {
        let defaults = &self.config.profile.defaults;
        let system = format!(
            "You drive a LinkedIn Easy Apply dialog one action at a time.\n\
             Respond with ONLY valid JSON, no other text. Exactly one of:\n\
             {{\"action\":\"fill\",\"selector\":\"<css>\",\"value\":\"<text>\",\"field\":\"<human label>\"}}\n\
             {{\"action\":\"click\",\"selector\":\"<css>\"}}\n\
             {{\"action\":\"next\"}}\n\
             {{\"action\":\"review\"}}\n\
             {{\"action\":\"submit\"}}\n\
             {{\"action\":\"verification\"}}\n\
             {{\"action\":\"fail\",\"reason\":\"<why>\"}}\n\
             \n\
             Rules:\n\
             - Use only the applicant profile data; never invent facts.\n\
             - Yes/no experience questions: answer \"{}\".\n\
             - \"Years of experience\" questions: answer \"{}\".\n\
             - Willing to relocate: \"{}\". Authorized to work: \"{}\". \
               Requires sponsorship: \"{}\".\n\
             - Leave the pre-selected resume untouched; never upload a file.\n\
             - Fill every control on the current page before \"next\".\n\
             - \"submit\" only from the review page; saving a draft is not done.",
            defaults.authorized_to_work,
            defaults.years_of_experience,
            defaults.willing_to_relocate,
            defaults.authorized_to_work,
            defaults.require_sponsorship,
        );

        let profile_json =
            serde_json::to_string_pretty(&self.config.profile).unwrap_or_default();
        let user_text = format!(
            "Job: {} at {}\nPage URL: {}\n\nApplicant profile:\n{}\n\n\
             Visible form controls:\n{}\n\nPrevious steps:\n{}",
            listing.title,
            listing.company,
            observation.url,
            profile_json,
            observation.form,
            if history.is_empty() {
                "(none)".to_string()
            } else {
                history.join("\n")
            },
        );

        ChatRequest {
            model: self.config.model.clone(),
            temperature: self.config.temperature,
            max_tokens: 512,
            messages: vec![
                ChatMessage::system(system),
                ChatMessage::user_with_screenshot(user_text, &observation.screenshot),
            ],
        }
    }
}

enum VerificationWait {
    Cleared,
    Expired,
}

struct Observation {
    url: String,
    form: serde_json::Value,
    screenshot: Vec<u8>,
}

/// Parse a model decision, tolerating markdown code fences around the JSON.
pub fn parse_decision(text: &str) -> Option<FormAction> {
    let trimmed = text.trim();
    let inner = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|t| t.strip_suffix("```").unwrap_or(t))
        .unwrap_or(trimmed)
        .trim();
    serde_json::from_str(inner).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attempt::ApplyMode;
    use crate::browser::fake::FakePage;
    use crate::openai::types::{Choice, ResponseMessage, Usage};
    use crate::openai::{ChatResponse, OpenAiError};
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    enum Scripted {
        Text(&'static str),
        ServerError,
        BadRequest,
    }

    struct MockModel {
        responses: Mutex<VecDeque<Scripted>>,
        calls: AtomicU32,
    }

    impl MockModel {
        fn new(responses: Vec<Scripted>) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().collect()),
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ChatCompleter for MockModel {
        async fn complete(&self, _req: &ChatRequest) -> Result<ChatResponse, OpenAiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let scripted = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Scripted::ServerError);
            match scripted {
                Scripted::Text(text) => Ok(ChatResponse {
                    id: "mock".into(),
                    model: "mock".into(),
                    choices: vec![Choice {
                        index: 0,
                        message: ResponseMessage {
                            role: "assistant".into(),
                            content: Some(text.to_string()),
                        },
                        finish_reason: Some("stop".into()),
                    }],
                    usage: Usage {
                        prompt_tokens: 0,
                        completion_tokens: 0,
                        total_tokens: 0,
                    },
                }),
                Scripted::ServerError => Err(OpenAiError::ApiError {
                    status: 500,
                    message: "mock outage".into(),
                }),
                Scripted::BadRequest => Err(OpenAiError::ApiError {
                    status: 400,
                    message: "mock bad request".into(),
                }),
            }
        }
    }

    fn test_config() -> BotConfig {
        let mut config = BotConfig::default();
        config.base_delay_ms = 0;
        config.model_retries = 2;
        config.intervention_window_secs = 0;
        config.verification_poll_secs = 0;
        config
    }

    fn listing() -> JobListing {
        JobListing::new(
            "Rust Engineer".into(),
            "Acme".into(),
            "https://www.linkedin.com/jobs/view/1".into(),
            ApplyMode::EasyApply,
        )
    }

    fn dialog_page() -> FakePage {
        let page = FakePage::new();
        page.add_element(EASY_APPLY_BUTTON);
        page.add_element(NEXT_BUTTON);
        page.add_element(REVIEW_BUTTON);
        page.add_element(SUBMIT_BUTTON);
        page
    }

    fn push_observations(page: &FakePage, n: usize) {
        for _ in 0..n {
            page.push_eval(json!({"fields": [], "buttons": []}));
        }
    }

    #[tokio::test]
    async fn fills_pages_and_submits() {
        let page = dialog_page();
        page.add_element("input#phone");
        push_observations(&page, 4);

        let model = MockModel::new(vec![
            Scripted::Text(
                r#"{"action":"fill","selector":"input#phone","value":"+123","field":"Phone"}"#,
            ),
            Scripted::Text(r#"{"action":"next"}"#),
            Scripted::Text(r#"{"action":"review"}"#),
            Scripted::Text(r#"{"action":"submit"}"#),
        ]);
        let config = test_config();
        let filler = FormFiller::new(&page, &model, &config);

        let result = filler.apply(&listing()).await;
        match result {
            FillResult::Submitted { fields_filled } => {
                assert_eq!(fields_filled, vec!["Phone".to_string()]);
            }
            other => panic!("expected Submitted, got {other:?}"),
        }
        assert_eq!(model.calls(), 4);
        assert_eq!(page.fills(), vec![("input#phone".to_string(), "+123".to_string())]);
    }

    #[tokio::test]
    async fn exhausted_budget_times_out_without_model_call() {
        let page = dialog_page();
        let model = MockModel::new(vec![]);
        let mut config = test_config();
        config.application_budget_secs = 0;
        let filler = FormFiller::new(&page, &model, &config);

        let result = filler.apply(&listing()).await;
        assert!(matches!(result, FillResult::TimedOut { .. }));
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn persistent_model_outage_fails_after_retries() {
        let page = dialog_page();
        push_observations(&page, 1);
        let model = MockModel::new(vec![
            Scripted::ServerError,
            Scripted::ServerError,
            Scripted::ServerError,
        ]);
        let config = test_config();
        let filler = FormFiller::new(&page, &model, &config);

        let result = filler.apply(&listing()).await;
        match result {
            FillResult::Failed { error, .. } => {
                assert!(matches!(error, AttemptError::ModelService(_)));
            }
            other => panic!("expected Failed, got {other:?}"),
        }
        // Initial call plus model_retries retries.
        assert_eq!(model.calls(), 3);
    }

    #[tokio::test]
    async fn transient_outage_recovers_on_retry() {
        let page = dialog_page();
        push_observations(&page, 1);
        let model = MockModel::new(vec![
            Scripted::ServerError,
            Scripted::Text(r#"{"action":"submit"}"#),
        ]);
        let config = test_config();
        let filler = FormFiller::new(&page, &model, &config);

        let result = filler.apply(&listing()).await;
        assert!(matches!(result, FillResult::Submitted { .. }));
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test]
    async fn non_retryable_error_fails_immediately() {
        let page = dialog_page();
        push_observations(&page, 1);
        let model = MockModel::new(vec![Scripted::BadRequest]);
        let config = test_config();
        let filler = FormFiller::new(&page, &model, &config);

        let result = filler.apply(&listing()).await;
        assert!(matches!(
            result,
            FillResult::Failed {
                error: AttemptError::ModelService(_),
                ..
            }
        ));
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn garbage_decision_fails_without_retry() {
        let page = dialog_page();
        push_observations(&page, 1);
        let model = MockModel::new(vec![Scripted::Text("sure, I'll click submit for you")]);
        let config = test_config();
        let filler = FormFiller::new(&page, &model, &config);

        let result = filler.apply(&listing()).await;
        assert!(matches!(
            result,
            FillResult::Failed {
                error: AttemptError::FormRecognition(_),
                ..
            }
        ));
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn unresolved_verification_fails_attempt() {
        let page = dialog_page();
        page.script_urls(&["https://www.linkedin.com/checkpoint/challenge/x"]);
        let model = MockModel::new(vec![]);
        let config = test_config();
        let filler = FormFiller::new(&page, &model, &config);

        let result = filler.apply(&listing()).await;
        assert!(matches!(
            result,
            FillResult::Failed {
                error: AttemptError::VerificationUnresolved,
                ..
            }
        ));
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn missing_easy_apply_control_fails() {
        let page = FakePage::new();
        let model = MockModel::new(vec![]);
        let config = test_config();
        let filler = FormFiller::new(&page, &model, &config);

        let result = filler.apply(&listing()).await;
        assert!(matches!(
            result,
            FillResult::Failed {
                error: AttemptError::FormRecognition(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn explicit_fail_action_is_terminal() {
        let page = dialog_page();
        push_observations(&page, 1);
        let model = MockModel::new(vec![Scripted::Text(
            r#"{"action":"fail","reason":"required assessment test"}"#,
        )]);
        let config = test_config();
        let filler = FormFiller::new(&page, &model, &config);

        let result = filler.apply(&listing()).await;
        match result {
            FillResult::Failed { error, .. } => match error {
                AttemptError::FormRecognition(reason) => {
                    assert_eq!(reason, "required assessment test");
                }
                other => panic!("expected FormRecognition, got {other:?}"),
            },
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[test]
    fn parse_decision_accepts_fenced_json() {
        let action = parse_decision("```json\n{\"action\":\"next\"}\n```").unwrap();
        assert_eq!(action, FormAction::Next);
    }

    #[test]
    fn parse_decision_rejects_prose() {
        assert!(parse_decision("I think we should click next").is_none());
    }

    #[test]
    fn form_action_wire_format() {
        let json = r##"{"action":"fill","selector":"#phone","value":"+1","field":"Phone"}"##;
        let action: FormAction = serde_json::from_str(json).unwrap();
        assert_eq!(
            action,
            FormAction::Fill {
                selector: "#phone".into(),
                value: "+1".into(),
                field: "Phone".into(),
            }
        );
    }
}
