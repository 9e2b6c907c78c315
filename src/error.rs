use thiserror::Error;

use crate::browser::BrowserError;
use crate::openai::OpenAiError;

/// Session-level errors. Anything of this kind terminates the whole run;
/// per-job failures are converted into attempt outcomes at the
/// orchestrator boundary instead.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Saved jobs view could not be loaded: {0}")]
    SavedJobsUnavailable(String),

    #[error("No session found. Run `autoapply run` first.")]
    NoSession,

    #[error("OpenAI API error: {0}")]
    OpenAi(#[from] OpenAiError),

    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Per-attempt failure cause, recorded on the attempt and used to decide
/// retry behavior inside the form filler.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum AttemptError {
    /// The model service failed after all retries (timeout, rate limit, 5xx).
    ModelService(String),
    /// The form could not be interpreted (unparseable decision, missing control).
    FormRecognition(String),
    /// A verification challenge was not resolved within the manual window.
    VerificationUnresolved,
    /// The per-application wall-clock budget ran out.
    TimeoutExceeded,
    /// The browser itself failed mid-attempt.
    Browser(String),
}

impl std::fmt::Display for AttemptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttemptError::ModelService(msg) => write!(f, "model service failure: {msg}"),
            AttemptError::FormRecognition(msg) => write!(f, "form not recognized: {msg}"),
            AttemptError::VerificationUnresolved => {
                write!(f, "verification challenge not resolved in time")
            }
            AttemptError::TimeoutExceeded => write!(f, "application time budget exceeded"),
            AttemptError::Browser(msg) => write!(f, "browser failure: {msg}"),
        }
    }
}
