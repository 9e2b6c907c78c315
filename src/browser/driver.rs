use thiserror::Error;

/// Errors surfaced by the browser session.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("element not found: {selector}")]
    ElementNotFound { selector: String },

    #[error("script evaluation failed: {0}")]
    Eval(String),

    #[error("CDP error: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),
}

/// The browser surface the rest of the crate depends on: navigate, read page
/// state, click/fill, screenshot. The whole collaborator is consumed as a
/// black box behind this trait so the lister, the form filler and the
/// application loop can be exercised against a scripted fake.
pub trait PageDriver {
    async fn goto(&self, url: &str) -> Result<(), BrowserError>;

    async fn current_url(&self) -> Result<String, BrowserError>;

    async fn exists(&self, selector: &str) -> Result<bool, BrowserError>;

    async fn click(&self, selector: &str) -> Result<(), BrowserError>;

    async fn fill(&self, selector: &str, value: &str) -> Result<(), BrowserError>;

    /// Run a script in the page and deserialize its JSON return value.
    async fn eval_json(&self, script: &str) -> Result<serde_json::Value, BrowserError>;

    async fn screenshot_png(&self) -> Result<Vec<u8>, BrowserError>;
}
