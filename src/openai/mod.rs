pub mod client;
pub mod error;
pub mod types;

pub use client::{ChatCompleter, OpenAiClient};
pub use error::OpenAiError;
pub use types::{ChatMessage, ChatRequest, ChatResponse, ContentPart, Usage};
