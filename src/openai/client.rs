use std::time::Duration;

use reqwest::Client;

use super::error::OpenAiError;
use super::types::{ChatRequest, ChatResponse};

const API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Seam for mocking the model in tests: anything that can turn a
/// [`ChatRequest`] into a [`ChatResponse`].
pub trait ChatCompleter {
    async fn complete(&self, req: &ChatRequest) -> Result<ChatResponse, OpenAiError>;
}

pub struct OpenAiClient {
    api_key: String,
    client: Client,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, API_URL.to_string())
    }

    /// Create a client pointing at a custom base URL (useful for testing).
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()
            .expect("failed to build HTTP client");
        Self {
            api_key,
            client,
            base_url,
        }
    }

    pub async fn send_chat(&self, req: &ChatRequest) -> Result<ChatResponse, OpenAiError> {
        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(req)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(|secs| secs * 1000)
                .unwrap_or(1000);
            return Err(OpenAiError::RateLimited {
                retry_after_ms: retry_after,
            });
        }

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(OpenAiError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.json::<ChatResponse>().await?;
        Ok(body)
    }
}

impl ChatCompleter for OpenAiClient {
    async fn complete(&self, req: &ChatRequest) -> Result<ChatResponse, OpenAiError> {
        self.send_chat(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openai::types::ChatMessage;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> ChatRequest {
        ChatRequest {
            model: "gpt-4o".into(),
            temperature: 0.4,
            max_tokens: 512,
            messages: vec![ChatMessage::user_text("next action?")],
        }
    }

    async fn client_for(server: &MockServer) -> OpenAiClient {
        OpenAiClient::with_base_url(
            "sk-test".into(),
            format!("{}/v1/chat/completions", server.uri()),
        )
    }

    #[tokio::test]
    async fn successful_completion_round_trips() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({"model": "gpt-4o"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-1",
                "model": "gpt-4o",
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": "{\"action\":\"next\"}"},
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let response = client.send_chat(&request()).await.unwrap();
        assert_eq!(response.id, "chatcmpl-1");
        assert_eq!(response.text(), r#"{"action":"next"}"#);
    }

    #[tokio::test]
    async fn rate_limit_maps_to_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("retry-after", "7")
                    .set_body_string("rate limit exceeded"),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.send_chat(&request()).await.unwrap_err();
        match err {
            OpenAiError::RateLimited { retry_after_ms } => assert_eq!(retry_after_ms, 7000),
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn rate_limit_without_header_defaults_to_one_second() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.send_chat(&request()).await.unwrap_err();
        assert!(matches!(
            err,
            OpenAiError::RateLimited {
                retry_after_ms: 1000
            }
        ));
    }

    #[tokio::test]
    async fn server_error_preserves_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.send_chat(&request()).await.unwrap_err();
        match err {
            OpenAiError::ApiError { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "internal error");
            }
            other => panic!("expected ApiError, got {other:?}"),
        }
    }
}
