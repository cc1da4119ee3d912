//! Groq chat-completions backend (secondary tier)

use super::backend::{non_empty, BackendError, SummaryBackend};
use crate::config::BackendConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const NAME: &str = "groq";

const SYSTEM_PROMPT: &str = "You are a helpful assistant that creates concise summaries of voice notes. \
                             Always respond in 2-3 sentences.";

pub struct GroqBackend {
    client: reqwest::Client,
    config: BackendConfig,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

impl GroqBackend {
    /// Create a new Groq backend
    pub fn new(config: BackendConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AppError::Internal {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/openai/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl SummaryBackend for GroqBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    fn is_configured(&self) -> bool {
        self.config.api_key().is_some()
    }

    async fn summarize(&self, text: &str) -> std::result::Result<String, BackendError> {
        let api_key = self
            .config
            .api_key()
            .ok_or(BackendError::MissingCredential { backend: NAME })?;

        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: format!(
                        "Please provide a concise summary of this voice note in 2-3 sentences:\n\n\"{}\"",
                        text
                    ),
                },
            ],
            max_tokens: self.config.max_output_tokens,
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| BackendError::from_reqwest(NAME, e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                backend: NAME,
                status,
                body,
            });
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| BackendError::from_reqwest(NAME, e))?;

        let text = chat
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref());

        non_empty(NAME, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(server: &MockServer, api_key: Option<&str>) -> GroqBackend {
        let mut config = crate::config::SummarizerConfig::default().groq;
        config.base_url = server.uri();
        config.api_key = api_key.map(str::to_string);
        GroqBackend::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_summarize_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openai/v1/chat/completions"))
            .and(header("Authorization", "Bearer groq-key"))
            .and(body_partial_json(json!({
                "model": "llama-3.1-8b-instant",
                "max_tokens": 150
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": "Groq summary.\n" } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let summary = backend(&server, Some("groq-key"))
            .summarize("Remember to buy groceries after work today.")
            .await
            .unwrap();
        assert_eq!(summary, "Groq summary.");
    }

    #[tokio::test]
    async fn test_not_json_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = backend(&server, Some("k"))
            .summarize("some text long enough")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "malformed_response");
    }

    #[tokio::test]
    async fn test_slow_backend_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "choices": [] }))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let mut config = crate::config::SummarizerConfig::default().groq;
        config.base_url = server.uri();
        config.api_key = Some("k".to_string());
        config.timeout_secs = 1;
        let backend = GroqBackend::new(config).unwrap();

        let err = backend.summarize("some text long enough").await.unwrap_err();
        assert!(matches!(err, BackendError::Timeout { backend: "groq" }));
    }
}
