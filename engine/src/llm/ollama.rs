//! Ollama Chat Transport
//!
//! Implements `ChatBackend` for an Ollama-compatible server (typically
//! http://localhost:11434). One non-streaming POST to `<base_url>/api/chat`
//! per turn with the payload `{model, messages, stream: false}`.
//!
//! Two response envelopes are accepted because compatible servers differ:
//! - OpenAI style: `choices[0].message.content`
//! - Ollama style: `message.content`
//!
//! Neither is treated as canonical; the OpenAI shape is probed first.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use super::{ChatBackend, LLMError, Result, Turn};

/// Default HTTP timeout for a single chat request
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Ollama provider configuration
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    /// Base URL for the API, without a trailing slash
    base_url: String,

    /// Model name to use (e.g., "llama3.1:8b")
    model: String,

    /// HTTP client for API requests
    client: Client,
}

impl OllamaProvider {
    /// Create a new provider with the default request timeout
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, model, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a new provider with an explicit request timeout
    pub fn with_timeout(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LLMError::NetworkError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client,
        })
    }

    /// Full URL of the chat endpoint
    pub fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }

    fn build_request<'a>(&'a self, messages: &'a [Turn]) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages,
            stream: false,
        }
    }
}

#[async_trait]
impl ChatBackend for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn chat(&self, messages: &[Turn]) -> Result<String> {
        tracing::debug!(
            "Chat request: model={}, messages={}, total_chars={}",
            self.model,
            messages.len(),
            messages.iter().map(|m| m.content.len()).sum::<usize>()
        );

        let url = self.chat_url();
        let start = std::time::Instant::now();
        let response = self
            .client
            .post(&url)
            .json(&self.build_request(messages))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LLMError::Timeout
                } else if e.is_connect() {
                    LLMError::ProviderUnavailable(format!(
                        "Cannot connect to model backend at {}. Is it running?",
                        self.base_url
                    ))
                } else {
                    LLMError::NetworkError(e.to_string())
                }
            })?;

        tracing::info!(
            "Model response received in {:.1}s",
            start.elapsed().as_secs_f64()
        );

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LLMError::NetworkError(format!("Error reading response: {}", e)))?;

        if !status.is_success() {
            return Err(LLMError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        match reply_content(&body) {
            Some(content) => Ok(content),
            None => {
                tracing::warn!("Response body carried no assistant content");
                Err(LLMError::UnexpectedBody(body))
            }
        }
    }
}

/// Pull the assistant content out of a response body.
///
/// Returns `None` if the body is not JSON or neither envelope carries a
/// non-empty string.
pub fn reply_content(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;

    ["/choices/0/message/content", "/message/content"]
        .iter()
        .filter_map(|pointer| value.pointer(pointer).and_then(Value::as_str))
        .find(|content| !content.is_empty())
        .map(str::to_string)
}

/// Chat API request format
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Turn],
    stream: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_trims_trailing_slash() {
        let provider = OllamaProvider::new("http://localhost:11434/", "llama3.1:8b").unwrap();
        assert_eq!(provider.chat_url(), "http://localhost:11434/api/chat");
        assert_eq!(provider.name(), "ollama");
    }

    #[test]
    fn test_request_payload_shape() {
        let provider = OllamaProvider::new("http://localhost:11434", "qwen3").unwrap();
        let messages = vec![Turn::system("ctx"), Turn::user("hi")];

        let payload = serde_json::to_value(provider.build_request(&messages)).unwrap();

        assert_eq!(payload["model"], "qwen3");
        assert_eq!(payload["stream"], false);
        assert_eq!(payload["messages"][0]["role"], "system");
        assert_eq!(payload["messages"][1]["content"], "hi");
    }

    #[test]
    fn test_reply_content_ollama_envelope() {
        let body = r#"{"message":{"role":"assistant","content":"hello"},"done":true}"#;
        assert_eq!(reply_content(body).as_deref(), Some("hello"));
    }

    #[test]
    fn test_reply_content_openai_envelope() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"hi"}}]}"#;
        assert_eq!(reply_content(body).as_deref(), Some("hi"));
    }

    #[test]
    fn test_reply_content_prefers_choices() {
        let body = r#"{"choices":[{"message":{"content":"a"}}],"message":{"content":"b"}}"#;
        assert_eq!(reply_content(body).as_deref(), Some("a"));

        let body = r#"{"choices":[{"message":{"content":""}}],"message":{"content":"b"}}"#;
        assert_eq!(reply_content(body).as_deref(), Some("b"));
    }

    #[test]
    fn test_reply_content_rejects_empty_and_garbage() {
        assert_eq!(reply_content(r#"{"message":{"content":""}}"#), None);
        assert_eq!(reply_content(r#"{"choices":[]}"#), None);
        assert_eq!(reply_content("not json"), None);
        assert_eq!(reply_content(r#"{"message":{"content":42}}"#), None);
    }
}
