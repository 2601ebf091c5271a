//! LLM Transport Abstraction Layer
//!
//! This module defines the conversation data model (`Turn`, `Role`) shared by
//! the history store and the transport, and the `ChatBackend` trait the turn
//! orchestrator dispatches through. A backend returns the raw assistant text;
//! interpreting that text is the job of the `response` module.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod ollama;

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors that can occur while talking to the model backend
#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Non-OK HTTP status: {status}\n{body}")]
    HttpStatus { status: u16, body: String },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Timeout")]
    Timeout,

    /// The body carried no assistant content in any accepted envelope.
    /// Holds the raw body so it can be shown to the user verbatim.
    #[error("Unexpected response body")]
    UnexpectedBody(String),
}

impl From<LLMError> for sdk::EngineError {
    fn from(error: LLMError) -> Self {
        sdk::EngineError::LLMProvider(error.to_string())
    }
}

/// One role-tagged entry of the conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Turn {
    /// Role of the message sender
    pub role: Role,

    /// Content of the message
    pub content: String,
}

impl Turn {
    /// Create a new user turn
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create a new assistant turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Create a new system turn
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// Role of a message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System context
    System,

    /// User message
    User,

    /// Assistant message
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// Transport to a chat-style model backend.
///
/// Implementations send the full message list and return the assistant's raw
/// reply text. They must not interpret the text.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Returns the name of the backend (e.g., "ollama")
    fn name(&self) -> &str;

    /// Send one non-streaming chat request and return the assistant content
    async fn chat(&self, messages: &[Turn]) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_creation() {
        let user = Turn::user("Hello");
        assert_eq!(user.role, Role::User);
        assert_eq!(user.content, "Hello");

        assert_eq!(Turn::assistant("Hi").role, Role::Assistant);
        assert_eq!(Turn::system("ctx").role, Role::System);
    }

    #[test]
    fn test_turn_wire_format() {
        let json = serde_json::to_string(&Turn::assistant("ok")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"ok"}"#);

        let parsed: Turn = serde_json::from_str(r#"{"role":"system","content":"x"}"#).unwrap();
        assert_eq!(parsed, Turn::system("x"));
    }

    #[test]
    fn test_unknown_role_rejected() {
        let parsed = serde_json::from_str::<Turn>(r#"{"role":"tool","content":"x"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::User.to_string(), "user");
        assert_eq!(Role::Assistant.to_string(), "assistant");
        assert_eq!(Role::System.to_string(), "system");
    }

    #[test]
    fn test_llm_error_into_engine_error() {
        let error: sdk::EngineError = LLMError::Timeout.into();
        assert!(matches!(error, sdk::EngineError::LLMProvider(_)));
    }
}
