//! Error types and handling
//!
//! This module provides the error types used throughout the open-coder engine.
//! All errors implement the `ErrorExt` trait, which provides a user-friendly
//! hint and the policy a caller must apply when the error surfaces in the
//! middle of a session.
//!
//! # Policy Table
//!
//! | Error kind              | Policy      |
//! |-------------------------|-------------|
//! | transport failure       | `AbortTurn` |
//! | decode failure          | `Degrade`   |
//! | command failure         | `Degrade`   |
//! | history read/write      | `Degrade`   |
//! | config / cwd / state dir| `Terminate` |

use thiserror::Error;

/// What a caller does when an error reaches the session loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Abandon the current turn without touching history; the session continues.
    AbortTurn,

    /// Log the error, fall back to a reduced behavior and keep going.
    Degrade,

    /// The session cannot continue; exit with a non-zero status.
    Terminate,
}

/// Trait for engine error extensions
pub trait ErrorExt {
    /// Returns a user-friendly hint for the error
    fn user_hint(&self) -> &str;

    /// Returns the policy the session loop applies to this error
    fn policy(&self) -> ErrorPolicy;

    /// Returns whether the session can continue after this error
    fn is_recoverable(&self) -> bool {
        self.policy() != ErrorPolicy::Terminate
    }
}

/// Main engine error type
///
/// # Examples
///
/// ```
/// use sdk::errors::{EngineError, ErrorExt, ErrorPolicy};
///
/// let error = EngineError::LLMProvider("connection refused".to_string());
/// assert_eq!(error.policy(), ErrorPolicy::AbortTurn);
/// assert!(error.is_recoverable());
///
/// let fatal = EngineError::Config("missing model".to_string());
/// assert!(!fatal.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    // Startup errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Working directory unavailable: {0}")]
    WorkingDirectory(String),

    #[error("State directory error: {0}")]
    StateDirectory(String),

    // Transport errors
    #[error("LLM provider error: {0}")]
    LLMProvider(String),

    // Response interpretation errors
    #[error("Decode error: {0}")]
    Decode(String),

    // Command execution errors
    #[error("Command '{command}' failed: {reason}")]
    CommandFailed { command: String, reason: String },

    // History persistence errors
    #[error("History read failed: {0}")]
    HistoryRead(String),

    #[error("History write failed: {0}")]
    HistoryWrite(String),
}

impl ErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Config(_) => "Check your config file for errors",
            Self::WorkingDirectory(_) => "Run open-coder from an accessible directory",
            Self::StateDirectory(_) => "Check write permissions in the working directory",
            Self::LLMProvider(_) => "Model backend unavailable. Check the URL and that it is running",
            Self::Decode(_) => "The model reply was not a structured action",
            Self::CommandFailed { .. } => "A command exited with an error; the rest of the batch still ran",
            Self::HistoryRead(_) => "History could not be read; continuing without prior context",
            Self::HistoryWrite(_) => "History could not be saved; this turn is kept in memory only",
        }
    }

    fn policy(&self) -> ErrorPolicy {
        match self {
            Self::Config(_) | Self::WorkingDirectory(_) | Self::StateDirectory(_) => {
                ErrorPolicy::Terminate
            }
            Self::LLMProvider(_) => ErrorPolicy::AbortTurn,
            Self::Decode(_)
            | Self::CommandFailed { .. }
            | Self::HistoryRead(_)
            | Self::HistoryWrite(_) => ErrorPolicy::Degrade,
        }
    }
}
