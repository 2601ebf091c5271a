//! Response interpretation
//!
//! Turns a model's free-form reply into an `ActionResponse`. The reply is
//! first narrowed to its JSON object by `extract`, then decoded here.
//!
//! Decoded JSON shape: `{commands?: [string], explanation?: string, answer?: string}`.
//! A `DecodeError` is not fatal for the session: the caller keeps the reply
//! as `ActionResponse::Raw` and shows the original text verbatim.

pub mod extract;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

pub use extract::{extract_json, ExtractError};

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("Invalid action JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Action JSON must be an object")]
    NotAnObject,

    #[error("Action JSON has no commands, answer or explanation")]
    NoAction,
}

impl From<DecodeError> for sdk::EngineError {
    fn from(error: DecodeError) -> Self {
        sdk::EngineError::Decode(error.to_string())
    }
}

/// Decoded intent of one model reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionResponse {
    /// Commands to run, in order.
    Commands {
        commands: Vec<String>,
        explanation: Option<String>,
    },

    /// A conversational reply with nothing to execute.
    Answer {
        answer: Option<String>,
        explanation: Option<String>,
    },

    /// The reply did not decode; carries the original text.
    Raw(String),
}

impl ActionResponse {
    pub fn commands(&self) -> &[String] {
        match self {
            ActionResponse::Commands { commands, .. } => commands,
            _ => &[],
        }
    }

    pub fn explanation(&self) -> Option<&str> {
        match self {
            ActionResponse::Commands { explanation, .. }
            | ActionResponse::Answer { explanation, .. } => explanation.as_deref(),
            ActionResponse::Raw(_) => None,
        }
    }
}

/// Extract then decode a raw model reply.
pub fn interpret(raw: &str) -> Result<ActionResponse, DecodeError> {
    let span = extract_json(raw)?;
    decode(span)
}

/// Decode an isolated JSON span into an action.
pub fn decode(span: &str) -> Result<ActionResponse, DecodeError> {
    let value: Value = serde_json::from_str(span)?;
    if !value.is_object() {
        return Err(DecodeError::NotAnObject);
    }

    let wire: WireAction = serde_json::from_value(value)?;
    let explanation = non_empty(wire.explanation);
    let answer = non_empty(wire.answer);
    let commands: Vec<String> = wire
        .commands
        .unwrap_or_default()
        .into_iter()
        .filter(|c| !c.trim().is_empty())
        .collect();

    if !commands.is_empty() {
        return Ok(ActionResponse::Commands {
            commands,
            explanation,
        });
    }

    if answer.is_none() && explanation.is_none() {
        return Err(DecodeError::NoAction);
    }

    Ok(ActionResponse::Answer {
        answer,
        explanation,
    })
}

/// Parse raw user input as a direct command action.
///
/// Returns the action only when it carries at least one command.
pub fn direct_commands(input: &str) -> Option<ActionResponse> {
    match decode(input.trim()) {
        Ok(action @ ActionResponse::Commands { .. }) => Some(action),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct WireAction {
    #[serde(default)]
    commands: Option<Vec<String>>,
    #[serde(default)]
    explanation: Option<String>,
    #[serde(default)]
    answer: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_commands() {
        let action = decode(r#"{"commands":["ls","cat a.txt"],"explanation":"look"}"#).unwrap();
        assert_eq!(
            action,
            ActionResponse::Commands {
                commands: vec!["ls".into(), "cat a.txt".into()],
                explanation: Some("look".into()),
            }
        );
        assert_eq!(action.commands().len(), 2);
        assert_eq!(action.explanation(), Some("look"));
    }

    #[test]
    fn test_decode_answer_only() {
        let action = decode(r#"{"commands":[],"answer":"42"}"#).unwrap();
        assert_eq!(
            action,
            ActionResponse::Answer {
                answer: Some("42".into()),
                explanation: None,
            }
        );
        assert!(action.commands().is_empty());
    }

    #[test]
    fn test_decode_explanation_only_is_noop() {
        let action = decode(r#"{"explanation":"nothing to do"}"#).unwrap();
        assert!(matches!(action, ActionResponse::Answer { answer: None, .. }));
        assert_eq!(action.explanation(), Some("nothing to do"));
    }

    #[test]
    fn test_decode_blank_commands_dropped() {
        let action = decode(r#"{"commands":["  ",""],"answer":"hi"}"#).unwrap();
        assert!(matches!(action, ActionResponse::Answer { .. }));
    }

    #[test]
    fn test_decode_failures() {
        assert!(matches!(decode("{}"), Err(DecodeError::NoAction)));
        assert!(matches!(decode("[1,2]"), Err(DecodeError::NotAnObject)));
        assert!(matches!(decode("not json"), Err(DecodeError::InvalidJson(_))));
        assert!(matches!(
            decode(r#"{"commands":"ls"}"#),
            Err(DecodeError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_interpret_rejects_prose() {
        assert!(matches!(
            interpret("I cannot help with that."),
            Err(DecodeError::InvalidJson(_))
        ));
        assert!(matches!(
            interpret("<think>hmm</think>  "),
            Err(DecodeError::Extract(ExtractError::Empty))
        ));
    }

    #[test]
    fn test_interpret_handles_noise() {
        let raw = "<think>plan</think>\n```json\n{\"commands\":[\"pwd\"]}\n```";
        let action = interpret(raw).unwrap();
        assert_eq!(action.commands(), &["pwd".to_string()]);
    }

    #[test]
    fn test_decode_error_maps_to_degrade() {
        use sdk::errors::{ErrorExt, ErrorPolicy};

        let error: sdk::EngineError = decode("{}").unwrap_err().into();
        assert!(matches!(error, sdk::EngineError::Decode(_)));
        assert_eq!(error.policy(), ErrorPolicy::Degrade);
    }

    #[test]
    fn test_direct_commands() {
        let action = direct_commands(r#"{"commands":["echo hi"],"explanation":"test"}"#);
        assert!(matches!(action, Some(ActionResponse::Commands { .. })));

        assert!(direct_commands(r#"{"answer":"no commands"}"#).is_none());
        assert!(direct_commands("list the files").is_none());
    }
}
