//! Configuration management
//!
//! This module handles loading and validation of the open-coder configuration.
//! The file path comes from `--config` (default `config.json`). Files ending in
//! `.toml` are parsed as TOML; anything else is parsed as JSON.
//!
//! # Fields
//!
//! - **ollama_url** / **model**: model backend endpoint and model name
//! - **ignore_dirs**: directory names skipped in the workspace listing
//! - **context_file_limit**: history turns kept (0 = unlimited)
//! - **action_limit**: commands executed per reply (0 = unlimited)
//! - **prompts**: prompt templates keyed by name, `{{input}}` placeholder
//! - **log_level**, **request_timeout_secs**, **command_timeout_secs**, **state_dir**
//!
//! # Examples
//!
//! ```no_run
//! use open_coder_engine::config::Config;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_from_path(Path::new("config.json"))?;
//! println!("Model: {}", config.model);
//! # Ok(())
//! # }
//! ```

use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::context::INPUT_PLACEHOLDER;

/// Prompt key used when `--prompt` is not given
pub const DEFAULT_PROMPT_KEY: &str = "default";

/// Built-in template used when the config defines no prompts
pub const DEFAULT_PROMPT_TEMPLATE: &str = r#"You are a command-line coding assistant operating in the user's working directory.
Reply with exactly one JSON object and nothing else.
To act, reply: {"commands": ["<shell command>", ...], "explanation": "<what the commands do>"}
Commands run in order with bash in the working directory.
If no command is needed, reply: {"answer": "<your answer>"}

Request: {{input}}"#;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the model backend
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    /// Model name sent with every request
    #[serde(default = "default_model")]
    pub model: String,

    /// Directory names excluded from the workspace listing
    #[serde(default = "default_ignore_dirs")]
    pub ignore_dirs: Vec<String>,

    /// Maximum number of history turns kept; 0 disables trimming
    #[serde(default)]
    pub context_file_limit: usize,

    /// Maximum number of commands executed per reply; 0 means no cap
    #[serde(default)]
    pub action_limit: usize,

    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// HTTP timeout for one model request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Optional per-command timeout; commands run to completion when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_timeout_secs: Option<u64>,

    /// Directory for history and snapshot, relative to the working directory
    /// (supports ~ expansion)
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,

    /// Prompt templates keyed by name
    #[serde(default = "default_prompts")]
    pub prompts: BTreeMap<String, String>,
}

// Default value functions
fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3.1:8b".to_string()
}

fn default_ignore_dirs() -> Vec<String> {
    [".git", "target", "node_modules", ".open-coder"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_prompts() -> BTreeMap<String, String> {
    BTreeMap::from([(
        DEFAULT_PROMPT_KEY.to_string(),
        DEFAULT_PROMPT_TEMPLATE.to_string(),
    )])
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_request_timeout_secs() -> u64 {
    300
}

fn default_state_dir() -> PathBuf {
    PathBuf::from(".open-coder")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ollama_url: default_ollama_url(),
            model: default_model(),
            ignore_dirs: default_ignore_dirs(),
            context_file_limit: 0,
            action_limit: 0,
            log_level: default_log_level(),
            request_timeout_secs: default_request_timeout_secs(),
            command_timeout_secs: None,
            state_dir: default_state_dir(),
            prompts: default_prompts(),
        }
    }
}

impl Config {
    /// Load configuration from a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - File cannot be read
    /// - JSON/TOML parsing fails
    /// - Validation fails
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path).map_err(|e| {
            EngineError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let is_toml = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);

        if is_toml {
            Self::from_toml_str(&contents)
        } else {
            Self::from_json_str(&contents)
        }
    }

    /// Parse and validate a JSON configuration
    pub fn from_json_str(contents: &str) -> Result<Self, EngineError> {
        let mut config: Config = serde_json::from_str(contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate_and_process()?;
        Ok(config)
    }

    /// Parse and validate a TOML configuration
    pub fn from_toml_str(contents: &str) -> Result<Self, EngineError> {
        let mut config: Config = toml::from_str(contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate_and_process()?;
        Ok(config)
    }

    /// Look up a prompt template by key
    pub fn prompt_template(&self, key: &str) -> Result<&str, EngineError> {
        self.prompts
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| EngineError::Config(format!("Prompt '{}' not found in config", key)))
    }

    /// Non-fatal problems found in a valid configuration.
    ///
    /// Loading happens before logging is set up, so callers log these once
    /// the subscriber is installed.
    pub fn warnings(&self) -> Vec<String> {
        self.prompts
            .iter()
            .filter(|(_, template)| !template.contains(INPUT_PLACEHOLDER))
            .map(|(key, _)| {
                format!(
                    "Prompt '{}' has no {} placeholder; user input will not be sent",
                    key, INPUT_PLACEHOLDER
                )
            })
            .collect()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs.map(Duration::from_secs)
    }

    /// Validate and process configuration
    ///
    /// This method:
    /// - Validates the log level
    /// - Validates backend URL and model name
    /// - Rejects empty prompt templates
    /// - Expands ~ in the state directory
    fn validate_and_process(&mut self) -> Result<(), EngineError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.log_level.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.log_level,
                valid_log_levels.join(", ")
            )));
        }

        let url = self.ollama_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(EngineError::Config(format!(
                "ollama_url must start with http:// or https://, got '{}'",
                self.ollama_url
            )));
        }
        self.ollama_url = url.to_string();

        if self.model.trim().is_empty() {
            return Err(EngineError::Config("model must not be empty".to_string()));
        }

        for (key, template) in &self.prompts {
            if template.trim().is_empty() {
                return Err(EngineError::Config(format!(
                    "Prompt '{}' must not be empty",
                    key
                )));
            }
        }

        self.state_dir = expand_path(&self.state_dir)?;

        Ok(())
    }
}

/// Expand ~ in path to user's home directory
fn expand_path(path: &Path) -> Result<PathBuf, EngineError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| EngineError::Config("Invalid UTF-8 in path".to_string()))?;

    if let Some(rest) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(rest))
    } else if path_str == "~" {
        dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))
    } else {
        Ok(path.to_path_buf())
    }
}
