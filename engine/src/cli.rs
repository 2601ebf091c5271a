//! CLI interface for open-coder
//!
//! Flags are parsed with clap's derive API. The session itself is an
//! interactive REPL on stdin, so there are no subcommands.

use clap::Parser;
use std::path::PathBuf;

use crate::config::DEFAULT_PROMPT_KEY;

/// open-coder
///
/// Turns natural-language requests into shell commands using a local or
/// remote language model, runs them in the current directory and keeps a
/// bounded conversation history.
#[derive(Parser, Debug)]
#[command(name = "open-coder")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(long, value_name = "PATH", default_value = "config.json")]
    pub config: PathBuf,

    /// Prompt template key in config
    #[arg(long, value_name = "KEY", default_value = DEFAULT_PROMPT_KEY)]
    pub prompt: String,

    /// Set log level (error, warn, info, debug, trace), overriding the config
    #[arg(long, value_name = "LEVEL")]
    pub log: Option<String>,
}
