//! Command handlers for CLI operations
//!
//! Wires configuration into the session components and runs the
//! interactive loop on stdin/stdout.

use anyhow::{Context, Result};
use std::io;

use crate::agent::{AgentCore, SessionContext, TurnSettings};
use crate::cli::Cli;
use crate::command_executor::CommandExecutor;
use crate::config::Config;
use crate::context::WorkspaceContext;
use crate::llm::ollama::OllamaProvider;

/// Build an agent for the current working directory from configuration.
pub fn build_agent(cli: &Cli, config: &Config) -> Result<AgentCore> {
    let prompt_template = config.prompt_template(&cli.prompt)?.to_string();

    let session = SessionContext::from_current_dir(&config.state_dir)?;
    tracing::debug!("State directory: {:?}", session.state_dir());

    let backend = OllamaProvider::with_timeout(
        config.ollama_url.clone(),
        config.model.clone(),
        config.request_timeout(),
    )
    .context("Failed to create model backend")?;

    let executor =
        CommandExecutor::new(session.work_dir()).with_timeout(config.command_timeout());
    let context = WorkspaceContext::new(session.work_dir(), &config.ignore_dirs);

    Ok(AgentCore::new(
        session,
        Box::new(backend),
        executor,
        context,
        TurnSettings {
            prompt_template,
            history_limit: config.context_file_limit,
            action_limit: config.action_limit,
        },
    ))
}

/// Run an interactive session until `exit`/`quit` or end of input.
pub async fn handle_session(cli: &Cli, config: &Config) -> Result<()> {
    let agent = build_agent(cli, config)?;

    tracing::info!(
        "Using model {} at {} (prompt '{}')",
        config.model,
        config.ollama_url,
        cli.prompt
    );

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    agent.run(stdin.lock(), &mut out).await
}
