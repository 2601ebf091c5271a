//! Agent Core
//!
//! The turn orchestrator. Each line of user input goes through:
//!
//! 1. Special commands (`/clear`, `exit`, `quit`) and empty input
//! 2. Direct command check: input that already is a command action JSON is
//!    executed without consulting the model
//! 3. Model dispatch: system context + history + rendered prompt are sent to
//!    the backend, the reply is interpreted, commands are executed, and the
//!    user/assistant pair is appended to history, trimmed and persisted
//!
//! Errors are routed through their `ErrorPolicy`: a transport failure aborts
//! the turn, decode, command and history failures degrade, and anything
//! that terminates is returned to the caller. A failed turn never touches
//! history, and an unreadable history file is never written over.

use anyhow::Result;
use std::io::{BufRead, Write};
use tracing::{debug, error, info, warn};

use crate::command_executor::CommandExecutor;
use crate::context::{render_prompt, WorkspaceContext};
use crate::llm::{ChatBackend, LLMError, Turn};
use crate::response::{direct_commands, interpret, ActionResponse};
use sdk::errors::{EngineError, ErrorExt, ErrorPolicy};

use super::history::HistoryStore;
use super::session::SessionContext;

const CLEAR_COMMAND: &str = "/clear";
const EXIT_COMMANDS: [&str; 2] = ["exit", "quit"];
const INPUT_PROMPT: &str = "> ";

/// What the session loop does after handling one input line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Per-session knobs taken from configuration
#[derive(Debug, Clone)]
pub struct TurnSettings {
    /// Template the user's input is rendered into
    pub prompt_template: String,

    /// History turns kept; 0 disables trimming
    pub history_limit: usize,

    /// Commands executed per reply; 0 means no cap
    pub action_limit: usize,
}

/// Agent Core that orchestrates one request/response cycle per input line
pub struct AgentCore {
    session: SessionContext,
    backend: Box<dyn ChatBackend>,
    executor: CommandExecutor,
    context: WorkspaceContext,
    settings: TurnSettings,
}

impl AgentCore {
    pub fn new(
        session: SessionContext,
        backend: Box<dyn ChatBackend>,
        executor: CommandExecutor,
        context: WorkspaceContext,
        settings: TurnSettings,
    ) -> Self {
        Self {
            session,
            backend,
            executor,
            context,
            settings,
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Run the interactive loop until `exit`/`quit` or end of input.
    pub async fn run<R: BufRead, W: Write>(&self, mut input: R, out: &mut W) -> Result<()> {
        info!("Session started in {:?}", self.session.work_dir());

        let mut line = String::new();
        loop {
            write!(out, "{}", INPUT_PROMPT)?;
            out.flush()?;

            line.clear();
            if input.read_line(&mut line)? == 0 {
                writeln!(out)?;
                info!("End of input, closing session");
                return Ok(());
            }

            if self.handle_input(&line, out).await? == Flow::Exit {
                return Ok(());
            }
        }
    }

    /// Handle one line of user input.
    pub async fn handle_input<W: Write>(&self, raw: &str, out: &mut W) -> Result<Flow> {
        let input = raw.trim();
        if input.is_empty() {
            return Ok(Flow::Continue);
        }

        if input == CLEAR_COMMAND {
            self.clear_history(out)?;
            return Ok(Flow::Continue);
        }

        if EXIT_COMMANDS.contains(&input) {
            writeln!(out, "Bye!")?;
            return Ok(Flow::Exit);
        }

        if let Some(action) = direct_commands(input) {
            debug!("Input is a direct command action, skipping the model");
            self.execute_direct(&action, out).await?;
            return Ok(Flow::Continue);
        }

        self.dispatch_to_model(input, out).await?;
        Ok(Flow::Continue)
    }

    fn clear_history<W: Write>(&self, out: &mut W) -> Result<()> {
        // whatever is on disk, valid or not, is replaced by an empty array
        let mut history =
            HistoryStore::new(self.session.history_path(), self.settings.history_limit);
        match history.clear() {
            Ok(()) => writeln!(out, "Context history cleared.")?,
            Err(e) => {
                writeln!(out, "Failed to clear history: {}", e)?;
                self.apply_policy(e)?;
            }
        }
        Ok(())
    }

    async fn execute_direct<W: Write>(&self, action: &ActionResponse, out: &mut W) -> Result<()> {
        self.execute_batch(action.commands(), out).await?;
        render_explanation(action, out)?;
        Ok(())
    }

    async fn dispatch_to_model<W: Write>(&self, input: &str, out: &mut W) -> Result<()> {
        let system_prompt = self.context.system_prompt(self.session.snapshot_path());
        let prompt = render_prompt(&self.settings.prompt_template, input);

        // An unreadable file is kept intact: this turn runs without prior
        // context and is not persisted.
        let (mut history, writable) =
            match HistoryStore::load(self.session.history_path(), self.settings.history_limit) {
                Ok(history) => (history, true),
                Err(e) => {
                    self.apply_policy(e)?;
                    let empty =
                        HistoryStore::new(self.session.history_path(), self.settings.history_limit);
                    (empty, false)
                }
            };

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(Turn::system(system_prompt));
        messages.extend(history.turns().iter().cloned());
        messages.push(Turn::user(prompt.clone()));

        let content = match self.backend.chat(&messages).await {
            Ok(content) => content,
            Err(e) => {
                let verbatim = match &e {
                    LLMError::UnexpectedBody(body) => Some(body.clone()),
                    _ => None,
                };
                let err = EngineError::from(e);
                match verbatim {
                    Some(body) => writeln!(out, "{}", body)?,
                    None => writeln!(out, "{}\n{}", err, err.user_hint())?,
                }
                // nothing to interpret, whatever the policy
                self.apply_policy(err)?;
                return Ok(());
            }
        };

        let action = match interpret(&content) {
            Ok(action) => action,
            Err(e) => {
                self.apply_policy(e.into())?;
                ActionResponse::Raw(content.clone())
            }
        };

        match &action {
            ActionResponse::Raw(text) => {
                writeln!(out, "{}", text)?;
                return Ok(());
            }
            ActionResponse::Commands { commands, .. } => {
                self.execute_batch(commands, out).await?;
            }
            ActionResponse::Answer { answer, .. } => {
                if let Some(answer) = answer {
                    writeln!(out, "{}", answer)?;
                }
            }
        }
        render_explanation(&action, out)?;

        history.append([Turn::user(prompt), Turn::assistant(content)]);
        history.trim_if_over_limit();
        if writable {
            if let Err(e) = history.persist() {
                self.apply_policy(e)?;
            }
        }

        Ok(())
    }

    /// Log `err` at the level its policy calls for.
    ///
    /// `Terminate` errors are returned so the session ends; otherwise the
    /// applied policy is returned and the caller carries on accordingly.
    fn apply_policy(&self, err: EngineError) -> Result<ErrorPolicy> {
        let policy = err.policy();
        match policy {
            ErrorPolicy::Terminate => return Err(err.into()),
            ErrorPolicy::AbortTurn => {
                error!("{} via {}; turn aborted ({})", err, self.backend.name(), err.user_hint())
            }
            ErrorPolicy::Degrade => warn!("{} ({})", err, err.user_hint()),
        }
        Ok(policy)
    }

    /// Run commands in order, rendering each as it completes.
    async fn execute_batch<W: Write>(
        &self,
        commands: &[String],
        out: &mut W,
    ) -> Result<()> {
        let limit = self.settings.action_limit;
        let (run, skipped) = if limit > 0 && commands.len() > limit {
            commands.split_at(limit)
        } else {
            (commands, &[][..])
        };

        writeln!(out, "Executing commands:")?;
        for command in run {
            writeln!(out, "> {}", command)?;
            out.flush()?;

            let result = self.executor.run(command).await;
            writeln!(out, "{}", result.display_output().trim_end_matches('\n'))?;
            if result.failed {
                let reason = result
                    .reason
                    .unwrap_or_else(|| "command failed".to_string());
                writeln!(out, "Error executing command '{}': {}", command, reason)?;
                self.apply_policy(EngineError::CommandFailed {
                    command: command.clone(),
                    reason,
                })?;
            }
        }

        if !skipped.is_empty() {
            warn!(
                "Reply proposed {} commands, action limit is {}",
                commands.len(),
                limit
            );
            writeln!(
                out,
                "Skipping {} command(s) beyond action limit",
                skipped.len()
            )?;
        }
        writeln!(out, "Done executing commands.")?;

        Ok(())
    }
}

fn render_explanation<W: Write>(action: &ActionResponse, out: &mut W) -> Result<()> {
    if let Some(explanation) = action.explanation() {
        writeln!(out, "Explanation:")?;
        writeln!(out, "{}", explanation)?;
    }
    Ok(())
}
