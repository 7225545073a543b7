//! # Feature: Actions
//!
//! Executes the `action` block of a definition: templated replies, channel posts,
//! and allow-listed external programs whose output is posted back to Discord.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Exec output can go to a fixed channel
//! - 1.0.0: Initial release with reply, send, and exec actions

pub mod executor;
pub mod responder;
pub mod template;

pub use executor::{ExecRunner, ExecutionResult};
pub use responder::{ChannelResponder, InteractionResponder, MessageResponder, Responder};
pub use template::render;

use crate::core::code_block;
use crate::features::definitions::Action;
use anyhow::{anyhow, Result};
use std::collections::HashMap;

/// Runs actions against a responder
#[derive(Debug, Clone, Default)]
pub struct ActionRunner {
    exec: ExecRunner,
}

impl ActionRunner {
    pub fn new(exec: ExecRunner) -> Self {
        Self { exec }
    }

    /// Run `action` with `vars` as placeholder values
    ///
    /// Errors are for the caller to report; nothing is retried.
    pub async fn run(
        &self,
        action: &Action,
        vars: &HashMap<String, String>,
        responder: &dyn Responder,
    ) -> Result<()> {
        match action {
            Action::Reply { content, ephemeral } => {
                responder.reply(&render(content, vars), *ephemeral).await
            }
            Action::Send {
                channel_id,
                content,
            } => responder.send(*channel_id, &render(content, vars)).await,
            Action::Exec(exec) => {
                if exec.channel_id.is_none() {
                    responder.defer(exec.ephemeral).await?;
                }

                let result = self.exec.execute(exec, vars).await?;
                if result.timed_out {
                    return Err(anyhow!("{}", result.stderr));
                }
                if !result.success {
                    return Err(anyhow!(
                        "{} exited with code {:?}: {}",
                        exec.command,
                        result.exit_code,
                        result.stderr.trim()
                    ));
                }

                let output = code_block(&result.stdout);
                match exec.channel_id {
                    Some(channel_id) => responder.send(channel_id, &output).await,
                    None => responder.reply(&output, exec.ephemeral).await,
                }
            }
        }
    }
}
