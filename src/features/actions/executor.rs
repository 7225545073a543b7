//! # Secure Exec Action Runner
//!
//! Runs allow-listed programs for `exec` actions with placeholder substitution,
//! input validation, output limiting, and a timeout.
//!
//! - **Version**: 3.0.0
//! - **Since**: 0.9.0
//!
//! ## Changelog
//! - 3.0.0: Driven by definition files, only referenced values are validated
//! - 1.2.0: Allow URLs with special chars (&)
//! - 1.1.0: Validate user values before substitution so configured scripts still work
//! - 1.0.0: Initial release

use crate::features::actions::template::placeholders;
use crate::features::definitions::ExecAction;
use anyhow::{anyhow, Result};
use log::{info, warn};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

/// Characters that could enable shell injection
const DANGEROUS_CHARS: &[char] = &[
    '|', ';', '&', '$', '`', '(', ')', '{', '}', '<', '>', '\n', '\r', '\0',
];

/// Result of one program run
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub success: bool,
    pub exit_code: Option<i32>,
    /// Standard output (may be truncated)
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ExecRunner {
    allowed_commands: HashSet<String>,
}

impl ExecRunner {
    pub fn new(allowed_commands: Vec<String>) -> Self {
        Self {
            allowed_commands: allowed_commands.into_iter().collect(),
        }
    }

    pub fn is_allowed(&self, command: &str) -> bool {
        self.allowed_commands.contains(command)
    }

    /// Run an exec action with full security checks
    pub async fn execute(
        &self,
        action: &ExecAction,
        params: &HashMap<String, String>,
    ) -> Result<ExecutionResult> {
        if !self.is_allowed(&action.command) {
            return Err(anyhow!(
                "Command not in allowlist: {}. Set EXEC_ALLOWED_COMMANDS to enable it",
                action.command
            ));
        }

        let args = substitute_params(&action.args, params)?;

        info!(
            "⚙️ Executing {} {:?} (timeout: {}s)",
            action.command, args, action.timeout_seconds
        );

        let mut cmd = Command::new(&action.command);
        cmd.args(&args)
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true);

        if let Some(ref dir) = action.working_directory {
            cmd.current_dir(dir);
        }
        for (key, value) in &action.env {
            cmd.env(key, value);
        }

        let limit = Duration::from_secs(action.timeout_seconds);
        match timeout(limit, cmd.output()).await {
            Ok(Ok(output)) => {
                let stdout = truncate_output(
                    &String::from_utf8_lossy(&output.stdout),
                    action.max_output_bytes,
                );
                let exit_code = output.status.code();
                let success = output.status.success();

                if !success {
                    warn!("{} exited with code {:?}", action.command, exit_code);
                }

                Ok(ExecutionResult {
                    success,
                    exit_code,
                    stdout,
                    stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                    timed_out: false,
                })
            }
            Ok(Err(e)) => Err(anyhow!("Failed to execute {}: {}", action.command, e)),
            Err(_) => {
                warn!("{} timed out after {}s", action.command, action.timeout_seconds);
                Ok(ExecutionResult {
                    success: false,
                    exit_code: None,
                    stdout: String::new(),
                    stderr: format!("Command timed out after {} seconds", action.timeout_seconds),
                    timed_out: true,
                })
            }
        }
    }
}

/// Cut `text` to at most `max` bytes on a char boundary, with a marker
fn truncate_output(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    warn!("Output truncated from {} to {} bytes", text.len(), end);
    format!("{}...\n\n[Output truncated at {} bytes]", &text[..end], max)
}

/// Substitute ${param} placeholders in arguments
///
/// Values are checked before substitution so configured shell snippets still work.
/// Only values an argument refers to are checked: a guild called "Foo (beta)" must
/// not break actions that never use `${guild}`.
fn substitute_params(args: &[String], params: &HashMap<String, String>) -> Result<Vec<String>> {
    args.iter()
        .map(|arg| {
            let mut result = arg.clone();
            for key in placeholders(arg) {
                let value = params
                    .get(key)
                    .ok_or_else(|| anyhow!("Unsubstituted placeholder ${{{key}}}: parameter not provided"))?;
                validate_argument(value)
                    .map_err(|e| anyhow!("Invalid parameter '{}': {}", key, e))?;
                result = result.replace(&format!("${{{key}}}"), value);
            }
            Ok(result)
        })
        .collect()
}

/// Reject values carrying shell metacharacters
fn validate_argument(arg: &str) -> Result<()> {
    // Programs run without a shell, so '&' in a URL query is harmless
    let is_url = arg.starts_with("http://") || arg.starts_with("https://");

    for &ch in DANGEROUS_CHARS {
        if ch == '&' && is_url {
            continue;
        }
        if arg.contains(ch) {
            let shown = match ch {
                '\n' => "newline".to_string(),
                '\r' => "carriage return".to_string(),
                '\0' => "null byte".to_string(),
                _ => format!("'{}'", ch),
            };
            return Err(anyhow!(
                "Argument contains forbidden character {}: {}",
                shown,
                arg.chars().take(50).collect::<String>()
            ));
        }
    }
    Ok(())
}
