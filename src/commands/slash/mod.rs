//! # Slash Commands (/)
//!
//! Payload building and remote registration for slash definitions. Global
//! commands go out in one bulk overwrite; `dev_only` commands go to each
//! developer guild instead.
//!
//! - **Version**: 3.0.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 3.0.0: Commands come from definition files and can be unregistered one by one
//! - 2.0.0: Consolidate plugins into a single command with subcommands
//! - 1.0.0: Reorganized from monolithic slash_commands.rs

pub mod api;
pub mod builder;
pub mod options;

pub use api::{is_unknown_application, CommandApi, RemoteCommand, SerenityCommandApi};
pub use builder::{build_command, command_payload};
pub use options::option_values;

use anyhow::{anyhow, Context as _, Result};
use log::{error, info, warn};
use serde_json::Value;
use std::sync::Arc;

use super::registry::Registry;
use crate::features::definitions::SlashCommand;

/// Bulk payloads split by destination
#[derive(Debug, Default)]
pub struct Payloads {
    pub global: Vec<Value>,
    pub developer: Vec<Value>,
}

/// Build global and developer-guild arrays from the registry
pub fn build_payloads(registry: &Registry<SlashCommand>) -> Payloads {
    let mut payloads = Payloads::default();
    for command in registry.list() {
        let payload = command_payload(&command);
        if command.policy.dev_only {
            payloads.developer.push(payload);
        } else {
            payloads.global.push(payload);
        }
    }
    payloads
}

/// Pushes the slash registry to Discord
pub struct CommandRegistrar {
    api: Arc<dyn CommandApi>,
    developer_guild_ids: Vec<u64>,
}

impl CommandRegistrar {
    pub fn new(api: Arc<dyn CommandApi>, developer_guild_ids: Vec<u64>) -> Self {
        Self {
            api,
            developer_guild_ids,
        }
    }

    /// Replace the remote command set with the current registry
    ///
    /// The global overwrite always runs, so an empty registry clears remote
    /// commands. Developer guilds get the `dev_only` set. Every scope is
    /// attempted even when an earlier one fails; the failures come back as one
    /// error.
    pub async fn sync(&self, registry: &Registry<SlashCommand>) -> Result<()> {
        let payloads = build_payloads(registry);
        let mut failures = Vec::new();

        info!(
            "🔄 Started refreshing application (/) commands ({} global, {} developer)",
            payloads.global.len(),
            payloads.developer.len()
        );

        if let Err(e) = self
            .api
            .overwrite_global(&payloads.global)
            .await
            .context("Failed to register global commands")
        {
            error!("❌ {e:#}");
            failures.push(e);
        }

        if payloads.developer.is_empty() && !self.developer_guild_ids.is_empty() {
            info!("No developer-only commands, clearing developer guilds");
        }
        for guild_id in &self.developer_guild_ids {
            if let Err(e) = self
                .api
                .overwrite_guild(*guild_id, &payloads.developer)
                .await
                .with_context(|| format!("Failed to register commands for guild {guild_id}"))
            {
                error!("❌ {e:#}");
                failures.push(e);
            }
        }
        if !payloads.developer.is_empty() && self.developer_guild_ids.is_empty() {
            warn!(
                "⚠️ {} developer-only command(s) not registered: DEVELOPER_GUILD_IDS is empty",
                payloads.developer.len()
            );
        }

        combine(failures)?;
        info!("✅ Successfully reloaded application (/) commands");
        Ok(())
    }

    /// Delete the remote command called `name`, globally and in developer guilds
    ///
    /// Other remote commands are left alone. A failing scope does not stop the
    /// others. Returns how many were deleted.
    pub async fn unregister(&self, name: &str) -> Result<usize> {
        let mut deleted = 0;
        let mut failures = Vec::new();

        match self.unregister_global(name).await {
            Ok(count) => deleted += count,
            Err(e) => {
                error!("❌ {e:#}");
                failures.push(e);
            }
        }

        for guild_id in &self.developer_guild_ids {
            match self.unregister_in_guild(*guild_id, name).await {
                Ok(count) => deleted += count,
                Err(e) => {
                    error!("❌ {e:#}");
                    failures.push(e);
                }
            }
        }

        combine(failures)?;
        if deleted == 0 {
            warn!("⚠️ Command \"{name}\" was not registered remotely");
        } else {
            info!("🗑️ Unregistered command \"{name}\"");
        }
        Ok(deleted)
    }

    async fn unregister_global(&self, name: &str) -> Result<usize> {
        let commands = self
            .api
            .list_global()
            .await
            .context("Failed to fetch global commands")?;
        let mut deleted = 0;
        for command in commands.iter().filter(|c| c.name == name) {
            self.api
                .delete_global(command.id)
                .await
                .with_context(|| format!("Failed to delete global command \"{name}\""))?;
            deleted += 1;
        }
        Ok(deleted)
    }

    async fn unregister_in_guild(&self, guild_id: u64, name: &str) -> Result<usize> {
        let commands = self
            .api
            .list_guild(guild_id)
            .await
            .with_context(|| format!("Failed to fetch commands for guild {guild_id}"))?;
        let mut deleted = 0;
        for command in commands.iter().filter(|c| c.name == name) {
            self.api
                .delete_guild(guild_id, command.id)
                .await
                .with_context(|| format!("Failed to delete \"{name}\" in guild {guild_id}"))?;
            deleted += 1;
        }
        Ok(deleted)
    }
}

/// One error describing every failed scope, or `Ok` when none failed
fn combine(mut failures: Vec<anyhow::Error>) -> Result<()> {
    if failures.len() > 1 {
        let details: Vec<String> = failures.iter().map(|e| format!("{e:#}")).collect();
        return Err(anyhow!("{} scopes failed: {}", failures.len(), details.join("; ")));
    }
    match failures.pop() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
