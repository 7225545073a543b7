//! # Gateway Command Handler
//!
//! Bridges serenity gateway events to the registries: slash interactions and
//! prefixed messages go through the dispatcher, other events reach listeners.
//!
//! - **Version**: 3.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 3.0.0: Dispatch definitions loaded from disk instead of compiled-in handlers
//! - 2.0.0: Slash-only command system
//! - 1.0.0: Initial message and command handling

use anyhow::Result;
use log::{debug, info, warn};
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::channel::Message;
use serenity::model::guild::Guild;
use serenity::model::id::{ChannelId, GuildId, RoleId, UserId};
use serenity::model::Permissions;
use serenity::prelude::Context;
use std::collections::HashMap;
use std::sync::Arc;

use crate::commands::context::{Invocation, Trigger};
use crate::commands::dispatcher::{DispatchOutcome, Dispatcher};
use crate::commands::registry::Registry;
use crate::commands::slash::option_values;
use crate::core::embeds::{guild_join_embed, guild_leave_embed, GuildSummary};
use crate::features::actions::{ChannelResponder, InteractionResponder, MessageResponder};
use crate::features::definitions::{guild_permissions, PrefixCommand, SlashCommand};
use crate::features::events::EventBus;

/// Channels that receive guild join/leave embeds
#[derive(Debug, Clone, Copy, Default)]
pub struct GuildLogChannels {
    pub join: Option<u64>,
    pub leave: Option<u64>,
}

pub struct CommandHandler {
    slash: Arc<Registry<SlashCommand>>,
    prefix: Arc<Registry<PrefixCommand>>,
    events: Arc<EventBus>,
    dispatcher: Arc<Dispatcher>,
    command_prefix: String,
    guild_logs: GuildLogChannels,
}

impl CommandHandler {
    pub fn new(
        slash: Arc<Registry<SlashCommand>>,
        prefix: Arc<Registry<PrefixCommand>>,
        events: Arc<EventBus>,
        dispatcher: Arc<Dispatcher>,
        command_prefix: String,
        guild_logs: GuildLogChannels,
    ) -> Self {
        Self {
            slash,
            prefix,
            events,
            dispatcher,
            command_prefix,
            guild_logs,
        }
    }

    pub fn slash_registry(&self) -> &Arc<Registry<SlashCommand>> {
        &self.slash
    }

    /// Guard and run a slash command interaction
    pub async fn handle_slash_command(
        &self,
        ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let mut invocation =
            Invocation::new(command.user.id.0, command.channel_id.0, Trigger::Slash);
        invocation.user_tag = command.user.tag();
        invocation.invoked_as = command.data.name.clone();
        invocation.options = option_values(&command.data.options);

        if let Some(guild_id) = command.guild_id {
            invocation.guild_id = Some(guild_id.0);
            invocation.guild_name = guild_id.name(&ctx.cache);
            invocation.member_permissions = command
                .member
                .as_ref()
                .and_then(|m| m.permissions)
                .or_else(|| cached_permissions(ctx, guild_id, command.user.id));
            invocation.bot_permissions =
                cached_permissions(ctx, guild_id, ctx.cache.current_user_id());
        }

        let responder = InteractionResponder::new(ctx.http.clone(), command.clone());
        let outcome = self
            .dispatcher
            .dispatch_slash(&self.slash, &command.data.name, &invocation, &responder)
            .await;
        log_outcome(&invocation, &outcome);
        Ok(())
    }

    /// Route a text message to prefix commands and `message_create` listeners
    pub async fn handle_message(&self, ctx: &Context, msg: &Message) -> Result<()> {
        if msg.author.bot {
            return Ok(());
        }

        let mut vars = user_vars(msg.author.id.0, &msg.author.tag());
        vars.insert("channel_id".to_string(), msg.channel_id.0.to_string());
        vars.insert("content".to_string(), msg.content.clone());
        if let Some(guild_id) = msg.guild_id {
            vars.insert("guild_id".to_string(), guild_id.0.to_string());
        }
        self.handle_event(ctx, "message_create", &vars).await;

        if self.command_prefix.is_empty() {
            return Ok(());
        }

        let mut invocation = Invocation::new(msg.author.id.0, msg.channel_id.0, Trigger::Prefix);
        invocation.user_tag = msg.author.tag();
        if let Some(guild_id) = msg.guild_id {
            invocation.guild_id = Some(guild_id.0);
            invocation.guild_name = guild_id.name(&ctx.cache);
            invocation.member_permissions = cached_permissions(ctx, guild_id, msg.author.id);
            invocation.bot_permissions =
                cached_permissions(ctx, guild_id, ctx.cache.current_user_id());
        }

        let responder = MessageResponder::new(ctx.http.clone(), msg.clone());
        if let Some(outcome) = self
            .dispatcher
            .dispatch_prefix(
                &self.prefix,
                &self.command_prefix,
                &msg.content,
                invocation.clone(),
                &responder,
            )
            .await
        {
            log_outcome(&invocation, &outcome);
        }
        Ok(())
    }

    /// Fire listeners for a gateway event
    pub async fn handle_event(&self, ctx: &Context, event: &str, vars: &HashMap<String, String>) {
        let responder = ChannelResponder::new(ctx.http.clone());
        let fired = self.events.emit(event, vars, &responder).await;
        if fired > 0 {
            debug!("{fired} listener(s) ran for {event}");
        }
    }

    /// Log channel embed and listeners for a guild the bot just joined
    pub async fn handle_guild_join(&self, ctx: &Context, guild: &Guild) {
        info!("🆕 Joined new guild: {} ({})", guild.name, guild.id);
        let summary = GuildSummary {
            id: guild.id.0,
            name: guild.name.clone(),
            member_count: Some(guild.member_count),
            owner_id: Some(guild.owner_id.0),
        };
        if let Some(channel) = self.guild_logs.join {
            post_embed(ctx, channel, guild_join_embed(&summary)).await;
        }
        self.handle_event(ctx, "guild_create", &guild_vars(&summary))
            .await;
    }

    /// Log channel embed and listeners for a guild the bot left or was removed from
    pub async fn handle_guild_leave(&self, ctx: &Context, guild_id: GuildId, name: Option<String>) {
        let summary = GuildSummary {
            id: guild_id.0,
            name: name.unwrap_or_else(|| "Unknown".to_string()),
            member_count: None,
            owner_id: None,
        };
        info!("👋 Removed from guild: {} ({})", summary.name, summary.id);
        if let Some(channel) = self.guild_logs.leave {
            post_embed(ctx, channel, guild_leave_embed(&summary)).await;
        }
        self.handle_event(ctx, "guild_delete", &guild_vars(&summary))
            .await;
    }
}

/// Template values for events about a user
pub fn user_vars(user_id: u64, tag: &str) -> HashMap<String, String> {
    HashMap::from([
        ("user".to_string(), tag.to_string()),
        ("user_id".to_string(), user_id.to_string()),
        ("mention".to_string(), format!("<@{user_id}>")),
    ])
}

/// Template values for events about a guild
pub fn guild_vars(guild: &GuildSummary) -> HashMap<String, String> {
    let mut vars = HashMap::from([
        ("guild".to_string(), guild.name.clone()),
        ("guild_id".to_string(), guild.id.to_string()),
    ]);
    if let Some(count) = guild.member_count {
        vars.insert("member_count".to_string(), count.to_string());
    }
    vars
}

/// Permissions of a cached member across the whole guild
fn cached_permissions(ctx: &Context, guild_id: GuildId, user_id: UserId) -> Option<Permissions> {
    let guild = ctx.cache.guild(guild_id)?;
    let member = guild.members.get(&user_id)?;
    let everyone = guild
        .roles
        .get(&RoleId(guild.id.0))
        .map(|role| role.permissions)
        .unwrap_or_else(Permissions::empty);
    let roles = member
        .roles
        .iter()
        .filter_map(|id| guild.roles.get(id))
        .map(|role| role.permissions);
    Some(guild_permissions(user_id == guild.owner_id, everyone, roles))
}

async fn post_embed(ctx: &Context, channel: u64, embed: serenity::builder::CreateEmbed) {
    if let Err(e) = ChannelId(channel)
        .send_message(&ctx.http, |m| m.set_embed(embed))
        .await
    {
        warn!("⚠️ Failed to post to log channel {channel}: {e}");
    }
}

fn log_outcome(invocation: &Invocation, outcome: &DispatchOutcome) {
    let rid = invocation.request_id;
    match outcome {
        DispatchOutcome::Executed => debug!("[{rid}] executed"),
        DispatchOutcome::Rejected(rejection) => debug!("[{rid}] rejected: {rejection}"),
        DispatchOutcome::NotFound { suggestions } => {
            debug!("[{rid}] not found, suggested {suggestions:?}")
        }
        DispatchOutcome::Failed(e) => debug!("[{rid}] failed: {e:#}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_vars() {
        let vars = user_vars(42, "alice#0001");
        assert_eq!(vars["user"], "alice#0001");
        assert_eq!(vars["user_id"], "42");
        assert_eq!(vars["mention"], "<@42>");
    }

    #[test]
    fn test_guild_vars_include_member_count_when_known() {
        let mut guild = GuildSummary {
            id: 5,
            name: "Rustaceans".to_string(),
            member_count: None,
            owner_id: None,
        };
        assert!(!guild_vars(&guild).contains_key("member_count"));

        guild.member_count = Some(12);
        let vars = guild_vars(&guild);
        assert_eq!(vars["guild"], "Rustaceans");
        assert_eq!(vars["guild_id"], "5");
        assert_eq!(vars["member_count"], "12");
    }
}
