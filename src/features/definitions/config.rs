//! # Definition File Schema
//!
//! YAML schema for slash commands, prefix commands, and event listeners.
//! One file holds one definition.
//!
//! - **Version**: 1.2.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.2.0: Exec actions may post their output to a channel instead of replying
//! - 1.1.0: Accept camelCase event names
//! - 1.0.0: Initial schema with reply, send, and exec actions

use crate::commands::handler::{Definition, Guarded};
use crate::features::definitions::permissions::canonical_permission;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use serenity::model::application::command::CommandOptionType;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::AtomicBool;

/// Gateway events an event definition may listen to
pub const KNOWN_EVENTS: &[&str] = &[
    "ready",
    "guild_create",
    "guild_delete",
    "guild_member_add",
    "guild_member_remove",
    "message_create",
    "message_delete",
];

const MAX_OPTIONS: usize = 25;

/// Discord's rule for command and option names: 1-32 chars of `[a-z0-9_-]`
fn is_valid_slash_name(name: &str) -> bool {
    (1..=32).contains(&name.chars().count())
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}

/// Invocation policy shared by slash and prefix commands
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Policy {
    #[serde(default)]
    pub admin_only: bool,

    #[serde(default)]
    pub owner_only: bool,

    /// Register only in developer guilds
    #[serde(default)]
    pub dev_only: bool,

    #[serde(default)]
    pub disabled: bool,

    /// Per-user cooldown in seconds, 3 when omitted
    ///
    /// An explicit 0 turns the check off. The JS toolkit this format comes from
    /// treats 0 as "use the default"; here 0 is the way to opt out.
    #[serde(default = "default_cooldown")]
    pub cooldown: u64,

    /// Permissions the invoking member must hold
    #[serde(default)]
    pub user_permissions: Vec<String>,

    /// Permissions the bot must hold in the guild
    #[serde(default)]
    pub bot_permissions: Vec<String>,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            admin_only: false,
            owner_only: false,
            dev_only: false,
            disabled: false,
            cooldown: default_cooldown(),
            user_permissions: Vec::new(),
            bot_permissions: Vec::new(),
        }
    }
}

impl Policy {
    fn validate(&self, name: &str) -> Result<()> {
        for perm in self.user_permissions.iter().chain(&self.bot_permissions) {
            if canonical_permission(perm).is_none() {
                return Err(anyhow!("Unknown permission '{}' in '{}'", perm, name));
            }
        }
        Ok(())
    }
}

/// What a definition does when it runs
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Answer the invoker
    Reply {
        content: String,
        #[serde(default)]
        ephemeral: bool,
    },
    /// Post to a fixed channel
    Send { channel_id: u64, content: String },
    /// Run an allow-listed program and post its output
    Exec(ExecAction),
}

impl Action {
    fn validate(&self, name: &str) -> Result<()> {
        match self {
            Action::Reply { content, .. } | Action::Send { content, .. } => {
                if content.trim().is_empty() {
                    return Err(anyhow!("Action for '{}' has empty content", name));
                }
            }
            Action::Exec(exec) => {
                if exec.command.trim().is_empty() {
                    return Err(anyhow!("Exec action for '{}' has no command", name));
                }
                if exec.timeout_seconds == 0 {
                    return Err(anyhow!("Exec action for '{}' needs a timeout", name));
                }
            }
        }
        Ok(())
    }
}

/// External program execution
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExecAction {
    /// Program to run, must be in the allowlist
    pub command: String,

    /// Arguments with ${placeholder} substitution
    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    pub working_directory: Option<String>,

    #[serde(default = "default_max_output")]
    pub max_output_bytes: usize,

    #[serde(default)]
    pub env: HashMap<String, String>,

    #[serde(default)]
    pub ephemeral: bool,

    /// Post output here instead of replying
    pub channel_id: Option<u64>,
}

/// A slash command option
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CommandOption {
    pub name: String,

    pub description: String,

    /// string, integer, number, boolean, user, channel, role, mentionable, attachment
    #[serde(rename = "type", default = "default_option_type")]
    pub option_type: String,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub choices: Vec<Choice>,
}

impl CommandOption {
    fn validate(&self, command: &str) -> Result<()> {
        if !is_valid_slash_name(&self.name) {
            return Err(anyhow!(
                "Option name must be lowercase: '{}' in command '{}'",
                self.name,
                command
            ));
        }
        if self.description.is_empty() || self.description.chars().count() > 100 {
            return Err(anyhow!(
                "Option description must be 1-100 characters: '{}' in command '{}'",
                self.name,
                command
            ));
        }

        let kind = option_kind(&self.option_type).ok_or_else(|| {
            anyhow!(
                "Unknown type '{}' for option '{}' in command '{}'",
                self.option_type,
                self.name,
                command
            )
        })?;

        if self.choices.is_empty() {
            return Ok(());
        }
        if !matches!(
            kind,
            CommandOptionType::String | CommandOptionType::Integer | CommandOptionType::Number
        ) {
            return Err(anyhow!(
                "Option '{}' in command '{}' cannot have choices (type '{}')",
                self.name,
                command,
                self.option_type
            ));
        }
        for choice in &self.choices {
            let parses = match kind {
                CommandOptionType::Integer => choice.value.parse::<i32>().is_ok(),
                CommandOptionType::Number => choice.value.parse::<f64>().is_ok(),
                _ => true,
            };
            if !parses {
                return Err(anyhow!(
                    "Choice '{}' of option '{}' in command '{}' is not a valid {}: '{}'",
                    choice.name,
                    self.name,
                    command,
                    self.option_type,
                    choice.value
                ));
            }
        }
        Ok(())
    }
}

/// Discord option type for a definition's `type` field, case-insensitive
pub fn option_kind(type_str: &str) -> Option<CommandOptionType> {
    match type_str.to_lowercase().as_str() {
        "string" => Some(CommandOptionType::String),
        "integer" => Some(CommandOptionType::Integer),
        "boolean" => Some(CommandOptionType::Boolean),
        "user" => Some(CommandOptionType::User),
        "channel" => Some(CommandOptionType::Channel),
        "role" => Some(CommandOptionType::Role),
        "mentionable" => Some(CommandOptionType::Mentionable),
        "number" => Some(CommandOptionType::Number),
        "attachment" => Some(CommandOptionType::Attachment),
        _ => None,
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Choice {
    pub name: String,
    pub value: String,
}

/// A slash (/) command registered with Discord
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SlashCommand {
    pub name: String,

    #[serde(default = "default_description")]
    pub description: String,

    #[serde(default)]
    pub options: Vec<CommandOption>,

    #[serde(flatten)]
    pub policy: Policy,

    pub action: Action,
}

/// A text command triggered by the configured prefix
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PrefixCommand {
    pub name: String,

    #[serde(default)]
    pub aliases: Vec<String>,

    #[serde(default = "default_description")]
    pub description: String,

    pub usage: Option<String>,

    #[serde(flatten)]
    pub policy: Policy,

    pub action: Action,
}

/// A listener for a gateway event
#[derive(Debug, Deserialize, Serialize)]
pub struct EventDefinition {
    pub name: String,

    /// Fire only on the first occurrence after loading
    #[serde(default)]
    pub once: bool,

    #[serde(default)]
    pub disabled: bool,

    pub action: Action,

    /// Set after a `once` listener fired; a reload yields a fresh, armed value
    #[serde(skip)]
    pub(crate) fired: AtomicBool,

    /// Several files may listen to one event, so listeners are keyed by file
    #[serde(skip)]
    pub(crate) source: String,
}

impl Definition for SlashCommand {
    const KIND: &'static str = "command";

    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<()> {
        if !is_valid_slash_name(&self.name) {
            return Err(anyhow!(
                "Command name must be 1-32 lowercase letters, digits, '-' or '_': '{}'",
                self.name
            ));
        }
        if self.description.is_empty() || self.description.chars().count() > 100 {
            return Err(anyhow!(
                "Command description must be 1-100 characters: '{}'",
                self.name
            ));
        }
        if self.options.len() > MAX_OPTIONS {
            return Err(anyhow!(
                "Command '{}' has {} options (max {})",
                self.name,
                self.options.len(),
                MAX_OPTIONS
            ));
        }
        for opt in &self.options {
            opt.validate(&self.name)?;
        }
        self.policy.validate(&self.name)?;
        self.action.validate(&self.name)
    }
}

impl Guarded for SlashCommand {
    fn policy(&self) -> &Policy {
        &self.policy
    }

    fn action(&self) -> &Action {
        &self.action
    }
}

impl Definition for PrefixCommand {
    const KIND: &'static str = "prefix command";

    fn name(&self) -> &str {
        &self.name
    }

    fn aliases(&self) -> &[String] {
        &self.aliases
    }

    fn normalize(&mut self) {
        self.name = self.name.trim().to_lowercase();
        for alias in &mut self.aliases {
            *alias = alias.trim().to_lowercase();
        }
        let name = self.name.clone();
        self.aliases.retain(|a| !a.is_empty() && *a != name);
    }

    fn validate(&self) -> Result<()> {
        if self.name.chars().any(char::is_whitespace) {
            return Err(anyhow!("Prefix command name cannot contain spaces: '{}'", self.name));
        }
        if let Some(alias) = self.aliases.iter().find(|a| a.chars().any(char::is_whitespace)) {
            return Err(anyhow!(
                "Alias '{}' of '{}' cannot contain spaces",
                alias,
                self.name
            ));
        }
        self.policy.validate(&self.name)?;
        self.action.validate(&self.name)
    }
}

impl Guarded for PrefixCommand {
    fn policy(&self) -> &Policy {
        &self.policy
    }

    fn action(&self) -> &Action {
        &self.action
    }
}

impl Definition for EventDefinition {
    const KIND: &'static str = "event";

    fn name(&self) -> &str {
        &self.name
    }

    fn key(&self) -> &str {
        if self.source.is_empty() {
            &self.name
        } else {
            &self.source
        }
    }

    fn set_source(&mut self, path: &Path) {
        self.source = path.display().to_string();
    }

    fn normalize(&mut self) {
        self.name = normalize_event_name(&self.name);
    }

    fn validate(&self) -> Result<()> {
        if !KNOWN_EVENTS.contains(&self.name.as_str()) {
            return Err(anyhow!(
                "Unknown event '{}'. Known events: {}",
                self.name,
                KNOWN_EVENTS.join(", ")
            ));
        }
        if matches!(self.action, Action::Reply { .. }) {
            return Err(anyhow!(
                "Event '{}' has no invoker to reply to, use a send action",
                self.name
            ));
        }
        self.action.validate(&self.name)
    }
}

/// `guildCreate` / `GuildCreate` / `guild_create` -> `guild_create`
pub fn normalize_event_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.trim().chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else if ch == '-' || ch == ' ' {
            out.push('_');
        } else {
            out.push(ch);
        }
    }
    out
}

// Default value functions
fn default_cooldown() -> u64 {
    3
}

fn default_description() -> String {
    "No description provided".to_string()
}

fn default_option_type() -> String {
    "string".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_max_output() -> usize {
    16_384
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_slash_command() {
        let yaml = r#"
name: ping
action:
  type: reply
  content: "Pong!"
"#;
        let cmd: SlashCommand = serde_yaml::from_str(yaml).unwrap();
        cmd.validate().unwrap();

        assert_eq!(cmd.name, "ping");
        assert_eq!(cmd.description, "No description provided");
        assert_eq!(cmd.policy.cooldown, 3);
        assert!(!cmd.policy.dev_only);
        assert!(matches!(cmd.action, Action::Reply { ephemeral: false, .. }));
    }

    #[test]
    fn test_parse_full_slash_command() {
        let yaml = r#"
name: purge
description: Delete recent messages
admin_only: true
dev_only: true
cooldown: 10
user_permissions: ["MANAGE_MESSAGES"]
bot_permissions: ["Manage Messages"]
options:
  - name: count
    description: How many
    type: integer
    required: true
    choices:
      - name: Ten
        value: "10"
action:
  type: exec
  command: echo
  args: ["purging", "${count}"]
  timeout_seconds: 5
  ephemeral: true
"#;
        let cmd: SlashCommand = serde_yaml::from_str(yaml).unwrap();
        cmd.validate().unwrap();

        assert!(cmd.policy.admin_only);
        assert!(cmd.policy.dev_only);
        assert_eq!(cmd.policy.cooldown, 10);
        assert_eq!(cmd.options[0].option_type, "integer");
        match &cmd.action {
            Action::Exec(exec) => {
                assert_eq!(exec.command, "echo");
                assert_eq!(exec.timeout_seconds, 5);
                assert_eq!(exec.max_output_bytes, 16_384);
                assert!(exec.ephemeral);
            }
            other => panic!("expected exec action, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_cooldown_is_kept_not_defaulted() {
        let yaml = "name: spam\ncooldown: 0\naction: { type: reply, content: hi }\n";
        let cmd: SlashCommand = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cmd.policy.cooldown, 0);
    }

    #[test]
    fn test_missing_name_fails_to_parse() {
        let yaml = r#"
description: nameless
action:
  type: reply
  content: hi
"#;
        assert!(serde_yaml::from_str::<SlashCommand>(yaml).is_err());
    }

    #[test]
    fn test_uppercase_slash_name_rejected() {
        let yaml = r#"
name: Ping
action: { type: reply, content: hi }
"#;
        let cmd: SlashCommand = serde_yaml::from_str(yaml).unwrap();
        assert!(cmd.validate().is_err());
    }

    #[test]
    fn test_unknown_permission_rejected() {
        let yaml = r#"
name: ping
user_permissions: ["Teleport"]
action: { type: reply, content: hi }
"#;
        let cmd: SlashCommand = serde_yaml::from_str(yaml).unwrap();
        assert!(cmd.validate().is_err());
    }

    #[test]
    fn test_unknown_option_type_rejected() {
        let yaml = r#"
name: roll
options:
  - { name: sides, description: Sides, type: interger }
action: { type: reply, content: rolled }
"#;
        let cmd: SlashCommand = serde_yaml::from_str(yaml).unwrap();
        let err = cmd.validate().unwrap_err();
        assert!(err.to_string().contains("Unknown type 'interger'"));
    }

    #[test]
    fn test_option_type_is_case_insensitive() {
        assert_eq!(option_kind("USER"), Some(CommandOptionType::User));
        assert_eq!(option_kind("Number"), Some(CommandOptionType::Number));
        assert_eq!(option_kind("blob"), None);
    }

    #[test]
    fn test_unparsable_choice_rejected() {
        let yaml = r#"
name: roll
options:
  - name: sides
    description: Sides
    type: integer
    choices:
      - { name: Six, value: "6" }
      - { name: Broken, value: "six" }
action: { type: reply, content: rolled }
"#;
        let cmd: SlashCommand = serde_yaml::from_str(yaml).unwrap();
        let err = cmd.validate().unwrap_err();
        assert!(err.to_string().contains("Broken"));
    }

    #[test]
    fn test_choices_on_boolean_option_rejected() {
        let yaml = r#"
name: toggle
options:
  - name: enabled
    description: Turn it on
    type: boolean
    choices:
      - { name: Enable, value: "true" }
action: { type: reply, content: toggled }
"#;
        let cmd: SlashCommand = serde_yaml::from_str(yaml).unwrap();
        assert!(cmd.validate().is_err());
    }

    #[test]
    fn test_empty_exec_command_rejected() {
        let yaml = r#"
name: run
action: { type: exec, command: "" }
"#;
        let cmd: SlashCommand = serde_yaml::from_str(yaml).unwrap();
        assert!(cmd.validate().is_err());
    }

    #[test]
    fn test_prefix_command_normalises_aliases() {
        let yaml = r#"
name: Ping
aliases: ["P", "pong", "ping", ""]
action: { type: reply, content: Pong }
"#;
        let mut cmd: PrefixCommand = serde_yaml::from_str(yaml).unwrap();
        cmd.normalize();
        cmd.validate().unwrap();

        assert_eq!(cmd.name, "ping");
        assert_eq!(cmd.aliases, vec!["p", "pong"]);
    }

    #[test]
    fn test_event_name_normalisation() {
        assert_eq!(normalize_event_name("guildCreate"), "guild_create");
        assert_eq!(normalize_event_name("GuildMemberAdd"), "guild_member_add");
        assert_eq!(normalize_event_name("guild_delete"), "guild_delete");
        assert_eq!(normalize_event_name("ready"), "ready");
    }

    #[test]
    fn test_event_definition_rejects_reply_action() {
        let yaml = r#"
name: guildCreate
action: { type: reply, content: hi }
"#;
        let mut event: EventDefinition = serde_yaml::from_str(yaml).unwrap();
        event.normalize();
        assert!(event.validate().is_err());
    }

    #[test]
    fn test_event_definition_unknown_event_rejected() {
        let yaml = r#"
name: somethingElse
action: { type: send, channel_id: 1, content: hi }
"#;
        let mut event: EventDefinition = serde_yaml::from_str(yaml).unwrap();
        event.normalize();
        assert!(event.validate().is_err());
    }
}
