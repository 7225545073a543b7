//! # Bot Configuration
//!
//! Environment-driven configuration loaded once at startup. Identity fields
//! (token, application id) are mandatory; template placeholders such as
//! `YOUR_BOT_TOKEN` count as missing.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Add watcher quiet period and registration debounce settings
//! - 1.0.0: Initial release, replaces config.json with environment variables

use anyhow::{anyhow, Result};
use log::warn;
use std::collections::HashSet;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Values shipped in the template `.env` that must be replaced before launch
const PLACEHOLDER_TOKENS: &[&str] = &[
    "YOUR_BOT_TOKEN",
    "YOUR_BOT_ID",
    "YOUR_BOT_OWNER_ID",
    "YOUR_DEVELOPER_COMMANDS_SERVER_ID_1",
    "YOUR_DEVELOPER_COMMANDS_SERVER_ID_2",
    "YOUR_GUILD_JOIN_LOGS_CHANNEL_ID",
    "YOUR_GUILD_LEAVE_LOGS_CHANNEL_ID",
    "YOUR_COMMAND_LOGS_CHANNEL_ID",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub application_id: u64,
    pub owner_id: Option<u64>,
    pub admin_ids: Vec<u64>,
    pub developer_guild_ids: Vec<u64>,
    /// Prefix for text commands; empty disables them
    pub prefix: String,
    pub command_logs_channel_id: Option<u64>,
    pub guild_join_logs_channel_id: Option<u64>,
    pub guild_leave_logs_channel_id: Option<u64>,
    pub commands_dir: PathBuf,
    pub messages_dir: PathBuf,
    pub events_dir: PathBuf,
    pub errors_dir: PathBuf,
    pub error_logging_enabled: bool,
    pub exec_allowed_commands: Vec<String>,
    pub register_debounce: Duration,
    pub watch_quiet_period: Duration,
    pub log_level: String,
}

/// Who may run `admin_only` / `owner_only` definitions
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    pub owner_id: Option<u64>,
    pub admin_ids: HashSet<u64>,
}

impl AccessPolicy {
    pub fn is_owner(&self, user_id: u64) -> bool {
        self.owner_id == Some(user_id)
    }

    pub fn is_admin(&self, user_id: u64) -> bool {
        self.admin_ids.contains(&user_id)
    }
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup("DISCORD_TOKEN").filter(|v| !is_placeholder(v));
        let application_id = lookup("DISCORD_APPLICATION_ID").filter(|v| !is_placeholder(v));

        let mut missing = Vec::new();
        if token.is_none() {
            missing.push("DISCORD_TOKEN (replace 'YOUR_BOT_TOKEN' with the bot token)");
        }
        if application_id.is_none() {
            missing.push("DISCORD_APPLICATION_ID (replace 'YOUR_BOT_ID' with the bot id)");
        }
        if !missing.is_empty() {
            return Err(anyhow!(
                "Missing or incorrect critical configuration: {}",
                missing.join(", ")
            ));
        }

        let application_id = application_id
            .unwrap_or_default()
            .trim()
            .parse::<u64>()
            .map_err(|_| anyhow!("DISCORD_APPLICATION_ID must be a numeric snowflake"))?;

        let string_or = |key: &str, default: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .unwrap_or_else(|| default.to_string())
        };
        let path_or = |key: &str, default: &str| PathBuf::from(string_or(key, default));
        let secs_or = |key: &str, default: u64| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(default)
        };

        Ok(Config {
            discord_token: token.unwrap_or_default(),
            application_id,
            owner_id: lookup("BOT_OWNER_ID").and_then(|v| parse_id("BOT_OWNER_ID", &v)),
            admin_ids: parse_id_list("BOT_ADMIN_IDS", lookup("BOT_ADMIN_IDS").as_deref()),
            developer_guild_ids: parse_id_list(
                "DEVELOPER_GUILD_IDS",
                lookup("DEVELOPER_GUILD_IDS").as_deref(),
            ),
            // Whitespace is significant only at the edges; "" turns prefix commands off
            prefix: lookup("COMMAND_PREFIX")
                .map(|v| v.trim().to_lowercase())
                .unwrap_or_else(|| "!".to_string()),
            command_logs_channel_id: lookup("COMMAND_LOGS_CHANNEL_ID")
                .and_then(|v| parse_id("COMMAND_LOGS_CHANNEL_ID", &v)),
            guild_join_logs_channel_id: lookup("GUILD_JOIN_LOGS_CHANNEL_ID")
                .and_then(|v| parse_id("GUILD_JOIN_LOGS_CHANNEL_ID", &v)),
            guild_leave_logs_channel_id: lookup("GUILD_LEAVE_LOGS_CHANNEL_ID")
                .and_then(|v| parse_id("GUILD_LEAVE_LOGS_CHANNEL_ID", &v)),
            commands_dir: path_or("COMMANDS_DIR", "src/commands"),
            messages_dir: path_or("MESSAGES_DIR", "src/messages"),
            events_dir: path_or("EVENTS_DIR", "src/events"),
            errors_dir: path_or("ERRORS_DIR", "errors"),
            error_logging_enabled: lookup("ERROR_LOGGING")
                .map(|v| !matches!(v.trim().to_lowercase().as_str(), "false" | "0" | "off"))
                .unwrap_or(true),
            exec_allowed_commands: lookup("EXEC_ALLOWED_COMMANDS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            register_debounce: Duration::from_secs(secs_or("REGISTER_DEBOUNCE_SECS", 5)),
            watch_quiet_period: Duration::from_millis(secs_or("WATCH_QUIET_MS", 500)),
            log_level: string_or("LOG_LEVEL", "info"),
        })
    }

    pub fn access_policy(&self) -> AccessPolicy {
        AccessPolicy {
            owner_id: self.owner_id,
            admin_ids: self.admin_ids.iter().copied().collect(),
        }
    }

    pub fn prefix_enabled(&self) -> bool {
        !self.prefix.is_empty()
    }
}

fn is_placeholder(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || PLACEHOLDER_TOKENS.contains(&value) || value.starts_with("YOUR_")
}

fn parse_id(key: &str, value: &str) -> Option<u64> {
    if is_placeholder(value) {
        return None;
    }
    match value.trim().parse::<u64>() {
        Ok(id) => Some(id),
        Err(_) => {
            warn!("Ignoring {key}: '{value}' is not a valid Discord id");
            None
        }
    }
}

fn parse_id_list(key: &str, value: Option<&str>) -> Vec<u64> {
    value
        .map(|v| {
            v.split(',')
                .filter_map(|part| parse_id(key, part))
                .collect()
        })
        .unwrap_or_default()
}
