//! Invocation context for dispatch
//!
//! - **Version**: 2.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 2.0.0: Platform-neutral invocation record shared by slash and prefix triggers
//! - 1.0.0: Initial implementation with core shared state

use serenity::model::Permissions;
use std::collections::HashMap;
use uuid::Uuid;

/// How a definition was triggered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Slash,
    Prefix,
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trigger::Slash => write!(f, "slash"),
            Trigger::Prefix => write!(f, "prefix"),
        }
    }
}

/// Everything the guard chain and actions need about one invocation
///
/// Built from a serenity interaction or message at the edge, so the dispatcher
/// can be exercised without a gateway connection.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Correlates the log lines of one invocation
    pub request_id: Uuid,
    pub user_id: u64,
    pub user_tag: String,
    pub guild_id: Option<u64>,
    pub guild_name: Option<String>,
    pub channel_id: u64,
    pub trigger: Trigger,
    /// The name or alias the user typed
    pub invoked_as: String,
    /// Whitespace-split words after the command (prefix only)
    pub args: Vec<String>,
    /// Slash options as display strings
    pub options: HashMap<String, String>,
    /// `None` outside a guild or when the member could not be resolved
    pub member_permissions: Option<Permissions>,
    pub bot_permissions: Option<Permissions>,
}

impl Invocation {
    pub fn new(user_id: u64, channel_id: u64, trigger: Trigger) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            user_id,
            user_tag: user_id.to_string(),
            guild_id: None,
            guild_name: None,
            channel_id,
            trigger,
            invoked_as: String::new(),
            args: Vec::new(),
            options: HashMap::new(),
            member_permissions: None,
            bot_permissions: None,
        }
    }

    /// Where the invocation came from, for audit records
    pub fn origin(&self) -> String {
        match (&self.guild_name, self.guild_id) {
            (Some(name), _) => name.clone(),
            (None, Some(id)) => id.to_string(),
            (None, None) => "Direct message".to_string(),
        }
    }

    /// Values available to `${placeholder}` in actions
    ///
    /// Slash options are added last so an option called `user` wins over the
    /// built-in variable of the same name.
    pub fn template_vars(&self, command: &str) -> HashMap<String, String> {
        let mut vars = HashMap::from([
            ("user".to_string(), self.user_tag.clone()),
            ("user_id".to_string(), self.user_id.to_string()),
            ("mention".to_string(), format!("<@{}>", self.user_id)),
            ("channel_id".to_string(), self.channel_id.to_string()),
            ("command".to_string(), command.to_string()),
            ("args".to_string(), self.args.join(" ")),
            ("guild".to_string(), self.origin()),
            (
                "guild_id".to_string(),
                self.guild_id.map(|id| id.to_string()).unwrap_or_default(),
            ),
        ]);

        for (i, arg) in self.args.iter().enumerate() {
            vars.insert(format!("arg{i}"), arg.clone());
        }
        for (name, value) in &self.options {
            vars.insert(name.clone(), value.clone());
        }
        vars
    }
}
