//! Embed builders for operator log channels
//!
//! Shared embed construction for command audit posts and guild join/leave logs.
//!
//! - **Version**: 2.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 2.0.0: Audit and guild log embeds
//! - 1.0.0: Initial embed helpers

use crate::core::truncate_for_field;
use crate::features::audit::AuditRecord;
use serenity::builder::CreateEmbed;

const AUDIT_COLOR: u32 = 0x00AAFF;
const JOIN_COLOR: u32 = 0x57F287;
const LEAVE_COLOR: u32 = 0xED4245;

/// Guild details shown in join/leave logs
#[derive(Debug, Clone)]
pub struct GuildSummary {
    pub id: u64,
    pub name: String,
    pub member_count: Option<u64>,
    pub owner_id: Option<u64>,
}

/// Name/value pairs of the audit embed, in display order
pub fn audit_fields(record: &AuditRecord) -> Vec<(&'static str, String)> {
    vec![
        ("User", format!("{} ({})", record.actor, record.actor_id)),
        ("Command", format!("{} ({})", record.definition, record.trigger)),
        ("Server", record.origin.clone()),
        ("Timestamp", record.timestamp.to_rfc3339()),
    ]
}

/// "Command Executed" embed for the command-log channel
pub fn audit_embed(record: &AuditRecord) -> CreateEmbed {
    let mut embed = CreateEmbed::default();
    embed.title("Command Executed");
    embed.color(AUDIT_COLOR);
    for (name, value) in audit_fields(record) {
        embed.field(name, truncate_for_field(&value), true);
    }
    embed
}

fn guild_embed(title: &str, color: u32, guild: &GuildSummary) -> CreateEmbed {
    let mut embed = CreateEmbed::default();
    embed.title(title);
    embed.color(color);
    embed.field("Name", truncate_for_field(&guild.name), true);
    embed.field("ID", guild.id.to_string(), true);
    if let Some(count) = guild.member_count {
        embed.field("Members", count.to_string(), true);
    }
    if let Some(owner) = guild.owner_id {
        embed.field("Owner", format!("<@{owner}>"), true);
    }
    embed
}

/// Posted when the bot is added to a guild
pub fn guild_join_embed(guild: &GuildSummary) -> CreateEmbed {
    guild_embed("Joined a new server", JOIN_COLOR, guild)
}

/// Posted when the bot is removed from a guild
pub fn guild_leave_embed(guild: &GuildSummary) -> CreateEmbed {
    guild_embed("Removed from a server", LEAVE_COLOR, guild)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::context::Trigger;
    use serde_json::Value;

    fn record() -> AuditRecord {
        AuditRecord {
            actor: "alice".to_string(),
            actor_id: 7,
            definition: "ping".to_string(),
            trigger: Trigger::Slash,
            origin: "Rustaceans".to_string(),
            timestamp: chrono::Utc::now(),
        }
    }

    fn field_names(embed: &CreateEmbed) -> Vec<String> {
        match embed.0.get("fields") {
            Some(Value::Array(fields)) => fields
                .iter()
                .filter_map(|f| f.get("name").and_then(Value::as_str).map(String::from))
                .collect(),
            _ => Vec::new(),
        }
    }

    #[test]
    fn test_audit_embed_fields() {
        let embed = audit_embed(&record());

        assert_eq!(
            embed.0.get("title"),
            Some(&Value::String("Command Executed".to_string()))
        );
        assert_eq!(field_names(&embed), vec!["User", "Command", "Server", "Timestamp"]);
    }

    #[test]
    fn test_audit_fields_values() {
        let fields = audit_fields(&record());
        assert_eq!(fields[0].1, "alice (7)");
        assert_eq!(fields[1].1, "ping (slash)");
        assert_eq!(fields[2].1, "Rustaceans");
    }

    #[test]
    fn test_guild_embeds_skip_unknown_details() {
        let guild = GuildSummary {
            id: 1,
            name: "Tiny".to_string(),
            member_count: None,
            owner_id: None,
        };
        assert_eq!(field_names(&guild_join_embed(&guild)), vec!["Name", "ID"]);

        let guild = GuildSummary {
            member_count: Some(12),
            owner_id: Some(3),
            ..guild
        };
        assert_eq!(
            field_names(&guild_leave_embed(&guild)),
            vec!["Name", "ID", "Members", "Owner"]
        );
    }
}
