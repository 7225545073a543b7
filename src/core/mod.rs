//! # Core Module
//!
//! Configuration, error logging, and Discord size helpers shared by every feature.
//!
//! - **Version**: 2.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.0.0: Add error log files and the panic guard
//! - 1.1.0: Add response module with message truncation utilities
//! - 1.0.0: Initial creation with config module

pub mod config;
pub mod crash;
pub mod embeds;
pub mod error_log;
pub mod response;

// Re-export commonly used items
pub use config::{AccessPolicy, Config};
pub use crash::install_panic_hook;
pub use error_log::ErrorLog;
pub use embeds::{audit_embed, guild_join_embed, guild_leave_embed, GuildSummary};
pub use response::{
    code_block, truncate_for_field, truncate_for_message, truncate_to, FIELD_LIMIT,
    MESSAGE_LIMIT,
};
