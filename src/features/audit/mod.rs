//! # Feature: Command Audit
//!
//! Records every successful command invocation. Records always go to the log and,
//! when a command-log channel is configured, are posted there as an embed.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: true
//!
//! ## Changelog
//! - 1.0.0: Initial release with log and channel sinks

pub mod sink;

pub use sink::{AuditRecord, AuditSink, ChannelAuditSink, LogAuditSink};
