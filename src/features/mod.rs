//! # Features Layer
//!
//! Each feature lives in its own module with a version header and changelog.
//!
//! - **Version**: 2.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 2.0.0: Definition-driven features replace the compiled-in ones
//! - 1.0.0: Initial feature split

pub mod actions;
pub mod audit;
pub mod cooldown;
pub mod definitions;
pub mod events;
pub mod hot_reload;

pub use actions::{ActionRunner, ExecRunner, Responder};
pub use audit::{AuditRecord, AuditSink, ChannelAuditSink, LogAuditSink};
pub use cooldown::CooldownLedger;
pub use definitions::{EventDefinition, PrefixCommand, SlashCommand};
pub use events::EventBus;
pub use hot_reload::{DefinitionRoots, HotReloader};
