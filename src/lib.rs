// Core layer - configuration, error logs, and Discord size helpers
pub mod core;

// Features layer - definitions, actions, cooldowns, events, hot reload
pub mod features;

// Application layer
pub mod command_handler;
pub mod commands;

pub use core::Config;

pub use commands::{
    CommandHandler, CommandRegistrar, DispatchOutcome, Dispatcher, Invocation, Registry,
};
pub use features::{
    ActionRunner, AuditSink, CooldownLedger, EventBus, EventDefinition, HotReloader,
    PrefixCommand, SlashCommand,
};
