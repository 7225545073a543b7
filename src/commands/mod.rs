//! # Command System
//!
//! Registries, guarded dispatch, and remote registration for slash (/) and
//! prefix commands loaded from definition files.
//!
//! - **Version**: 3.0.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 3.0.0: Commands are definition files with hot reload; prefix commands return
//! - 2.1.0: Add modular handler infrastructure (handler trait, context, registry)
//! - 2.0.0: Remove bang commands, slash-only command system
//! - 1.0.0: Initial reorganization with modular command structure

pub mod context;
pub mod dispatcher;
pub mod handler;
pub mod prefix;
pub mod registry;
pub mod slash;

pub use crate::command_handler::CommandHandler;

pub use context::{Invocation, Trigger};
pub use dispatcher::{DispatchOutcome, Dispatcher, Rejection};
pub use handler::{Definition, Guarded};
pub use registry::{LoadSummary, Registry};
pub use slash::{CommandApi, CommandRegistrar, SerenityCommandApi};
