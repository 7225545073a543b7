//! # Feature: Cooldowns
//!
//! Per-user, per-command cooldowns keyed on (command name, user id). DashMap keeps
//! the ledger safe for concurrent dispatch; expired stamps are pruned periodically
//! so the ledger does not grow for the lifetime of the process.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.0.0: Fixed per-command cooldown replaces the sliding request window
//! - 1.1.0: Multi-bot support with composite keys
//! - 1.0.0: Initial release with per-user sliding window rate limiting

pub mod ledger;

pub use ledger::{spawn_prune_loop, CooldownLedger, PRUNE_INTERVAL};
