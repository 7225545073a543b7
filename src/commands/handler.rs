//! Definition traits
//!
//! - **Version**: 2.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 2.0.0: Handlers are loaded from files instead of compiled in
//! - 1.0.0: Initial implementation for modular command handling

use anyhow::Result;
use serde::de::DeserializeOwned;
use std::path::Path;

use crate::features::definitions::{Action, Policy};

/// A unit of behaviour loaded from one definition file
///
/// Implementors are plain data parsed from YAML. The registry keys each value by
/// `name()` and, for text commands, also by every entry of `aliases()`.
///
/// # Example
///
/// ```ignore
/// let registry: Registry<SlashCommand> = Registry::new();
/// registry.load_dir(Path::new("src/commands"));
///
/// if let Some(command) = registry.get("ping") {
///     dispatcher.dispatch(command, &invocation, &responder).await;
/// }
/// ```
pub trait Definition: DeserializeOwned + Send + Sync + 'static {
    /// Human label used in log lines ("command", "event", ...)
    const KIND: &'static str;

    /// Name as written in the file
    fn name(&self) -> &str;

    /// Registry key; the name unless several files may share one
    fn key(&self) -> &str {
        self.name()
    }

    /// Told which file the definition came from, before validation
    fn set_source(&mut self, _path: &Path) {}

    /// Alternate keys, already normalised
    fn aliases(&self) -> &[String] {
        &[]
    }

    /// Canonicalise names after parsing, before validation
    fn normalize(&mut self) {}

    /// Reject definitions that parse but cannot be used
    fn validate(&self) -> Result<()>;
}

/// A definition that runs through the dispatcher's guard chain
pub trait Guarded: Definition {
    fn policy(&self) -> &Policy;

    fn action(&self) -> &Action;
}
