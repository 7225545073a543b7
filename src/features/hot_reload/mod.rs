//! # Feature: Hot Reload
//!
//! Watches the definition directories and keeps the registries in step with the
//! files on disk. Slash command changes are pushed to Discord in one batch after
//! edits settle, so saving a file several times registers once.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Directory removals and individual slash unregistration
//! - 1.0.0: Initial release

pub mod debounce;
pub mod reloader;
pub mod watcher;

pub use debounce::DelayedTask;
pub use reloader::{DefinitionRoots, HotReloader, RootKind};
pub use watcher::{canonical_or_raw, EventCoalescer, FileWatcher, WatchEvent, WatchKind};
