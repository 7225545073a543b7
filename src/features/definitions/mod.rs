//! # Feature: Definitions
//!
//! Declarative YAML definitions for slash commands, prefix commands, and event
//! listeners, plus the permission-name handling their policies rely on.
//!
//! - **Version**: 1.2.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.2.0: Exec actions can target a channel
//! - 1.1.0: Permission names validated at load time
//! - 1.0.0: Initial release

pub mod config;
pub mod permissions;

pub use config::{
    normalize_event_name, option_kind, Action, Choice, CommandOption, EventDefinition,
    ExecAction, Policy, PrefixCommand, SlashCommand, KNOWN_EVENTS,
};
pub use permissions::{canonical_permission, guild_permissions, missing_permissions};

use std::path::Path;

/// File extensions recognised as definition sources
pub const DEFINITION_EXTENSIONS: &[&str] = &["yaml", "yml"];

/// Directory names never scanned for definitions
pub const IGNORED_DIRS: &[&str] = &[".git", "node_modules", "target", "schemas"];

/// Whether `path` sits under an ignored directory (schemas, VCS, build output)
/// somewhere below `root`
///
/// Directories above `root` never count, so a project checked out under
/// `~/target/bot` still loads. Paths outside `root` are checked whole.
pub fn is_ignored_path(root: &Path, path: &Path) -> bool {
    path.strip_prefix(root).unwrap_or(path).components().any(|c| {
        let part = c.as_os_str().to_string_lossy();
        IGNORED_DIRS.contains(&part.as_ref())
    })
}

/// Whether a path names a loadable definition file (extension and not hidden)
pub fn is_definition_file(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .map(|n| n.to_string_lossy().starts_with('.'))
        .unwrap_or(true);

    !hidden
        && path
            .extension()
            .map(|ext| DEFINITION_EXTENSIONS.contains(&ext.to_string_lossy().as_ref()))
            .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_file_detection() {
        assert!(is_definition_file(Path::new("commands/ping.yaml")));
        assert!(is_definition_file(Path::new("commands/util/ping.yml")));
        assert!(!is_definition_file(Path::new("commands/ping.js")));
        assert!(!is_definition_file(Path::new("commands/.ping.yaml")));
        assert!(!is_definition_file(Path::new("commands/ping.yaml.swp")));
    }

    #[test]
    fn test_schema_subtree_is_ignored() {
        let root = Path::new("/bot/src");
        assert!(is_ignored_path(root, Path::new("/bot/src/schemas/nested/user.yaml")));
        assert!(is_ignored_path(root, Path::new("/bot/src/.git/HEAD")));
        assert!(!is_ignored_path(root, Path::new("/bot/src/commands/schema_tools.yaml")));
    }

    #[test]
    fn test_ignored_names_above_root_do_not_count() {
        let root = Path::new("/home/dev/target/schemas/bot/commands");
        assert!(!is_ignored_path(
            root,
            Path::new("/home/dev/target/schemas/bot/commands/ping.yaml")
        ));
        assert!(is_ignored_path(
            root,
            Path::new("/home/dev/target/schemas/bot/commands/target/ping.yaml")
        ));
    }
}
