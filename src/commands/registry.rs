//! Definition registry
//!
//! - **Version**: 2.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 2.1.0: Unload by source path so renamed definitions do not leak
//! - 2.0.0: Generic over definition kind, populated from disk
//! - 1.0.0: Initial implementation for handler dispatch

use anyhow::{anyhow, Context as _, Result};
use dashmap::DashMap;
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::handler::Definition;
use crate::features::definitions::{is_definition_file, is_ignored_path};

/// Outcome of scanning a directory tree
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    pub loaded: usize,
    pub failed: usize,
}

/// Registry mapping definition names to loaded definitions
///
/// Entries are replaced wholesale: a reload parses into a fresh value and swaps it
/// in, so readers holding an `Arc` from before keep a consistent old copy.
///
/// # Example
///
/// ```ignore
/// let registry: Registry<PrefixCommand> = Registry::new();
/// registry.load_dir(Path::new("src/messages"));
///
/// if let Some(command) = registry.resolve("p") {
///     // "p" may be an alias of "ping"
/// }
/// ```
pub struct Registry<D: Definition> {
    entries: DashMap<String, Arc<D>>,
    /// alias -> definition name
    aliases: DashMap<String, String>,
    /// source file -> definition name it produced
    sources: DashMap<PathBuf, String>,
}

impl<D: Definition> Registry<D> {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            aliases: DashMap::new(),
            sources: DashMap::new(),
        }
    }

    /// Parse, normalise, and validate a definition file without touching the registry
    pub fn parse_file(path: &Path) -> Result<D> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut definition: D = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        definition.normalize();
        definition.set_source(path);
        if definition.name().trim().is_empty() {
            return Err(anyhow!(
                "The {} file \"{}\" is missing a valid name property",
                D::KIND,
                path.display()
            ));
        }
        definition.validate()?;
        Ok(definition)
    }

    /// Load one file, replacing any entry with the same name
    ///
    /// Failures are logged once and leave the registry as it was.
    pub fn load_file(&self, path: &Path) -> Result<Arc<D>> {
        let definition = match Self::parse_file(path) {
            Ok(definition) => Arc::new(definition),
            Err(e) => {
                error!("❌ Failed to load {} from {}: {:#}", D::KIND, path.display(), e);
                return Err(e);
            }
        };
        let name = definition.key().to_string();

        // A file that used to declare another name must not leave that entry behind
        if let Some(previous) = self.sources.get(path).map(|n| n.value().clone()) {
            if previous != name {
                self.remove_entry(&previous);
            }
        }

        if let Some(owner) = self.source_of(&name) {
            if owner != path {
                warn!(
                    "⚠️ {} '{}' from {} replaces the one from {}",
                    D::KIND,
                    name,
                    path.display(),
                    owner.display()
                );
                self.sources.remove(&owner);
            }
        }

        self.remove_aliases_of(&name);
        for alias in definition.aliases() {
            if let Some(existing) = self.aliases.get(alias).map(|n| n.value().clone()) {
                if existing != name {
                    warn!("⚠️ Alias '{alias}' moves from '{existing}' to '{name}'");
                }
            }
            self.aliases.insert(alias.clone(), name.clone());
        }

        self.entries.insert(name.clone(), Arc::clone(&definition));
        self.sources.insert(path.to_path_buf(), name);
        info!(
            "✅ Loaded {} '{}' from {}",
            D::KIND,
            definition.name(),
            path.display()
        );
        Ok(definition)
    }

    /// Recursively load every definition file under `root`
    pub fn load_dir(&self, root: &Path) -> LoadSummary {
        let mut summary = LoadSummary::default();
        for path in definition_files(root) {
            match self.load_file(&path) {
                Ok(_) => summary.loaded += 1,
                Err(_) => summary.failed += 1,
            }
        }
        info!(
            "📄 {} {}(s) loaded from {} ({} failed)",
            summary.loaded,
            D::KIND,
            root.display(),
            summary.failed
        );
        summary
    }

    /// Remove whatever `path` loaded; falls back to the file stem as the name
    ///
    /// Returns the removed definition, or `None` (with a warning) when nothing
    /// was registered for that file.
    pub fn unload_file(&self, path: &Path) -> Option<Arc<D>> {
        let name = self
            .sources
            .remove(path)
            .map(|(_, name)| name)
            .or_else(|| {
                path.file_stem()
                    .map(|stem| stem.to_string_lossy().to_string())
            })?;

        // Only drop the entry if no other file has since claimed the name
        if self.source_of(&name).is_some() {
            warn!(
                "⚠️ {} '{}' is now provided by another file, keeping it",
                D::KIND,
                name
            );
            return None;
        }

        match self.remove_entry(&name) {
            Some(definition) => {
                info!("🗑️ Unloaded {} '{}'", D::KIND, name);
                Some(definition)
            }
            None => {
                warn!("⚠️ {} '{}' not found in registry", D::KIND, name);
                None
            }
        }
    }

    /// Get a definition by exact name
    pub fn get(&self, name: &str) -> Option<Arc<D>> {
        self.entries.get(name).map(|e| Arc::clone(e.value()))
    }

    /// Get a definition by name, then by alias
    pub fn resolve(&self, trigger: &str) -> Option<Arc<D>> {
        self.get(trigger).or_else(|| {
            let name = self.aliases.get(trigger).map(|n| n.value().clone())?;
            self.get(&name)
        })
    }

    /// Check if a definition is registered
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Snapshot of all definitions, sorted by name
    pub fn list(&self) -> Vec<Arc<D>> {
        let mut all: Vec<Arc<D>> = self.entries.iter().map(|e| Arc::clone(e.value())).collect();
        all.sort_by(|a, b| a.name().cmp(b.name()).then_with(|| a.key().cmp(b.key())));
        all
    }

    /// All registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Names and aliases, for suggestions
    pub fn triggers(&self) -> Vec<String> {
        let mut triggers = self.names();
        triggers.extend(self.aliases.iter().map(|a| a.key().clone()));
        triggers
    }

    /// Number of registered definitions
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn source_of(&self, name: &str) -> Option<PathBuf> {
        self.sources
            .iter()
            .find(|s| s.value() == name)
            .map(|s| s.key().clone())
    }

    fn remove_entry(&self, name: &str) -> Option<Arc<D>> {
        self.remove_aliases_of(name);
        self.entries.remove(name).map(|(_, definition)| definition)
    }

    fn remove_aliases_of(&self, name: &str) {
        self.aliases.retain(|_, target| target != name);
    }
}

impl<D: Definition> Default for Registry<D> {
    fn default() -> Self {
        Self::new()
    }
}

/// Every definition file under `root`, recursively; missing roots yield nothing
pub fn definition_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("⚠️ Cannot read {}: {}", dir.display(), e);
                continue;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if is_ignored_path(root, &path) {
                continue;
            }
            if path.is_dir() {
                pending.push(path);
            } else if is_definition_file(&path) {
                files.push(path);
            }
        }
    }

    files
}
