//! File watcher
//!
//! Wraps a recursive `notify` watcher and turns bursts of raw filesystem events
//! into one `WatchEvent` per path once the path has been quiet for a while.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Removing a directory removes every definition under it
//! - 1.0.0: Initial implementation

use anyhow::{Context as _, Result};
use log::{debug, info, warn};
use notify::{Config as NotifyConfig, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::commands::registry::definition_files;
use crate::features::definitions::{is_definition_file, is_ignored_path};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchKind {
    Added,
    Changed,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub kind: WatchKind,
    pub path: PathBuf,
}

impl WatchEvent {
    fn new(kind: WatchKind, path: PathBuf) -> Self {
        Self { kind, path }
    }
}

/// Collapses raw events per path and classifies them once they settle
///
/// Classification looks at the filesystem when the quiet period ends, so a
/// create-then-write burst is one `Added` and a write-then-delete burst is one
/// `Removed`.
pub struct EventCoalescer {
    /// path -> time of its latest raw event
    pending: HashMap<PathBuf, Instant>,
    /// definition files believed to exist
    known: HashSet<PathBuf>,
    /// watched roots, for judging ignored directories below them
    roots: Vec<PathBuf>,
    quiet: Duration,
}

impl EventCoalescer {
    pub fn new(
        quiet: Duration,
        roots: Vec<PathBuf>,
        known: impl IntoIterator<Item = PathBuf>,
    ) -> Self {
        Self {
            pending: HashMap::new(),
            known: known.into_iter().collect(),
            roots,
            quiet,
        }
    }

    /// Note a raw event for `path`, restarting its quiet period
    pub fn observe(&mut self, path: PathBuf, now: Instant) {
        if self.is_ignored(&path) {
            return;
        }
        self.pending.insert(path, now);
    }

    fn is_ignored(&self, path: &Path) -> bool {
        let root = self
            .roots
            .iter()
            .filter(|root| path.starts_with(root))
            .max_by_key(|root| root.components().count());
        match root {
            Some(root) => is_ignored_path(root, path),
            None => true,
        }
    }

    /// When the earliest pending path becomes ready
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().min().map(|t| *t + self.quiet)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Classify every path that has been quiet long enough, sorted by path
    pub fn drain_ready(&mut self, now: Instant) -> Vec<WatchEvent> {
        let quiet = self.quiet;
        let mut ready: Vec<PathBuf> = self
            .pending
            .iter()
            .filter(|(_, seen)| now.duration_since(**seen) >= quiet)
            .map(|(path, _)| path.clone())
            .collect();
        ready.sort();

        let mut events = Vec::new();
        for path in ready {
            self.pending.remove(&path);
            self.classify(path, &mut events);
        }
        events
    }

    fn classify(&mut self, path: PathBuf, events: &mut Vec<WatchEvent>) {
        if path.is_dir() {
            // A directory moved in or created with files already inside
            for file in definition_files(&path) {
                self.classify_file(file, events);
            }
            return;
        }
        if path.exists() {
            if is_definition_file(&path) {
                self.classify_file(path, events);
            }
            return;
        }

        if self.known.remove(&path) {
            events.push(WatchEvent::new(WatchKind::Removed, path));
            return;
        }

        // A removed directory takes its known files with it
        let mut gone: Vec<PathBuf> = self
            .known
            .iter()
            .filter(|known| known.starts_with(&path))
            .cloned()
            .collect();
        gone.sort();
        for file in gone {
            self.known.remove(&file);
            events.push(WatchEvent::new(WatchKind::Removed, file));
        }
    }

    fn classify_file(&mut self, path: PathBuf, events: &mut Vec<WatchEvent>) {
        let kind = if self.known.insert(path.clone()) {
            WatchKind::Added
        } else {
            WatchKind::Changed
        };
        events.push(WatchEvent::new(kind, path));
    }
}

/// Keeps the OS watcher alive; dropping it stops the event stream
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    task: JoinHandle<()>,
}

impl FileWatcher {
    /// Watch `roots` recursively, emitting settled events on the returned channel
    ///
    /// Roots that do not exist are skipped with a warning.
    pub fn start(
        roots: &[PathBuf],
        quiet: Duration,
    ) -> Result<(Self, mpsc::UnboundedReceiver<WatchEvent>)> {
        let (raw_tx, mut raw_rx) = mpsc::unbounded_channel::<notify::Event>();
        let (tx, rx) = mpsc::unbounded_channel::<WatchEvent>();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<notify::Event>| match res {
                Ok(event) => {
                    let _ = raw_tx.send(event);
                }
                Err(e) => warn!("⚠️ File watcher error: {e}"),
            },
            NotifyConfig::default(),
        )
        .context("Failed to create file watcher")?;

        let mut known = Vec::new();
        let mut watched = Vec::new();
        for root in roots {
            if !root.is_dir() {
                warn!("⚠️ Not watching {}: directory does not exist", root.display());
                continue;
            }
            watcher
                .watch(root, RecursiveMode::Recursive)
                .with_context(|| format!("Failed to watch {}", root.display()))?;
            known.extend(definition_files(root));
            watched.push(root.clone());
            info!("👀 Watching {} for changes", root.display());
        }

        let mut coalescer = EventCoalescer::new(quiet, watched, known);
        let task = tokio::spawn(async move {
            // Far-future placeholder until something is pending
            let settle = tokio::time::sleep(Duration::from_secs(3600));
            tokio::pin!(settle);

            loop {
                tokio::select! {
                    raw = raw_rx.recv() => {
                        let Some(raw) = raw else { break };
                        let now = Instant::now();
                        for path in raw.paths {
                            coalescer.observe(path, now);
                        }
                        if let Some(deadline) = coalescer.next_deadline() {
                            settle.as_mut().reset(deadline);
                        }
                    }
                    _ = &mut settle, if coalescer.has_pending() => {
                        for event in coalescer.drain_ready(Instant::now()) {
                            debug!("File {:?}: {}", event.kind, event.path.display());
                            if tx.send(event).is_err() {
                                return;
                            }
                        }
                        if let Some(deadline) = coalescer.next_deadline() {
                            settle.as_mut().reset(deadline);
                        }
                    }
                }
            }
        });

        Ok((
            Self {
                _watcher: watcher,
                task,
            },
            rx,
        ))
    }
}

impl Drop for FileWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Canonical form of `path` when it exists, otherwise the path as given
pub fn canonical_or_raw(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
