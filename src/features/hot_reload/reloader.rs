//! Hot reloader
//!
//! Applies settled watch events to the registries. Slash command changes also
//! schedule a debounced push to Discord; removals unregister right away.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Removed slash commands are unregistered individually
//! - 1.0.0: Initial implementation

use anyhow::Result;
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::debounce::DelayedTask;
use super::watcher::{canonical_or_raw, FileWatcher, WatchEvent, WatchKind};
use crate::commands::registry::{LoadSummary, Registry};
use crate::commands::slash::CommandRegistrar;
use crate::features::definitions::{PrefixCommand, SlashCommand};
use crate::features::events::EventBus;

/// Which registry a watched root feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootKind {
    Slash,
    Prefix,
    Event,
}

/// Directories scanned for definitions
#[derive(Debug, Clone)]
pub struct DefinitionRoots {
    pub commands: PathBuf,
    pub messages: PathBuf,
    pub events: PathBuf,
}

impl DefinitionRoots {
    /// Canonicalise existing roots so they match watcher paths
    pub fn new(commands: &Path, messages: &Path, events: &Path) -> Self {
        Self {
            commands: canonical_or_raw(commands),
            messages: canonical_or_raw(messages),
            events: canonical_or_raw(events),
        }
    }

    pub fn all(&self) -> Vec<PathBuf> {
        vec![
            self.commands.clone(),
            self.messages.clone(),
            self.events.clone(),
        ]
    }

    /// The deepest root containing `path`
    pub fn classify(&self, path: &Path) -> Option<RootKind> {
        [
            (&self.commands, RootKind::Slash),
            (&self.messages, RootKind::Prefix),
            (&self.events, RootKind::Event),
        ]
        .into_iter()
        .filter(|(root, _)| path.starts_with(root))
        .max_by_key(|(root, _)| root.components().count())
        .map(|(_, kind)| kind)
    }
}

pub struct HotReloader {
    roots: DefinitionRoots,
    slash: Arc<Registry<SlashCommand>>,
    prefix: Arc<Registry<PrefixCommand>>,
    events: Arc<EventBus>,
    registrar: Arc<CommandRegistrar>,
    sync_task: DelayedTask,
}

impl HotReloader {
    pub fn new(
        roots: DefinitionRoots,
        slash: Arc<Registry<SlashCommand>>,
        prefix: Arc<Registry<PrefixCommand>>,
        events: Arc<EventBus>,
        registrar: Arc<CommandRegistrar>,
        register_debounce: Duration,
    ) -> Self {
        Self {
            roots,
            slash,
            prefix,
            events,
            registrar,
            sync_task: DelayedTask::new(register_debounce),
        }
    }

    /// Initial load of every watched root, so startup and reloads see the same files
    pub fn load_all(&self) -> LoadSummary {
        let mut total = LoadSummary::default();
        for summary in [
            self.slash.load_dir(&self.roots.commands),
            self.prefix.load_dir(&self.roots.messages),
            self.events.registry().load_dir(&self.roots.events),
        ] {
            total.loaded += summary.loaded;
            total.failed += summary.failed;
        }
        total
    }

    /// Apply one watch event
    pub async fn handle(&self, event: WatchEvent) {
        let Some(kind) = self.roots.classify(&event.path) else {
            warn!("⚠️ Ignoring change outside definition roots: {}", event.path.display());
            return;
        };
        let path = event.path.as_path();

        match kind {
            RootKind::Slash => self.handle_slash(event.kind, path).await,
            RootKind::Prefix => reload(self.prefix.as_ref(), event.kind, path),
            RootKind::Event => reload(self.events.registry(), event.kind, path),
        }
    }

    async fn handle_slash(&self, kind: WatchKind, path: &Path) {
        if kind == WatchKind::Removed {
            if let Some(removed) = self.slash.unload_file(path) {
                info!("🗑️ Command file removed: {}", path.display());
                if let Err(e) = self.registrar.unregister(&removed.name).await {
                    error!("❌ Failed to unregister command \"{}\": {:#}", removed.name, e);
                }
            }
        } else {
            reload(self.slash.as_ref(), kind, path);
        }
        self.schedule_sync();
    }

    /// Push the slash registry once edits settle
    pub fn schedule_sync(&self) {
        let registry = Arc::clone(&self.slash);
        let registrar = Arc::clone(&self.registrar);
        self.sync_task.schedule(move || async move {
            if let Err(e) = registrar.sync(&registry).await {
                error!("❌ Failed to reload application (/) commands: {:#}", e);
            }
        });
    }

    /// Consume watch events until the channel closes
    pub fn run(self: Arc<Self>, mut rx: mpsc::UnboundedReceiver<WatchEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                self.handle(event).await;
            }
            info!("File watcher closed, hot reload stopped");
        })
    }

    /// Watch every root and apply changes as they settle
    pub fn start(self: Arc<Self>, quiet: Duration) -> Result<(FileWatcher, JoinHandle<()>)> {
        let (watcher, rx) = FileWatcher::start(&self.roots.all(), quiet)?;
        let task = self.run(rx);
        Ok((watcher, task))
    }
}

/// Added loads, Changed unloads then loads, Removed unloads
fn reload<D: crate::commands::handler::Definition>(
    registry: &Registry<D>,
    kind: WatchKind,
    path: &Path,
) {
    match kind {
        WatchKind::Added => {
            info!("📄 New {} file: {}", D::KIND, path.display());
            let _ = registry.load_file(path);
        }
        WatchKind::Changed => {
            info!("🔄 {} file changed: {}", D::KIND, path.display());
            registry.unload_file(path);
            let _ = registry.load_file(path);
        }
        WatchKind::Removed => {
            info!("🗑️ {} file removed: {}", D::KIND, path.display());
            registry.unload_file(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::slash::api::testing::MockCommandApi;
    use crate::core::ErrorLog;
    use crate::features::actions::ActionRunner;
    use std::fs;
    use tokio::time::sleep;

    struct Fixture {
        _dir: tempfile::TempDir,
        roots: DefinitionRoots,
        api: Arc<MockCommandApi>,
        reloader: HotReloader,
    }

    fn fixture(debounce: Duration) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        for sub in ["commands", "messages", "events"] {
            fs::create_dir_all(dir.path().join(sub)).unwrap();
        }
        let roots = DefinitionRoots::new(
            &dir.path().join("commands"),
            &dir.path().join("messages"),
            &dir.path().join("events"),
        );
        let api = Arc::new(MockCommandApi::default());
        let reloader = HotReloader::new(
            roots.clone(),
            Arc::new(Registry::new()),
            Arc::new(Registry::new()),
            Arc::new(EventBus::new(ActionRunner::default(), ErrorLog::disabled())),
            Arc::new(CommandRegistrar::new(api.clone(), Vec::new())),
            debounce,
        );
        Fixture {
            _dir: dir,
            roots,
            api,
            reloader,
        }
    }

    fn slash_yaml(name: &str) -> String {
        format!("name: {name}\naction: {{ type: reply, content: hi }}\n")
    }

    fn event(kind: WatchKind, path: &Path) -> WatchEvent {
        WatchEvent {
            kind,
            path: path.to_path_buf(),
        }
    }

    #[test]
    fn test_classify_picks_deepest_root() {
        let roots = DefinitionRoots {
            commands: PathBuf::from("/bot/src"),
            messages: PathBuf::from("/bot/src/messages"),
            events: PathBuf::from("/bot/events"),
        };
        assert_eq!(
            roots.classify(Path::new("/bot/src/messages/ping.yaml")),
            Some(RootKind::Prefix)
        );
        assert_eq!(roots.classify(Path::new("/bot/src/ping.yaml")), Some(RootKind::Slash));
        assert_eq!(roots.classify(Path::new("/bot/events/ready.yaml")), Some(RootKind::Event));
        assert_eq!(roots.classify(Path::new("/elsewhere/x.yaml")), None);
    }

    #[test]
    fn test_load_all_covers_every_watched_root() {
        let fx = fixture(Duration::from_millis(50));
        fs::write(fx.roots.commands.join("ping.yaml"), slash_yaml("ping")).unwrap();
        fs::write(
            fx.roots.messages.join("hello.yaml"),
            "name: hello\naction: { type: reply, content: Hi }\n",
        )
        .unwrap();
        fs::write(
            fx.roots.events.join("ready.yaml"),
            "name: ready\naction: { type: send, channel_id: 1, content: up }\n",
        )
        .unwrap();
        fs::write(fx.roots.events.join("broken.yaml"), "name: [unclosed").unwrap();

        let summary = fx.reloader.load_all();

        assert_eq!(summary, LoadSummary { loaded: 3, failed: 1 });
        assert!(fx.reloader.slash.contains("ping"));
        assert!(fx.reloader.prefix.contains("hello"));
        assert_eq!(fx.reloader.events.registry().len(), 1);
    }

    #[tokio::test]
    async fn test_rapid_changes_register_once_with_final_content() {
        let fx = fixture(Duration::from_millis(100));
        let path = fx.roots.commands.join("greet.yaml");

        fs::write(&path, slash_yaml("hello")).unwrap();
        fx.reloader.handle(event(WatchKind::Added, &path)).await;
        fs::write(&path, slash_yaml("howdy")).unwrap();
        fx.reloader.handle(event(WatchKind::Changed, &path)).await;

        sleep(Duration::from_millis(300)).await;

        assert_eq!(
            *fx.api.global_pushes.lock().unwrap(),
            vec![vec!["howdy".to_string()]]
        );
    }

    #[tokio::test]
    async fn test_removed_slash_command_is_unregistered_once() {
        let fx = fixture(Duration::from_millis(50));
        let path = fx.roots.commands.join("ping.yaml");
        fs::write(&path, slash_yaml("ping")).unwrap();
        fx.reloader.handle(event(WatchKind::Added, &path)).await;
        sleep(Duration::from_millis(150)).await;
        assert_eq!(fx.api.global_names(), vec!["ping"]);

        fs::remove_file(&path).unwrap();
        fx.reloader.handle(event(WatchKind::Removed, &path)).await;
        // A second removal of the same file is a no-op
        fx.reloader.handle(event(WatchKind::Removed, &path)).await;

        assert_eq!(fx.api.deleted.lock().unwrap().len(), 1);
        assert!(fx.reloader.slash.is_empty());
    }

    #[tokio::test]
    async fn test_broken_edit_removes_command_until_fixed() {
        let fx = fixture(Duration::from_millis(50));
        let path = fx.roots.commands.join("ping.yaml");
        fs::write(&path, slash_yaml("ping")).unwrap();
        fx.reloader.handle(event(WatchKind::Added, &path)).await;

        fs::write(&path, "name: [unclosed").unwrap();
        fx.reloader.handle(event(WatchKind::Changed, &path)).await;
        assert!(fx.reloader.slash.is_empty());

        fs::write(&path, slash_yaml("ping")).unwrap();
        fx.reloader.handle(event(WatchKind::Changed, &path)).await;
        assert!(fx.reloader.slash.contains("ping"));
    }

    #[tokio::test]
    async fn test_prefix_and_event_changes_skip_remote_sync() {
        let fx = fixture(Duration::from_millis(50));
        let prefix = fx.roots.messages.join("ping.yaml");
        fs::write(&prefix, "name: ping\naliases: [p]\naction: { type: reply, content: Pong }\n")
            .unwrap();
        let listener = fx.roots.events.join("ready.yaml");
        fs::write(&listener, "name: ready\naction: { type: send, channel_id: 1, content: up }\n")
            .unwrap();

        fx.reloader.handle(event(WatchKind::Added, &prefix)).await;
        fx.reloader.handle(event(WatchKind::Added, &listener)).await;
        sleep(Duration::from_millis(150)).await;

        assert!(fx.reloader.prefix.resolve("p").is_some());
        assert_eq!(fx.reloader.events.registry().len(), 1);
        assert!(fx.api.global_pushes.lock().unwrap().is_empty());

        fx.reloader.handle(event(WatchKind::Removed, &prefix)).await;
        assert!(fx.reloader.prefix.is_empty());
    }
}
