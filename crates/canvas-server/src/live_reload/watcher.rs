//! Filesystem watcher feeding the reload hub.
//!
//! Watches the canonical canvas root recursively and reports qualifying
//! events to the hub. Changes under dotfiles or dependency/build
//! directories never trigger a reload.

use std::path::{Component, Path, PathBuf};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::broadcast::ReloadNotifier;

/// Directory names that never trigger reloads.
const IGNORED_DIRS: &[&str] = &["node_modules", "target"];

/// Recursive watcher over the canvas root.
pub(crate) struct CanvasWatcher {
    // Held to keep the OS watch alive; dropped on stop.
    _watcher: RecommendedWatcher,
    forward_task: JoinHandle<()>,
}

impl CanvasWatcher {
    /// Start watching `root` (must be canonical) and forward qualifying
    /// events to the hub.
    pub(crate) fn start(root: &Path, notifier: ReloadNotifier) -> Result<Self, notify::Error> {
        let (tx, mut rx) = mpsc::channel::<Event>(100);

        // The notify callback runs on the watcher's own thread.
        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            if let Ok(event) = res {
                let _ = tx.blocking_send(event);
            }
        })?;
        watcher.watch(root, RecursiveMode::Recursive)?;

        let root = root.to_path_buf();
        let forward_task = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if event_qualifies(&event, &root) {
                    tracing::debug!(paths = ?event.paths, kind = ?event.kind, "canvas change");
                    notifier.notify();
                }
            }
        });

        Ok(Self {
            _watcher: watcher,
            forward_task,
        })
    }

    /// Stop forwarding events. Dropping the watcher ends the OS watch.
    pub(crate) fn stop(&self) {
        self.forward_task.abort();
    }
}

/// Whether an event should reset the reload timer.
fn event_qualifies(event: &Event, root: &Path) -> bool {
    if !matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) {
        return false;
    }
    event.paths.iter().any(|path| path_qualifies(root, path))
}

/// Whether a changed path should trigger a reload.
fn path_qualifies(root: &Path, path: &Path) -> bool {
    let Ok(relative) = path.strip_prefix(root) else {
        return false;
    };
    !relative.components().any(|component| match component {
        Component::Normal(name) => {
            let name = name.to_string_lossy();
            name.starts_with('.') || IGNORED_DIRS.contains(&name.as_ref())
        }
        _ => false,
    })
}
