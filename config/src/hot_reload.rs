//! # Configuration Root Watching
//!
//! Watches the fragment root for changes so cached resolutions can be
//! dropped before their TTL runs out.

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc::{self, Receiver};
use tracing::{debug, info, warn};

/// Change notification for the fragment root.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigRootEvent {
    /// The watcher is registered; later edits will be reported
    Ready,

    /// A fragment file or level directory was created or modified
    Changed(PathBuf),

    /// A fragment file or level directory was removed
    Removed(PathBuf),
}

impl ConfigRootEvent {
    /// Whether cached resolutions may now be stale.
    #[must_use]
    pub fn invalidates(&self) -> bool {
        !matches!(self, ConfigRootEvent::Ready)
    }

    fn from_notify(event: Event) -> Option<Self> {
        let path = event.paths.into_iter().next()?;
        match event.kind {
            EventKind::Create(_) | EventKind::Modify(_) => Some(ConfigRootEvent::Changed(path)),
            EventKind::Remove(_) => Some(ConfigRootEvent::Removed(path)),
            _ => None,
        }
    }
}

/// Watch the fragment root recursively and emit [`ConfigRootEvent`]s.
///
/// Setup failures are returned directly. The watcher lives until the
/// returned receiver is dropped.
///
/// ## Usage
/// ```rust,no_run
/// use config::watch_config_root;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut rx = watch_config_root(std::path::Path::new("./config"))?;
///     while let Some(event) = rx.recv().await {
///         if event.invalidates() {
///             println!("fragments changed: {:?}", event);
///         }
///     }
///     Ok(())
/// }
/// ```
pub fn watch_config_root(root: &Path) -> notify::Result<Receiver<ConfigRootEvent>> {
    if !root.is_dir() {
        return Err(notify::Error::path_not_found().add_path(root.to_path_buf()));
    }

    let (tx, rx) = mpsc::channel(100);
    let notify_tx = tx.clone();
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Some(root_event) = ConfigRootEvent::from_notify(event) {
                    debug!(event = ?root_event, "Fragment root changed");
                    let _ = notify_tx.blocking_send(root_event);
                }
            }
            Err(e) => warn!(error = %e, "Watch error"),
        },
        notify::Config::default(),
    )?;
    watcher.watch(root, RecursiveMode::Recursive)?;
    info!(root = %root.display(), "Watching config root");
    let _ = tx.try_send(ConfigRootEvent::Ready);

    let root = root.to_path_buf();
    tokio::spawn(async move {
        tx.closed().await;
        drop(watcher);
        debug!(root = %root.display(), "Receiver dropped, config root watcher stopped");
    });

    Ok(rx)
}
