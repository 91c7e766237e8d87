//! Watch mode: rebuild when the static files or the snapshot change.
//!
//! ```text
//! notify events ──► ChangeFilter ──► debounce ──► rebuild(changed paths)
//!                   │ drops access events, generated declaration files,
//!                   │ temp files and files whose bytes did not change
//! ```
//!
//! Events arriving within the debounce window of each other are folded into
//! one rebuild. Rebuilds run on the watching thread, so a rebuild never
//! overlaps the previous one; events queued meanwhile start the next.

use crate::hash_cache::HashCache;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;
use thiserror::Error;

/// Files the build itself writes into watched directories.
const GENERATED: &[&str] = &["Enums.d.ts", "DeepsightPlugCategorisation.d.ts"];

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("File watcher error: {0}")]
    Notify(#[from] notify::Error),
}

fn is_generated(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    GENERATED.contains(&name) || name.ends_with(".tmp") || name.ends_with('~')
}

/// Decides which event paths are real changes.
#[derive(Debug, Default)]
pub struct ChangeFilter {
    hashes: HashCache,
}

impl ChangeFilter {
    /// Paths of `event` worth rebuilding for. A path that no longer exists
    /// counts as changed.
    pub fn changed_paths(&mut self, event: &Event) -> Vec<PathBuf> {
        if matches!(event.kind, EventKind::Access(_)) {
            return Vec::new();
        }
        event
            .paths
            .iter()
            .filter(|path| !is_generated(path))
            .filter(|path| !path.is_dir())
            .filter(|path| match self.hashes.file_changed(path) {
                Ok(changed) => changed,
                Err(_) => !path.exists(),
            })
            .cloned()
            .collect()
    }
}

/// Watch `paths` recursively and call `rebuild` after each quiet period.
///
/// Blocks until the watcher shuts down.
pub fn watch(
    paths: &[PathBuf],
    debounce: Duration,
    mut rebuild: impl FnMut(&[PathBuf]),
) -> Result<(), WatchError> {
    let (tx, rx) = mpsc::channel::<notify::Result<Event>>();
    let mut watcher = notify::recommended_watcher(tx)?;
    for path in paths {
        if path.exists() {
            watcher.watch(path, RecursiveMode::Recursive)?;
            log::info!("Watching {}", path.display());
        } else {
            log::warn!("Not watching {}, it does not exist", path.display());
        }
    }

    let mut filter = ChangeFilter::default();
    let mut changed: Vec<PathBuf> = Vec::new();
    loop {
        // block until something happens, then drain until quiet
        let received = if changed.is_empty() {
            rx.recv().map_err(|_| RecvTimeoutError::Disconnected)
        } else {
            rx.recv_timeout(debounce)
        };

        match received {
            Ok(Ok(event)) => changed.extend(filter.changed_paths(&event)),
            Ok(Err(error)) => log::warn!("File watcher error: {error}"),
            Err(RecvTimeoutError::Timeout) => {
                changed.sort();
                changed.dedup();
                for path in &changed {
                    log::info!("Detected file change: {}", path.display());
                }
                rebuild(&changed);
                changed.clear();
            }
            Err(RecvTimeoutError::Disconnected) => return Ok(()),
        }
    }
}
