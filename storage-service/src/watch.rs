// SPDX-License-Identifier: GPL-3.0-only

//! `notify` watchers feeding raw file events to the shaper.

use std::path::PathBuf;

use notify::event::{AccessKind, AccessMode, ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use storage_types::{FileEvent, FileEventKind};
use tokio::sync::mpsc;
use tracing::{info, warn};

pub type RawEvents = mpsc::UnboundedReceiver<notify::Result<Event>>;

/// Watch every path in `paths`. Paths that cannot be watched are logged and
/// skipped. The watchers stop when the returned values are dropped.
pub fn watch_paths(paths: &[PathBuf]) -> (Vec<RecommendedWatcher>, RawEvents) {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let mut watchers = Vec::with_capacity(paths.len());

    for path in paths {
        let tx = events_tx.clone();
        let watcher = notify::recommended_watcher(move |result| {
            // unbounded: never blocks the notify thread
            let _ = tx.send(result);
        });

        let mut watcher = match watcher {
            Ok(watcher) => watcher,
            Err(e) => {
                warn!("Cannot create watcher for {}: {e}", path.display());
                continue;
            }
        };

        match watcher.watch(path, RecursiveMode::NonRecursive) {
            Ok(()) => {
                info!("Watching {}", path.display());
                watchers.push(watcher);
            }
            Err(e) => warn!("Cannot watch {}: {e}", path.display()),
        }
    }

    (watchers, events_rx)
}

/// Translate one `notify` event into raw file events.
pub fn file_events(event: Event) -> Vec<FileEvent> {
    let kind = match event.kind {
        EventKind::Create(_) => FileEventKind::Created,
        EventKind::Remove(_) => FileEventKind::Deleted,
        EventKind::Modify(ModifyKind::Metadata(_)) => FileEventKind::AttributeChanged,
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            return match event.paths.as_slice() {
                [from, to] => vec![FileEvent::moved(from.clone(), to.clone())],
                _ => Vec::new(),
            };
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => FileEventKind::Deleted,
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => FileEventKind::Created,
        EventKind::Modify(_) => FileEventKind::Changed,
        // A file closed after writing has finished changing
        EventKind::Access(AccessKind::Close(AccessMode::Write)) => FileEventKind::ChangesDoneHint,
        _ => return Vec::new(),
    };

    event
        .paths
        .into_iter()
        .map(|path| FileEvent::new(kind, path))
        .collect()
}
