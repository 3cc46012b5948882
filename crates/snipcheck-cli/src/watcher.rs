//! File watcher for detecting documentation changes.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify_debouncer_mini::{DebounceEventResult, new_debouncer, notify::RecursiveMode};
use tokio::sync::mpsc;

/// File change event.
#[derive(Debug, Clone)]
pub enum FileEvent {
    /// File was modified or recreated.
    Modified(PathBuf),
    /// File was removed.
    Removed(PathBuf),
}

/// Watches a fixed set of documents.
pub struct FileWatcher {
    /// Debouncer handle (kept alive to maintain watcher).
    _debouncer: notify_debouncer_mini::Debouncer<notify::RecommendedWatcher>,
    /// Receiver for file events.
    rx: mpsc::UnboundedReceiver<FileEvent>,
}

impl FileWatcher {
    /// Watch `documents`, which must exist.
    pub fn new(documents: &[PathBuf]) -> anyhow::Result<Self> {
        let targets = documents
            .iter()
            .map(|d| d.canonicalize())
            .collect::<std::io::Result<HashSet<PathBuf>>>()?;
        let directories: HashSet<PathBuf> = targets
            .iter()
            .map(|t| t.parent().unwrap_or(Path::new(".")).to_path_buf())
            .collect();

        let (tx, rx) = mpsc::unbounded_channel();

        let mut debouncer = new_debouncer(
            Duration::from_millis(200),
            move |result: DebounceEventResult| {
                let Ok(events) = result else {
                    return;
                };
                for event in events {
                    if !targets.contains(&event.path) {
                        continue;
                    }

                    let file_event = if event.path.exists() {
                        FileEvent::Modified(event.path.clone())
                    } else {
                        FileEvent::Removed(event.path.clone())
                    };

                    let _ = tx.send(file_event);
                }
            },
        )?;

        for directory in &directories {
            debouncer
                .watcher()
                .watch(directory, RecursiveMode::NonRecursive)?;
        }

        Ok(Self {
            _debouncer: debouncer,
            rx,
        })
    }

    /// Receive the next file event.
    pub async fn recv(&mut self) -> Option<FileEvent> {
        self.rx.recv().await
    }
}
