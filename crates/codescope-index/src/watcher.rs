use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::RecommendedWatcher;
use notify_debouncer_mini::{DebounceEventResult, DebouncedEventKind, Debouncer, new_debouncer};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::indexer::{ChangeEvent, ChangeKind, CodeIndexer};
use crate::workspace::{SourceFilter, relative_path};

const DEBOUNCE: Duration = Duration::from_secs(1);

/// Keeps a collection in sync with file changes under a workspace root.
///
/// [`IndexWatcher::stop`] waits for the change being applied to finish. Dropping the
/// value stops watching as well, without waiting.
pub struct IndexWatcher {
    root: PathBuf,
    debouncer: Option<Debouncer<RecommendedWatcher>>,
    shutdown: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl IndexWatcher {
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` cannot be resolved or the filesystem watcher cannot be
    /// initialized.
    pub fn start(root: &Path, indexer: Arc<CodeIndexer>) -> Result<Self> {
        let root = std::fs::canonicalize(root)?;
        let (event_tx, mut event_rx) = mpsc::channel::<ChangeEvent>(64);

        let filter = indexer.config().filter.clone();
        let watch_root = root.clone();
        let mut debouncer = new_debouncer(DEBOUNCE, move |events: DebounceEventResult| {
            let events = match events {
                Ok(events) => events,
                Err(e) => {
                    tracing::warn!("index watcher error: {e}");
                    return;
                }
            };

            let paths: HashSet<PathBuf> = events
                .into_iter()
                .filter(|e| e.kind == DebouncedEventKind::Any)
                .map(|e| e.path)
                .collect();

            for path in paths {
                if let Some(event) = classify(&watch_root, &filter, &path)
                    && event_tx.blocking_send(event).is_err()
                {
                    return;
                }
            }
        })?;

        debouncer
            .watcher()
            .watch(&root, notify::RecursiveMode::Recursive)?;
        tracing::info!(root = %root.display(), "watching for changes");

        let shutdown = CancellationToken::new();
        let task_shutdown = shutdown.clone();
        let task_root = root.clone();
        let handle = tokio::spawn(async move {
            loop {
                // Shutdown is only observed between events.
                let event = tokio::select! {
                    biased;
                    () = task_shutdown.cancelled() => break,
                    event = event_rx.recv() => match event {
                        Some(event) => event,
                        None => break,
                    },
                };
                match indexer.handle_event(&task_root, &event).await {
                    Ok(report) => tracing::debug!(
                        path = %event.path.display(),
                        kind = ?event.kind,
                        points = report.points_upserted,
                        removed = report.files_removed,
                        "change applied"
                    ),
                    Err(e) => {
                        tracing::warn!(
                            path = %event.path.display(),
                            "incremental update failed: {e}"
                        );
                    }
                }
            }
        });

        Ok(Self {
            root,
            debouncer: Some(debouncer),
            shutdown,
            handle: Some(handle),
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stop watching and wait until the in-flight change, if any, is fully applied.
    pub async fn stop(mut self) {
        self.shutdown.cancel();
        self.debouncer.take();
        if let Some(handle) = self.handle.take()
            && let Err(e) = handle.await
        {
            tracing::warn!("index watcher task failed: {e}");
        }
        tracing::info!(root = %self.root.display(), "stopped watching");
    }
}

impl Drop for IndexWatcher {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Map a changed path to an index event. Paths that are gone are deletions.
fn classify(root: &Path, filter: &SourceFilter, path: &Path) -> Option<ChangeEvent> {
    let rel_path = relative_path(root, path)?;
    if !filter.is_eligible(&rel_path) {
        return None;
    }
    let kind = if path.exists() {
        if path.is_dir() {
            return None;
        }
        ChangeKind::Modified
    } else {
        ChangeKind::Deleted
    };
    Some(ChangeEvent {
        kind,
        path: path.to_path_buf(),
    })
}
