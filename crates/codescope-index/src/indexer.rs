//! Indexing orchestrator: walk → chunk → embed → batch → store.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use codescope_embed::Embedder;
use codescope_store::{
    ChunkPayload, CollectionSpec, DistanceMetric, EnsureOutcome, VectorPoint, VectorStore,
};
use futures::{StreamExt, TryStreamExt};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::chunker::{Chunk, ChunkerConfig, chunk_text};
use crate::error::{IndexError, Result};
use crate::workspace::{SourceFile, SourceFilter, collect_source_files, relative_path};

pub const DEFAULT_BATCH_SIZE: usize = 200;

/// Indexer configuration.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    pub collection: String,
    /// Expected embedding size. When set, a provider with a different size is rejected.
    pub dimension: Option<u64>,
    pub distance: DistanceMetric,
    pub chunker: ChunkerConfig,
    pub batch_size: usize,
    /// Chunks of one file embedded concurrently. Results keep chunk order.
    pub embed_concurrency: usize,
    /// Replace a file's previous points during full runs instead of appending.
    pub reindex_files: bool,
    pub filter: SourceFilter,
}

impl IndexerConfig {
    #[must_use]
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            dimension: None,
            distance: DistanceMetric::default(),
            chunker: ChunkerConfig::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            embed_concurrency: 1,
            reindex_files: true,
            filter: SourceFilter::default(),
        }
    }

    fn validate(&self) -> Result<()> {
        self.chunker.stride()?;
        if self.collection.trim().is_empty() {
            return Err(IndexError::Config("collection name must not be empty".into()));
        }
        if self.batch_size == 0 {
            return Err(IndexError::Config("batch size must be greater than 0".into()));
        }
        if self.embed_concurrency == 0 {
            return Err(IndexError::Config(
                "embed concurrency must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

/// Summary of an indexing run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexReport {
    pub files_scanned: usize,
    pub files_indexed: usize,
    pub chunks_embedded: usize,
    pub points_upserted: usize,
    pub batches_flushed: usize,
    pub files_removed: usize,
    pub cancelled: bool,
    pub errors: Vec<String>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexProgress {
    pub done: usize,
    pub total: usize,
    pub file: String,
}

/// Receives one [`IndexProgress`] after each file of a full run.
pub type ProgressSink = Arc<dyn Fn(&IndexProgress) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub path: PathBuf,
}

/// Points waiting to be written, plus the files that already have points flushed in
/// this run.
struct Batch {
    points: Vec<VectorPoint>,
    replace_files: bool,
    flushed_files: HashSet<String>,
}

impl Batch {
    fn new(replace_files: bool) -> Self {
        Self {
            points: Vec::new(),
            replace_files,
            flushed_files: HashSet::new(),
        }
    }
}

/// Orchestrates code indexing over a workspace.
///
/// At most one run is in flight: a second full run fails with
/// [`IndexError::AlreadyRunning`], incremental updates wait their turn.
pub struct CodeIndexer {
    store: Arc<dyn VectorStore>,
    embedder: Arc<Embedder>,
    config: IndexerConfig,
    progress: Option<ProgressSink>,
    run_lock: tokio::sync::Mutex<()>,
}

impl std::fmt::Debug for CodeIndexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeIndexer")
            .field("config", &self.config)
            .field("embedder", &self.embedder)
            .field("progress", &self.progress.is_some())
            .finish_non_exhaustive()
    }
}

impl CodeIndexer {
    #[must_use]
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<Embedder>,
        config: IndexerConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            config,
            progress: None,
            run_lock: tokio::sync::Mutex::new(()),
        }
    }

    #[must_use]
    pub fn with_progress(mut self, sink: ProgressSink) -> Self {
        self.progress = Some(sink);
        self
    }

    #[must_use]
    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.run_lock.try_lock().is_err()
    }

    /// Index every eligible file under `root`.
    ///
    /// Cancellation is checked before each file. A cancelled run still writes the
    /// pending points of files that a flush already started on, discards the rest of
    /// its batch and returns `Ok` with `cancelled` set.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyRunning` if another run holds the lock, `Config` for invalid
    /// settings or a collection mismatch, `ProviderInit`/`Embedding` for provider
    /// failures, and `Store` if the vector store rejects a request. Batches flushed
    /// before the failure stay in the store.
    pub async fn index_workspace(
        &self,
        root: &Path,
        cancel: &CancellationToken,
    ) -> Result<IndexReport> {
        let Ok(_guard) = self.run_lock.try_lock() else {
            return Err(IndexError::AlreadyRunning);
        };
        self.config.validate()?;
        let start = Instant::now();
        let mut report = IndexReport::default();

        self.prepare_collection().await?;

        let files = collect_source_files(root, &self.config.filter)?;
        let total = files.len();
        tracing::info!(total, collection = %self.config.collection, "indexing started");

        let mut batch = Batch::new(self.config.reindex_files);
        for (i, file) in files.iter().enumerate() {
            if cancel.is_cancelled() {
                report.cancelled = true;
                let pending = batch.points.len();
                batch
                    .points
                    .retain(|p| batch.flushed_files.contains(&p.payload.file));
                tracing::info!(
                    progress = format_args!("{i}/{total}"),
                    discarded = pending - batch.points.len(),
                    "indexing cancelled"
                );
                break;
            }

            let chunks = self.index_file(file, &mut batch, &mut report).await?;
            tracing::info!(
                file = %file.rel_path,
                progress = format_args!("{}/{total}", i + 1),
                chunks,
            );
            if let Some(sink) = &self.progress {
                sink(&IndexProgress {
                    done: i + 1,
                    total,
                    file: file.rel_path.clone(),
                });
            }
        }

        self.flush(&mut batch, &mut report).await?;

        report.duration_ms = elapsed_ms(start);
        tracing::info!(
            files = report.files_indexed,
            points = report.points_upserted,
            errors = report.errors.len(),
            duration_ms = report.duration_ms,
            "indexing finished"
        );
        Ok(report)
    }

    /// Re-index `paths` (created or modified files), replacing their previous points.
    ///
    /// Paths may be absolute or relative to `root`; paths outside `root` and ineligible
    /// files are ignored.
    ///
    /// # Errors
    ///
    /// Same as [`CodeIndexer::index_workspace`], except that it waits for a running
    /// indexing run instead of failing.
    pub async fn update_files(&self, root: &Path, paths: &[PathBuf]) -> Result<IndexReport> {
        let _guard = self.run_lock.lock().await;
        self.config.validate()?;
        let start = Instant::now();
        let mut report = IndexReport::default();

        let files = self.eligible_files(root, paths);
        if files.is_empty() {
            return Ok(report);
        }
        self.prepare_collection().await?;

        let mut batch = Batch::new(true);
        for file in &files {
            let chunks = self.index_file(file, &mut batch, &mut report).await?;
            tracing::info!(file = %file.rel_path, chunks, "reindexing file");
        }
        self.flush(&mut batch, &mut report).await?;

        report.duration_ms = elapsed_ms(start);
        Ok(report)
    }

    /// Delete every point of `paths` (removed files).
    ///
    /// # Errors
    ///
    /// Returns `Store` if the vector store rejects a delete.
    pub async fn remove_files(&self, root: &Path, paths: &[PathBuf]) -> Result<IndexReport> {
        let _guard = self.run_lock.lock().await;
        let start = Instant::now();
        let mut report = IndexReport::default();

        let files = self.eligible_files(root, paths);
        if files.is_empty() {
            return Ok(report);
        }
        if self
            .store
            .collection_info(&self.config.collection)
            .await?
            .is_none()
        {
            tracing::debug!(
                collection = %self.config.collection,
                "collection missing, nothing to remove"
            );
            return Ok(report);
        }

        for file in &files {
            self.store
                .delete_by_file(&self.config.collection, &file.rel_path)
                .await?;
            report.files_removed += 1;
            tracing::info!(file = %file.rel_path, "removed from index");
        }

        report.duration_ms = elapsed_ms(start);
        Ok(report)
    }

    /// Apply one file-system change to the index.
    ///
    /// # Errors
    ///
    /// See [`CodeIndexer::update_files`] and [`CodeIndexer::remove_files`].
    pub async fn handle_event(&self, root: &Path, event: &ChangeEvent) -> Result<IndexReport> {
        let paths = std::slice::from_ref(&event.path);
        match event.kind {
            ChangeKind::Created | ChangeKind::Modified => self.update_files(root, paths).await,
            ChangeKind::Deleted => self.remove_files(root, paths).await,
        }
    }

    /// Delete the whole collection.
    ///
    /// # Errors
    ///
    /// Returns `Store` if the vector store rejects the request.
    pub async fn drop_collection(&self) -> Result<()> {
        let _guard = self.run_lock.lock().await;
        self.store.delete_collection(&self.config.collection).await?;
        tracing::info!(collection = %self.config.collection, "collection dropped");
        Ok(())
    }

    async fn prepare_collection(&self) -> Result<CollectionSpec> {
        let dimension = self
            .embedder
            .init()
            .await
            .map_err(IndexError::ProviderInit)?;
        let dimension = dimension as u64;

        if let Some(declared) = self.config.dimension
            && declared != dimension
        {
            return Err(IndexError::Config(format!(
                "configured dimension {declared} does not match the {} provider output ({dimension})",
                self.embedder.name()
            )));
        }

        let spec = CollectionSpec::new(&self.config.collection, dimension, self.config.distance);
        match self.store.ensure_collection(&spec).await? {
            EnsureOutcome::Created => {
                tracing::info!(collection = %spec.name, dimension, "collection created");
            }
            EnsureOutcome::Existing => {
                tracing::debug!(collection = %spec.name, "using existing collection");
            }
        }
        Ok(spec)
    }

    fn eligible_files(&self, root: &Path, paths: &[PathBuf]) -> Vec<SourceFile> {
        let mut seen = HashSet::new();
        paths
            .iter()
            .filter_map(|path| {
                let abs = if path.is_absolute() {
                    path.clone()
                } else {
                    root.join(path)
                };
                let Some(rel_path) = relative_path(root, &abs) else {
                    tracing::debug!(path = %path.display(), "ignoring path outside the workspace");
                    return None;
                };
                if !self.config.filter.is_eligible(&rel_path) {
                    tracing::debug!(file = %rel_path, "ignoring ineligible file");
                    return None;
                }
                seen.insert(rel_path.clone()).then_some(SourceFile {
                    path: abs,
                    rel_path,
                })
            })
            .collect()
    }

    /// Chunk and embed one file into `batch`, flushing whenever it fills up.
    /// Returns the number of chunks embedded; unreadable files are recorded and skipped.
    async fn index_file(
        &self,
        file: &SourceFile,
        batch: &mut Batch,
        report: &mut IndexReport,
    ) -> Result<usize> {
        report.files_scanned += 1;
        let text = match tokio::fs::read_to_string(&file.path).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(file = %file.rel_path, "skipping unreadable file: {e}");
                report.errors.push(format!("{}: {e}", file.rel_path));
                return Ok(0);
            }
        };

        let chunks: Vec<Chunk> = chunk_text(&text, &self.config.chunker)?.collect();
        let vectors = self.embed_chunks(&chunks).await?;
        let count = chunks.len();
        report.chunks_embedded += count;
        report.files_indexed += 1;

        for (chunk, vector) in chunks.into_iter().zip(vectors) {
            batch.points.push(VectorPoint::new(
                vector,
                ChunkPayload {
                    file: file.rel_path.clone(),
                    start: chunk.start_line,
                    text: chunk.text,
                },
            ));
            if batch.points.len() >= self.config.batch_size {
                self.flush(batch, report).await?;
            }
        }
        Ok(count)
    }

    async fn embed_chunks(&self, chunks: &[Chunk]) -> Result<Vec<Vec<f32>>> {
        if self.config.embed_concurrency <= 1 {
            let mut vectors = Vec::with_capacity(chunks.len());
            for chunk in chunks {
                vectors.push(
                    self.embedder
                        .embed(&chunk.text)
                        .await
                        .map_err(IndexError::Embedding)?,
                );
            }
            return Ok(vectors);
        }

        // The stream owns its inputs so the caller's future stays `Send`.
        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
        let requests = texts.into_iter().map(|text| {
            let embedder = Arc::clone(&self.embedder);
            async move { embedder.embed(&text).await }
        });
        futures::stream::iter(requests)
            .buffered(self.config.embed_concurrency)
            .map_err(IndexError::Embedding)
            .try_collect()
            .await
    }

    async fn flush(&self, batch: &mut Batch, report: &mut IndexReport) -> Result<()> {
        if batch.points.is_empty() {
            return Ok(());
        }
        let points = std::mem::take(&mut batch.points);

        for point in &points {
            if batch.flushed_files.contains(&point.payload.file) {
                continue;
            }
            if batch.replace_files {
                self.store
                    .delete_by_file(&self.config.collection, &point.payload.file)
                    .await?;
            }
            batch.flushed_files.insert(point.payload.file.clone());
        }

        let count = points.len();
        self.store.upsert(&self.config.collection, points).await?;
        report.points_upserted += count;
        report.batches_flushed += 1;
        tracing::debug!(collection = %self.config.collection, points = count, "flushed batch");
        Ok(())
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis().try_into().unwrap_or(u64::MAX)
}
