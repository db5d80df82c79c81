//! Semantic search over an indexed collection, one best hit per file.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use codescope_embed::Embedder;
use codescope_store::{ScoredVectorPoint, VectorStore};
use serde::Serialize;

use crate::error::{IndexError, Result};

pub const DEFAULT_SEARCH_LIMIT: usize = 12;

/// Retrieval configuration.
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    pub collection: String,
    /// Hits requested from the store before deduplication.
    pub limit: usize,
    /// Hits scoring below this are dropped. Ignored for distance metrics where lower
    /// is better.
    pub min_score: Option<f32>,
}

impl RetrievalConfig {
    #[must_use]
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            limit: DEFAULT_SEARCH_LIMIT,
            min_score: None,
        }
    }
}

/// One ranked match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub file: String,
    /// 1-based first line of the matching window.
    pub line: usize,
    pub content: String,
    pub score: f32,
}

impl SearchResult {
    #[must_use]
    pub fn open_target(&self) -> OpenTarget {
        OpenTarget {
            file: self.file.clone(),
            line: self.line,
        }
    }
}

/// Location a host editor can jump to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenTarget {
    pub file: String,
    pub line: usize,
}

impl OpenTarget {
    #[must_use]
    pub fn resolve(&self, root: &Path) -> PathBuf {
        root.join(&self.file)
    }
}

pub struct CodeRetriever {
    store: Arc<dyn VectorStore>,
    embedder: Arc<Embedder>,
    config: RetrievalConfig,
}

impl std::fmt::Debug for CodeRetriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeRetriever")
            .field("config", &self.config)
            .field("embedder", &self.embedder)
            .finish_non_exhaustive()
    }
}

impl CodeRetriever {
    #[must_use]
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<Embedder>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Search with the configured limit.
    ///
    /// # Errors
    ///
    /// See [`CodeRetriever::search_with_limit`].
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        self.search_with_limit(query, self.config.limit).await
    }

    /// Embed `query`, fetch up to `limit` hits and keep the best hit of each file.
    ///
    /// A blank query returns no results without contacting the provider or the store.
    ///
    /// # Errors
    ///
    /// Returns `Config` for a zero limit or a collection whose dimension differs from the
    /// provider output, `CollectionMissing` if nothing was indexed yet, `ProviderInit`
    /// or `Embedding` for provider failures and `Store` for search failures.
    pub async fn search_with_limit(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        if limit == 0 {
            return Err(IndexError::Config("search limit must be greater than 0".into()));
        }

        let dimension = self
            .embedder
            .init()
            .await
            .map_err(IndexError::ProviderInit)?;
        let Some(spec) = self.store.collection_info(&self.config.collection).await? else {
            return Err(IndexError::CollectionMissing(self.config.collection.clone()));
        };
        if spec.dimension != dimension as u64 {
            return Err(IndexError::Config(format!(
                "collection {} has dimension {} but the {} provider produces {dimension}; reindex or change provider",
                spec.name,
                spec.dimension,
                self.embedder.name()
            )));
        }

        let vector = self
            .embedder
            .embed(query)
            .await
            .map_err(IndexError::Embedding)?;
        let hits = self
            .store
            .search(&self.config.collection, vector, limit as u64)
            .await?;
        let fetched = hits.len();

        let threshold = self
            .config
            .min_score
            .filter(|_| spec.distance.higher_is_better());
        let results = dedup_by_file(
            hits.into_iter()
                .filter(|hit| threshold.is_none_or(|min| hit.score >= min))
                .map(to_result),
        );

        tracing::debug!(
            collection = %self.config.collection,
            fetched,
            returned = results.len(),
            "search finished"
        );
        Ok(results)
    }
}

fn to_result(hit: ScoredVectorPoint) -> SearchResult {
    SearchResult {
        file: hit.payload.file,
        line: hit.payload.start,
        content: hit.payload.text,
        score: hit.score,
    }
}

/// Keep the first result of each file, preserving order.
pub fn dedup_by_file(results: impl IntoIterator<Item = SearchResult>) -> Vec<SearchResult> {
    let mut seen = HashSet::new();
    results
        .into_iter()
        .filter(|r| seen.insert(r.file.clone()))
        .collect()
}
