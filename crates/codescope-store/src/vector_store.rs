use std::future::Future;
use std::pin::Pin;

use crate::error::VectorStoreError;
use crate::types::{CollectionSpec, EnsureOutcome, ScoredVectorPoint, VectorPoint};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait VectorStore: Send + Sync {
    /// Shape of an existing collection, `None` if it does not exist.
    fn collection_info(
        &self,
        collection: &str,
    ) -> BoxFuture<'_, Result<Option<CollectionSpec>, VectorStoreError>>;

    fn create_collection(
        &self,
        spec: &CollectionSpec,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>>;

    /// Create the collection if it is missing, otherwise verify it matches `spec`.
    ///
    /// An existing collection is never altered: a different dimension or metric is
    /// reported as [`VectorStoreError::DimensionMismatch`] or
    /// [`VectorStoreError::DistanceMismatch`].
    fn ensure_collection(
        &self,
        spec: &CollectionSpec,
    ) -> BoxFuture<'_, Result<EnsureOutcome, VectorStoreError>> {
        let spec = spec.clone();
        Box::pin(async move {
            let Some(existing) = self.collection_info(&spec.name).await? else {
                self.create_collection(&spec).await?;
                tracing::info!(
                    collection = %spec.name,
                    dimension = spec.dimension,
                    distance = %spec.distance,
                    "created collection"
                );
                return Ok(EnsureOutcome::Created);
            };
            if existing.dimension != spec.dimension {
                return Err(VectorStoreError::DimensionMismatch {
                    collection: spec.name,
                    declared: spec.dimension,
                    existing: existing.dimension,
                });
            }
            if existing.distance != spec.distance {
                return Err(VectorStoreError::DistanceMismatch {
                    collection: spec.name,
                    declared: spec.distance,
                    existing: existing.distance,
                });
            }
            tracing::debug!(collection = %spec.name, "collection already exists");
            Ok(EnsureOutcome::Existing)
        })
    }

    /// Write all `points` in one acknowledged request. An empty list is a no-op.
    fn upsert(
        &self,
        collection: &str,
        points: Vec<VectorPoint>,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>>;

    /// Up to `top_k` nearest points, best first.
    fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        top_k: u64,
    ) -> BoxFuture<'_, Result<Vec<ScoredVectorPoint>, VectorStoreError>>;

    /// Remove every point whose payload `file` equals `file`.
    fn delete_by_file(
        &self,
        collection: &str,
        file: &str,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>>;

    fn delete_collection(&self, collection: &str) -> BoxFuture<'_, Result<(), VectorStoreError>>;
}
