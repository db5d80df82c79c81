use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::VectorStoreError;
use crate::types::{ChunkPayload, CollectionSpec, DistanceMetric, ScoredVectorPoint, VectorPoint};
use crate::vector_store::{BoxFuture, VectorStore};

struct StoredPoint {
    vector: Vec<f32>,
    payload: ChunkPayload,
}

struct InMemoryCollection {
    spec: CollectionSpec,
    // Insertion order keeps search tie-breaking deterministic.
    points: Vec<(String, StoredPoint)>,
}

/// Process-local [`VectorStore`] with the same observable semantics as Qdrant.
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, InMemoryCollection>>,
}

impl InMemoryVectorStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Copy of every point in `collection`, in insertion order.
    #[must_use]
    pub fn points(&self, collection: &str) -> Vec<VectorPoint> {
        let Ok(cols) = self.collections.read() else {
            return Vec::new();
        };
        cols.get(collection)
            .map(|col| {
                col.points
                    .iter()
                    .map(|(id, sp)| VectorPoint {
                        id: id.clone(),
                        vector: sp.vector.clone(),
                        payload: sp.payload.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of points in `collection` attributed to `file`.
    #[must_use]
    pub fn count_for_file(&self, collection: &str, file: &str) -> usize {
        self.points(collection)
            .iter()
            .filter(|p| p.payload.file == file)
            .count()
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryVectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryVectorStore")
            .finish_non_exhaustive()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot = dot_product(a, b);
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

fn score(metric: DistanceMetric, a: &[f32], b: &[f32]) -> f32 {
    match metric {
        DistanceMetric::Cosine => cosine_similarity(a, b),
        DistanceMetric::Dot => dot_product(a, b),
        DistanceMetric::Euclidean => euclidean_distance(a, b),
    }
}

impl VectorStore for InMemoryVectorStore {
    fn collection_info(
        &self,
        collection: &str,
    ) -> BoxFuture<'_, Result<Option<CollectionSpec>, VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let cols = self
                .collections
                .read()
                .map_err(|e| VectorStoreError::Collection(e.to_string()))?;
            Ok(cols.get(&collection).map(|c| c.spec.clone()))
        })
    }

    fn create_collection(
        &self,
        spec: &CollectionSpec,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let spec = spec.clone();
        Box::pin(async move {
            let mut cols = self
                .collections
                .write()
                .map_err(|e| VectorStoreError::Collection(e.to_string()))?;
            if cols.contains_key(&spec.name) {
                return Err(VectorStoreError::Collection(format!(
                    "collection {} already exists",
                    spec.name
                )));
            }
            cols.insert(
                spec.name.clone(),
                InMemoryCollection {
                    spec,
                    points: Vec::new(),
                },
            );
            Ok(())
        })
    }

    fn upsert(
        &self,
        collection: &str,
        points: Vec<VectorPoint>,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            if points.is_empty() {
                return Ok(());
            }
            let mut cols = self
                .collections
                .write()
                .map_err(|e| VectorStoreError::Upsert(e.to_string()))?;
            let col = cols.get_mut(&collection).ok_or_else(|| {
                VectorStoreError::Upsert(format!("collection {collection} not found"))
            })?;
            let expected = col.spec.dimension;
            if let Some(bad) = points
                .iter()
                .find(|p| p.vector.len() as u64 != expected)
            {
                return Err(VectorStoreError::Upsert(format!(
                    "wrong vector dimension for point {}: expected {expected}, got {}",
                    bad.id,
                    bad.vector.len()
                )));
            }
            for p in points {
                let stored = StoredPoint {
                    vector: p.vector,
                    payload: p.payload,
                };
                if let Some(slot) = col.points.iter_mut().find(|(id, _)| *id == p.id) {
                    slot.1 = stored;
                } else {
                    col.points.push((p.id, stored));
                }
            }
            Ok(())
        })
    }

    fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        top_k: u64,
    ) -> BoxFuture<'_, Result<Vec<ScoredVectorPoint>, VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let cols = self
                .collections
                .read()
                .map_err(|e| VectorStoreError::Search(e.to_string()))?;
            let col = cols.get(&collection).ok_or_else(|| {
                VectorStoreError::Search(format!("collection {collection} not found"))
            })?;
            if vector.len() as u64 != col.spec.dimension {
                return Err(VectorStoreError::Search(format!(
                    "wrong query dimension: expected {}, got {}",
                    col.spec.dimension,
                    vector.len()
                )));
            }

            let metric = col.spec.distance;
            let mut scored: Vec<ScoredVectorPoint> = col
                .points
                .iter()
                .map(|(id, sp)| ScoredVectorPoint {
                    id: id.clone(),
                    score: score(metric, &vector, &sp.vector),
                    payload: sp.payload.clone(),
                })
                .collect();

            // Stable sort: equal scores keep insertion order.
            scored.sort_by(|a, b| {
                let ord = b
                    .score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal);
                if metric.higher_is_better() {
                    ord
                } else {
                    ord.reverse()
                }
            });
            scored.truncate(usize::try_from(top_k).unwrap_or(usize::MAX));
            Ok(scored)
        })
    }

    fn delete_by_file(
        &self,
        collection: &str,
        file: &str,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        let file = file.to_owned();
        Box::pin(async move {
            let mut cols = self
                .collections
                .write()
                .map_err(|e| VectorStoreError::Delete(e.to_string()))?;
            let col = cols.get_mut(&collection).ok_or_else(|| {
                VectorStoreError::Delete(format!("collection {collection} not found"))
            })?;
            col.points.retain(|(_, sp)| sp.payload.file != file);
            Ok(())
        })
    }

    fn delete_collection(&self, collection: &str) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let mut cols = self
                .collections
                .write()
                .map_err(|e| VectorStoreError::Collection(e.to_string()))?;
            cols.remove(&collection);
            Ok(())
        })
    }
}
