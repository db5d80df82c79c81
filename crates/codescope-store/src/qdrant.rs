//! [`VectorStore`] backed by a Qdrant server over gRPC.

use std::collections::HashMap;

use qdrant_client::Qdrant;
use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::vectors_config::Config as VectorsConfigKind;
use qdrant_client::qdrant::{
    Condition, CreateCollectionBuilder, CreateFieldIndexCollectionBuilder, DeletePointsBuilder,
    Distance, FieldType, Filter, PointStruct, ScoredPoint, SearchPointsBuilder,
    UpsertPointsBuilder, Value, VectorParamsBuilder,
};

use crate::error::VectorStoreError;
use crate::types::{ChunkPayload, CollectionSpec, DistanceMetric, ScoredVectorPoint, VectorPoint};
use crate::vector_store::{BoxFuture, VectorStore};

pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";

const FILE_FIELD: &str = "file";

#[derive(Clone)]
pub struct QdrantStore {
    client: Qdrant,
    url: String,
}

impl std::fmt::Debug for QdrantStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QdrantStore")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl QdrantStore {
    /// Build a client for `url`. No request is sent until the first operation.
    ///
    /// # Errors
    ///
    /// Returns `VectorStoreError::Connection` if the client cannot be built from `url`.
    pub fn new(url: &str, api_key: Option<String>) -> Result<Self, VectorStoreError> {
        let client = Qdrant::from_url(url)
            .api_key(api_key)
            .build()
            .map_err(|e| VectorStoreError::Connection(e.to_string()))?;
        Ok(Self {
            client,
            url: url.to_owned(),
        })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

fn to_qdrant_distance(metric: DistanceMetric) -> Distance {
    match metric {
        DistanceMetric::Cosine => Distance::Cosine,
        DistanceMetric::Dot => Distance::Dot,
        DistanceMetric::Euclidean => Distance::Euclid,
    }
}

fn from_qdrant_distance(raw: i32) -> Result<DistanceMetric, VectorStoreError> {
    match Distance::try_from(raw) {
        Ok(Distance::Cosine) => Ok(DistanceMetric::Cosine),
        Ok(Distance::Dot) => Ok(DistanceMetric::Dot),
        Ok(Distance::Euclid) => Ok(DistanceMetric::Euclidean),
        Ok(other) => Err(VectorStoreError::Collection(format!(
            "unsupported distance {}",
            other.as_str_name()
        ))),
        Err(_) => Err(VectorStoreError::Collection(format!(
            "unknown distance value {raw}"
        ))),
    }
}

fn payload_to_qdrant(payload: &ChunkPayload) -> Result<HashMap<String, Value>, VectorStoreError> {
    let json =
        serde_json::to_value(payload).map_err(|e| VectorStoreError::Serialization(e.to_string()))?;
    serde_json::from_value(json).map_err(|e| VectorStoreError::Serialization(e.to_string()))
}

fn payload_from_qdrant(payload: &HashMap<String, Value>) -> Option<ChunkPayload> {
    let get_str = |key: &str| payload.get(key).and_then(Value::as_str).cloned();
    let start = payload
        .get("start")
        .and_then(Value::as_integer)
        .and_then(|v| usize::try_from(v).ok())?;
    Some(ChunkPayload {
        file: get_str(FILE_FIELD)?,
        start,
        text: get_str("text")?,
    })
}

fn scored_point_to_vector(point: ScoredPoint) -> Option<ScoredVectorPoint> {
    let Some(payload) = payload_from_qdrant(&point.payload) else {
        tracing::warn!(id = ?point.id, "skipping search hit with malformed payload");
        return None;
    };
    let id = match point.id.and_then(|pid| pid.point_id_options) {
        Some(PointIdOptions::Uuid(u)) => u,
        Some(PointIdOptions::Num(n)) => n.to_string(),
        None => String::new(),
    };
    Some(ScoredVectorPoint {
        id,
        score: point.score,
        payload,
    })
}

impl VectorStore for QdrantStore {
    fn collection_info(
        &self,
        collection: &str,
    ) -> BoxFuture<'_, Result<Option<CollectionSpec>, VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let exists = self
                .client
                .collection_exists(&collection)
                .await
                .map_err(|e| VectorStoreError::Connection(e.to_string()))?;
            if !exists {
                return Ok(None);
            }
            let info = self
                .client
                .collection_info(&collection)
                .await
                .map_err(|e| VectorStoreError::Collection(e.to_string()))?;
            let params = info
                .result
                .and_then(|r| r.config)
                .and_then(|c| c.params)
                .and_then(|p| p.vectors_config)
                .and_then(|v| v.config);
            match params {
                Some(VectorsConfigKind::Params(p)) => Ok(Some(CollectionSpec {
                    name: collection,
                    dimension: p.size,
                    distance: from_qdrant_distance(p.distance)?,
                })),
                Some(VectorsConfigKind::ParamsMap(_)) => Err(VectorStoreError::Collection(
                    format!("collection {collection} uses named vectors"),
                )),
                None => Err(VectorStoreError::Collection(format!(
                    "collection {collection} reported no vector parameters"
                ))),
            }
        })
    }

    fn create_collection(
        &self,
        spec: &CollectionSpec,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let spec = spec.clone();
        Box::pin(async move {
            self.client
                .create_collection(
                    CreateCollectionBuilder::new(&spec.name).vectors_config(
                        VectorParamsBuilder::new(spec.dimension, to_qdrant_distance(spec.distance)),
                    ),
                )
                .await
                .map_err(|e| VectorStoreError::Collection(e.to_string()))?;

            self.client
                .create_field_index(CreateFieldIndexCollectionBuilder::new(
                    &spec.name,
                    FILE_FIELD,
                    FieldType::Keyword,
                ))
                .await
                .map_err(|e| VectorStoreError::Collection(e.to_string()))?;
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
            let qdrant_points = points
                .into_iter()
                .map(|p| {
                    let payload = payload_to_qdrant(&p.payload)?;
                    Ok(PointStruct::new(p.id, p.vector, payload))
                })
                .collect::<Result<Vec<_>, VectorStoreError>>()?;
            let count = qdrant_points.len();
            self.client
                .upsert_points(UpsertPointsBuilder::new(&collection, qdrant_points).wait(true))
                .await
                .map_err(|e| VectorStoreError::Upsert(e.to_string()))?;
            tracing::debug!(collection = %collection, points = count, "upserted points");
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
            let results = self
                .client
                .search_points(
                    SearchPointsBuilder::new(&collection, vector, top_k).with_payload(true),
                )
                .await
                .map_err(|e| VectorStoreError::Search(e.to_string()))?;
            Ok(results
                .result
                .into_iter()
                .filter_map(scored_point_to_vector)
                .collect())
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
            self.client
                .delete_points(
                    DeletePointsBuilder::new(&collection)
                        .points(Filter::must([Condition::matches(FILE_FIELD, file.clone())]))
                        .wait(true),
                )
                .await
                .map_err(|e| VectorStoreError::Delete(e.to_string()))?;
            tracing::debug!(collection = %collection, file = %file, "deleted points for file");
            Ok(())
        })
    }

    fn delete_collection(&self, collection: &str) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            self.client
                .delete_collection(&collection)
                .await
                .map_err(|e| VectorStoreError::Collection(e.to_string()))?;
            Ok(())
        })
    }
}
