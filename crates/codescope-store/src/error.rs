use crate::types::DistanceMetric;

#[derive(Debug, thiserror::Error)]
pub enum VectorStoreError {
    #[error("connection error: {0}")]
    Connection(String),
    #[error("collection error: {0}")]
    Collection(String),
    #[error("upsert error: {0}")]
    Upsert(String),
    #[error("search error: {0}")]
    Search(String),
    #[error("delete error: {0}")]
    Delete(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error(
        "collection {collection} has dimension {existing}, but {declared} was requested; \
         drop the collection or change the embedding model"
    )]
    DimensionMismatch {
        collection: String,
        declared: u64,
        existing: u64,
    },
    #[error(
        "collection {collection} uses {existing} distance, but {declared} was requested; \
         drop the collection or change the configured distance"
    )]
    DistanceMismatch {
        collection: String,
        declared: DistanceMetric,
        existing: DistanceMetric,
    },
}
