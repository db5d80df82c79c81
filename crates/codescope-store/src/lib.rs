//! Vector store abstraction for code chunks, with Qdrant and in-memory backends.

pub mod error;
pub mod in_memory;
pub mod qdrant;
pub mod types;
pub mod vector_store;

pub use error::VectorStoreError;
pub use in_memory::InMemoryVectorStore;
pub use qdrant::QdrantStore;
pub use types::{
    ChunkPayload, CollectionSpec, DistanceMetric, EnsureOutcome, ScoredVectorPoint, VectorPoint,
};
pub use vector_store::{BoxFuture, VectorStore};
