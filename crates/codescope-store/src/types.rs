use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Similarity metric a collection is created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    #[default]
    #[serde(alias = "Cosine")]
    Cosine,
    #[serde(alias = "Dot", alias = "dot-product")]
    Dot,
    #[serde(alias = "Euclid", alias = "euclid", alias = "Euclidean")]
    Euclidean,
}

impl DistanceMetric {
    /// Whether a larger score means a closer match.
    #[must_use]
    pub fn higher_is_better(self) -> bool {
        !matches!(self, Self::Euclidean)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
            Self::Dot => "dot",
            Self::Euclidean => "euclidean",
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistanceMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cosine" => Ok(Self::Cosine),
            "dot" | "dot-product" => Ok(Self::Dot),
            "euclid" | "euclidean" => Ok(Self::Euclidean),
            other => Err(format!("unknown distance metric: {other}")),
        }
    }
}

/// Declared shape of a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSpec {
    pub name: String,
    pub dimension: u64,
    pub distance: DistanceMetric,
}

impl CollectionSpec {
    #[must_use]
    pub fn new(name: impl Into<String>, dimension: u64, distance: DistanceMetric) -> Self {
        Self {
            name: name.into(),
            dimension,
            distance,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    Created,
    Existing,
}

/// Origin of an indexed chunk: workspace-relative path (`/` separated), 1-based start
/// line and the chunk text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkPayload {
    pub file: String,
    pub start: usize,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct VectorPoint {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: ChunkPayload,
}

impl VectorPoint {
    /// Build a point with a fresh UUID v4 id.
    #[must_use]
    pub fn new(vector: Vec<f32>, payload: ChunkPayload) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            vector,
            payload,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScoredVectorPoint {
    pub id: String,
    pub score: f32,
    pub payload: ChunkPayload,
}
