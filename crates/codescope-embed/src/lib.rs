//! Text embedding providers and the lifecycle wrapper the indexer talks to.

pub mod any;
#[cfg(feature = "candle")]
pub mod candle_provider;
pub mod config;
pub mod embedder;
pub mod error;
pub mod google;
pub mod http;
#[cfg(feature = "mock")]
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod provider;
pub(crate) mod retry;

pub use any::AnyEmbedder;
pub use config::{GoogleConfig, OpenAiConfig, ProviderConfig};
pub use embedder::Embedder;
pub use error::EmbedError;
pub use provider::EmbeddingProvider;
