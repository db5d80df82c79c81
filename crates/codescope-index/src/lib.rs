//! Line-window code indexing and semantic retrieval over a vector store.
//!
//! Source files are split into overlapping line windows, each window is embedded,
//! and the vectors are written to a collection together with their origin
//! (`file`, `start`, `text`). Queries are embedded the same way and answered with
//! the best window per file.

pub mod chunker;
pub mod error;
pub mod indexer;
pub mod retriever;
pub mod watcher;
pub mod workspace;

pub use chunker::{Chunk, ChunkerConfig, Chunks, chunk_text};
pub use error::{IndexError, Result};
pub use indexer::{
    ChangeEvent, ChangeKind, CodeIndexer, IndexProgress, IndexReport, IndexerConfig, ProgressSink,
};
pub use retriever::{CodeRetriever, OpenTarget, RetrievalConfig, SearchResult};
pub use watcher::IndexWatcher;
pub use workspace::{SourceFile, SourceFilter, collect_source_files};
