//! # RepoGPT Vector Store
//!
//! Similarity index and retrieval-side data model for ingested
//! repositories. Stores file summaries and code chunks with the embeddings
//! ingestion computed for them, and answers threshold/cap/scope
//! nearest-neighbor queries over either entity kind.
//!
//! The store never embeds anything itself: ingestion supplies vectors with
//! the records, and the retrieval engine supplies the query vector. Both are
//! validated against the configured dimension, since similarity between
//! vectors from different model versions is meaningless.
//!
//! ## Example
//!
//! ```no_run
//! use repogpt_vector_store::{RepositoryId, VectorStore};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = VectorStore::open(Path::new(".repogpt/store.json")).await?;
//!
//!     let repo = RepositoryId::new("my-repo");
//!     let query_vec = vec![0.0; 384]; // from the embedding provider
//!     let results = store.search_chunks(&repo, &query_vec, 0.25, 20, None).await?;
//!
//!     println!("Found {} similar chunks", results.len());
//!     Ok(())
//! }
//! ```

mod error;
mod records;
mod store;

pub use error::VectorStoreError;
pub use records::{
    ChunkId, ChunkKind, ChunkRecord, CodeChunk, DependencyKind, FileDependency, FileNode,
    FileNodeKind, FileSummary, Repository, RepositoryId, RepositoryStatus, SummaryRecord,
};
pub use store::{ChunkMatch, SummaryMatch, VectorStore, VectorStoreConfig};
