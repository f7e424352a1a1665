//! # RepoGPT Embeddings
//!
//! Model services for the retrieval engine: text embedding generation and
//! cross-encoder pair scoring, both running locally via fastembed/ONNX.
//!
//! The [`EmbeddingProvider`] and [`Reranker`] traits are the boundary the
//! retrieval engine programs against; [`EmbeddingService`] and
//! [`RerankService`] are the shipped implementations. Tests substitute
//! deterministic stubs behind the same traits.
//!
//! ## Example
//!
//! ```no_run
//! use repogpt_embeddings::EmbeddingService;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let service = EmbeddingService::new().await?;
//!     let texts = vec!["fn hello() { println!(\"Hello\"); }".to_string()];
//!     let embeddings = service.embed_batch(texts)?;
//!     println!("Generated {} embeddings", embeddings.len());
//!     Ok(())
//! }
//! ```

mod error;
mod provider;
mod rerank;
mod service;

pub use error::EmbeddingError;
pub use provider::EmbeddingProvider;
pub use provider::Reranker;
pub use rerank::RerankConfig;
pub use rerank::RerankModelType;
pub use rerank::RerankService;
pub use service::EmbeddingConfig;
pub use service::EmbeddingModelType;
pub use service::EmbeddingService;

/// Default embedding dimension for BGE-small-en-v1.5
pub const DEFAULT_EMBEDDING_DIM: usize = 384;
