use crate::error::EmbeddingError;
use async_trait::async_trait;

/// Boundary trait for anything that can map free text to fixed-width vectors.
///
/// Implementations may run a local ONNX model or call out to a remote
/// service; either way the call is treated as blocking by nature, so callers
/// are expected to apply their own timeout and treat a timeout as retryable.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts, one vector per input, in input order.
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Width of the vectors this provider produces. Index-time and
    /// query-time vectors must agree on this or similarity is meaningless.
    fn dimension(&self) -> usize;

    /// Embed a single text.
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.embed(vec![text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| EmbeddingError::EmbeddingGeneration("No embedding returned".into()))
    }
}

/// Boundary trait for cross-encoder relevance scoring.
///
/// A cross-encoder jointly encodes the query and each passage, which is more
/// precise than comparing independently produced embeddings and much more
/// expensive per pair. Callers only hand it already-narrowed candidate lists.
#[async_trait]
pub trait Reranker: Send + Sync {
    /// Score each (query, passage) pair. Returns one score per passage, in
    /// input order. Higher is more relevant; the scale is model-defined.
    async fn score(&self, query: &str, passages: &[String]) -> Result<Vec<f32>, EmbeddingError>;
}
