use repogpt_embeddings::EmbeddingError;
use repogpt_vector_store::VectorStoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RetrievalError {
    /// Repository identifier is not registered; rejected before any index
    /// access
    #[error("Unknown repository: {0}")]
    UnknownRepository(String),

    #[error("Query too short: minimum {min} characters, got {actual}")]
    QueryTooShort { min: usize, actual: usize },

    #[error("Invalid retrieval configuration: {0}")]
    InvalidConfig(String),

    /// The embedding provider failed; fatal to the call since there is no
    /// meaningful vector search without a query vector
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// The embedding provider did not answer within the configured timeout
    #[error("Embedding provider timed out after {timeout_ms}ms")]
    EmbeddingTimeout { timeout_ms: u64 },

    #[error("Vector store error: {0}")]
    Store(#[from] VectorStoreError),
}

impl RetrievalError {
    /// Whether the caller may retry the identical request. Upstream
    /// unavailability is transient; input and invariant errors are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RetrievalError::Embedding(_) | RetrievalError::EmbeddingTimeout { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, RetrievalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(
            RetrievalError::EmbeddingTimeout { timeout_ms: 10 }.is_retryable()
        );
        assert!(
            RetrievalError::Embedding(EmbeddingError::Other("down".into())).is_retryable()
        );
        assert!(!RetrievalError::UnknownRepository("x".into()).is_retryable());
        assert!(
            !RetrievalError::QueryTooShort { min: 2, actual: 0 }.is_retryable()
        );
        assert!(
            !RetrievalError::Store(VectorStoreError::DimensionMismatch {
                expected: 384,
                actual: 768
            })
            .is_retryable()
        );
    }
}
