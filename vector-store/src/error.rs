use thiserror::Error;

/// Errors that can occur in the vector store
#[derive(Debug, Error)]
pub enum VectorStoreError {
    /// Repository identifier is not registered in the store
    #[error("Unknown repository: {0}")]
    UnknownRepository(String),

    /// An embedding's width does not match the store's configured dimension.
    /// This is an invariant violation (index-time and query-time vectors
    /// must come from the same model version); it is reported, not coerced.
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A second file summary was inserted for a (repository, file path)
    /// pair that already has one
    #[error("Duplicate file summary for path: {path}")]
    DuplicateSummary { path: String },

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Persistence (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
