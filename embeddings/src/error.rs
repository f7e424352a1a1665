use thiserror::Error;

/// Errors that can occur in the embedding and reranking services
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Failed to initialize a model
    #[error("Failed to initialize model: {0}")]
    ModelInitialization(String),

    /// Failed to generate embeddings
    #[error("Failed to generate embeddings: {0}")]
    EmbeddingGeneration(String),

    /// Failed to score query/passage pairs
    #[error("Failed to score pairs: {0}")]
    Scoring(String),

    /// Invalid input provided to a model service
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("Model service error: {0}")]
    Other(String),
}

impl From<fastembed::Error> for EmbeddingError {
    fn from(err: fastembed::Error) -> Self {
        EmbeddingError::EmbeddingGeneration(err.to_string())
    }
}
