use crate::DEFAULT_EMBEDDING_DIM;
use crate::error::EmbeddingError;
use crate::provider::EmbeddingProvider;
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Configuration for the embedding service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Model to use for embeddings
    pub model: EmbeddingModelType,

    /// Maximum batch size for embedding generation
    pub batch_size: usize,

    /// Show download progress when downloading models
    pub show_download_progress: bool,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: EmbeddingModelType::BgeSmallEnV15,
            batch_size: 32,
            show_download_progress: false,
        }
    }
}

/// Supported embedding models
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum EmbeddingModelType {
    /// BGE-small-en-v1.5 (default, 384 dimensions)
    BgeSmallEnV15,
    /// BGE-base-en-v1.5 (larger, 768 dimensions)
    BgeBaseEnV15,
}

impl EmbeddingModelType {
    fn to_fastembed_model(self) -> EmbeddingModel {
        match self {
            EmbeddingModelType::BgeSmallEnV15 => EmbeddingModel::BGESmallENV15,
            EmbeddingModelType::BgeBaseEnV15 => EmbeddingModel::BGEBaseENV15,
        }
    }

    /// Vector width produced by this model
    pub fn dimension(self) -> usize {
        match self {
            EmbeddingModelType::BgeSmallEnV15 => DEFAULT_EMBEDDING_DIM,
            EmbeddingModelType::BgeBaseEnV15 => 768,
        }
    }
}

/// Service for generating text embeddings
pub struct EmbeddingService {
    model: TextEmbedding,
    config: EmbeddingConfig,
}

impl EmbeddingService {
    /// Create a new embedding service with default configuration
    pub async fn new() -> Result<Self, EmbeddingError> {
        Self::with_config(EmbeddingConfig::default()).await
    }

    /// Create a new embedding service with custom configuration
    pub async fn with_config(config: EmbeddingConfig) -> Result<Self, EmbeddingError> {
        info!(
            "Initializing embedding service with model {:?} ({} dims)",
            config.model,
            config.model.dimension()
        );

        let init_options = InitOptions::new(config.model.to_fastembed_model())
            .with_show_download_progress(config.show_download_progress);

        let model = TextEmbedding::try_new(init_options).map_err(|e| {
            EmbeddingError::ModelInitialization(format!("Failed to initialize model: {e}"))
        })?;

        info!("Embedding service initialized successfully");

        Ok(Self { model, config })
    }

    /// Generate embeddings for a list of texts
    ///
    /// # Arguments
    ///
    /// * `texts` - Vector of texts to embed
    ///
    /// # Returns
    ///
    /// Vector of embedding vectors, one for each input text
    pub fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let text_refs: Vec<&str> = texts.iter().map(|s| s.as_str()).collect();

        let mut all_embeddings = Vec::with_capacity(texts.len());

        for chunk in text_refs.chunks(self.config.batch_size) {
            let batch_embeddings = self
                .model
                .embed(chunk.to_vec(), None)
                .map_err(|e| EmbeddingError::EmbeddingGeneration(e.to_string()))?;

            all_embeddings.extend(batch_embeddings);
        }

        debug!("Generated {} embeddings", all_embeddings.len());

        Ok(all_embeddings)
    }

    /// Generate a single embedding for a text
    pub fn embed_single(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut embeddings = self.embed_batch(vec![text.to_string()])?;
        embeddings
            .pop()
            .ok_or_else(|| EmbeddingError::EmbeddingGeneration("No embedding generated".into()))
    }

    /// Get the configuration of this service
    pub fn config(&self) -> &EmbeddingConfig {
        &self.config
    }
}

#[async_trait]
impl EmbeddingProvider for EmbeddingService {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.embed_batch(texts)
    }

    fn dimension(&self) -> usize {
        self.config.model.dimension()
    }
}
