use crate::error::EmbeddingError;
use crate::provider::Reranker;
use async_trait::async_trait;
use fastembed::{RerankInitOptions, RerankerModel, TextRerank};
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Configuration for the cross-encoder reranking service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankConfig {
    /// Model to use for pairwise scoring
    pub model: RerankModelType,

    /// Maximum batch size for pair scoring
    pub batch_size: usize,

    /// Show download progress when downloading models
    pub show_download_progress: bool,
}

impl Default for RerankConfig {
    fn default() -> Self {
        Self {
            model: RerankModelType::BgeRerankerBase,
            batch_size: 32,
            show_download_progress: false,
        }
    }
}

/// Supported cross-encoder models
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum RerankModelType {
    /// BGE-reranker-base (default)
    BgeRerankerBase,
    /// JinaAI reranker v1 turbo (lighter, faster)
    JinaRerankerV1TurboEn,
}

impl RerankModelType {
    fn to_fastembed_model(self) -> RerankerModel {
        match self {
            RerankModelType::BgeRerankerBase => RerankerModel::BGERerankerBase,
            RerankModelType::JinaRerankerV1TurboEn => RerankerModel::JINARerankerV1TurboEn,
        }
    }
}

/// Service scoring (query, passage) pairs with a local cross-encoder
pub struct RerankService {
    model: TextRerank,
    config: RerankConfig,
}

impl RerankService {
    /// Create a new reranking service with default configuration
    pub async fn new() -> Result<Self, EmbeddingError> {
        Self::with_config(RerankConfig::default()).await
    }

    /// Create a new reranking service with custom configuration
    pub async fn with_config(config: RerankConfig) -> Result<Self, EmbeddingError> {
        info!(
            "Initializing rerank service with model {:?}",
            config.model
        );

        let init_options = RerankInitOptions::new(config.model.to_fastembed_model())
            .with_show_download_progress(config.show_download_progress);

        let model = TextRerank::try_new(init_options).map_err(|e| {
            EmbeddingError::ModelInitialization(format!("Failed to initialize reranker: {e}"))
        })?;

        info!("Rerank service initialized successfully");

        Ok(Self { model, config })
    }

    /// Score each passage against the query, in input order
    pub fn score_pairs(&self, query: &str, passages: &[String]) -> Result<Vec<f32>, EmbeddingError> {
        if passages.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Scoring {} pairs for query '{query}'", passages.len());

        let documents: Vec<&str> = passages.iter().map(|p| p.as_str()).collect();

        // fastembed returns results sorted by score; restore input order via
        // the index each result carries.
        let ranked = self
            .model
            .rerank(query, documents, false, Some(self.config.batch_size))
            .map_err(|e| EmbeddingError::Scoring(e.to_string()))?;

        let mut scores = vec![0.0f32; passages.len()];
        for result in ranked {
            if let Some(slot) = scores.get_mut(result.index) {
                *slot = result.score;
            }
        }

        Ok(scores)
    }

    /// Get the configuration of this service
    pub fn config(&self) -> &RerankConfig {
        &self.config
    }
}

#[async_trait]
impl Reranker for RerankService {
    async fn score(&self, query: &str, passages: &[String]) -> Result<Vec<f32>, EmbeddingError> {
        self.score_pairs(query, passages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires reranker model download
    async fn test_score_pairs_order() {
        let service = RerankService::new().await.unwrap();

        let passages = vec![
            "fn connect_database() -> Connection".to_string(),
            "async fn authenticate_user(token: &str) -> Result<User>".to_string(),
        ];

        let scores = service.score_pairs("user authentication", &passages).unwrap();
        assert_eq!(scores.len(), passages.len());

        // The auth passage should outscore the database passage
        assert!(scores[1] > scores[0]);
    }

    #[tokio::test]
    #[ignore] // Requires reranker model download
    async fn test_empty_passages() {
        let service = RerankService::new().await.unwrap();
        let scores = service.score_pairs("query", &[]).unwrap();
        assert!(scores.is_empty());
    }
}
