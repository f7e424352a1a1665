use crate::fusion::Weights;
use serde::{Deserialize, Serialize};

/// How candidate scores are produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Cosine similarity only
    VectorOnly,
    /// Weighted fusion of cosine and trigram similarity
    Hybrid,
}

/// Configuration for the two-stage retrieval engine.
///
/// Passed explicitly into each search rather than held as shared mutable
/// state, so concurrent callers with different tuning never interfere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Search mode for both stages
    #[serde(default = "default_mode")]
    pub mode: SearchMode,

    /// Fusion weights (hybrid mode only)
    #[serde(default)]
    pub weights: Weights,

    /// Minimum score a file summary must exceed in stage 1
    #[serde(default = "default_file_threshold")]
    pub file_threshold: f32,

    /// Maximum number of candidate files from stage 1
    #[serde(default = "default_file_limit")]
    pub file_limit: usize,

    /// Minimum score a chunk must exceed in stage 2
    #[serde(default = "default_chunk_threshold")]
    pub chunk_threshold: f32,

    /// Maximum number of chunks from stage 2
    #[serde(default = "default_chunk_limit")]
    pub chunk_limit: usize,

    /// Final cap applied after the reranking stage; `None` keeps every
    /// stage-2 result
    #[serde(default = "default_rerank_limit")]
    pub rerank_limit: Option<usize>,

    /// Passage text is truncated to this many characters before cross-encoder
    /// scoring
    #[serde(default = "default_rerank_max_chars")]
    pub rerank_max_chars: usize,

    /// When stage 1 selects no files, search stage 2 unscoped instead of
    /// returning nothing
    #[serde(default = "default_true")]
    pub fallback_on_empty_files: bool,

    /// Queries shorter than this are rejected as input errors. The default
    /// of 0 lets even the empty query through (its keyword scores degenerate
    /// to 0; the vector score is whatever the provider embeds "" to).
    #[serde(default)]
    pub min_query_chars: usize,

    /// Timeout for the embedding provider call; expiry is a retryable error
    #[serde(default = "default_embed_timeout_ms")]
    pub embed_timeout_ms: u64,

    /// Enable caching of search results
    #[serde(default = "default_true")]
    pub enable_cache: bool,

    /// Cache size (number of searches to cache)
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,
}

fn default_mode() -> SearchMode {
    SearchMode::Hybrid
}

fn default_file_threshold() -> f32 {
    0.5
}

fn default_file_limit() -> usize {
    10
}

fn default_chunk_threshold() -> f32 {
    0.25
}

fn default_chunk_limit() -> usize {
    20
}

fn default_rerank_limit() -> Option<usize> {
    Some(15)
}

fn default_rerank_max_chars() -> usize {
    2000
}

fn default_true() -> bool {
    true
}

fn default_embed_timeout_ms() -> u64 {
    10_000
}

fn default_cache_size() -> usize {
    100
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            weights: Weights::default(),
            file_threshold: default_file_threshold(),
            file_limit: default_file_limit(),
            chunk_threshold: default_chunk_threshold(),
            chunk_limit: default_chunk_limit(),
            rerank_limit: default_rerank_limit(),
            rerank_max_chars: default_rerank_max_chars(),
            fallback_on_empty_files: true,
            min_query_chars: 0,
            embed_timeout_ms: default_embed_timeout_ms(),
            enable_cache: true,
            cache_size: default_cache_size(),
        }
    }
}

impl RetrievalConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("weights.vector", self.weights.vector),
            ("weights.keyword", self.weights.keyword),
            ("file_threshold", self.file_threshold),
            ("chunk_threshold", self.chunk_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) || !value.is_finite() {
                return Err(format!("{name} must be in [0.0, 1.0], got {value}"));
            }
        }

        if self.file_limit == 0 {
            return Err("file_limit must be > 0".to_string());
        }

        if self.chunk_limit == 0 {
            return Err("chunk_limit must be > 0".to_string());
        }

        if self.rerank_limit == Some(0) {
            return Err("rerank_limit must be > 0 when set".to_string());
        }

        if self.rerank_max_chars == 0 {
            return Err("rerank_max_chars must be > 0".to_string());
        }

        if self.embed_timeout_ms == 0 {
            return Err("embed_timeout_ms must be > 0".to_string());
        }

        if self.enable_cache && self.cache_size == 0 {
            return Err("cache_size must be > 0 when caching is enabled".to_string());
        }

        Ok(())
    }

    /// Create config for pure semantic search (no keyword fusion)
    pub fn vector_only() -> Self {
        Self {
            mode: SearchMode::VectorOnly,
            file_threshold: 0.15,
            chunk_threshold: 0.1,
            ..Default::default()
        }
    }

    /// Create config optimized for precision: stricter stage thresholds and
    /// a tighter final cap
    pub fn precise() -> Self {
        Self {
            file_threshold: 0.6,
            chunk_threshold: 0.4,
            rerank_limit: Some(10),
            ..Default::default()
        }
    }
}
