//! Weighted linear fusion of vector and keyword scores.
//!
//! Additive linear fusion is deliberate: operators can shift the weights
//! without retraining anything, and every returned score decomposes into
//! its two inputs for observability.

use serde::{Deserialize, Serialize};

/// Relative weight of the two score sources. Conventionally the weights sum
/// to 1, but this is not required.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    /// Weight of the vector (semantic) score
    #[serde(default = "default_vector_weight")]
    pub vector: f32,

    /// Weight of the keyword (lexical) score
    #[serde(default = "default_keyword_weight")]
    pub keyword: f32,
}

fn default_vector_weight() -> f32 {
    0.7
}

fn default_keyword_weight() -> f32 {
    0.3
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            vector: default_vector_weight(),
            keyword: default_keyword_weight(),
        }
    }
}

impl Weights {
    /// Fuse a vector score and a keyword score into one ranked score,
    /// keeping the full breakdown
    pub fn combine(&self, vector: f32, keyword: f32) -> ScoreBreakdown {
        ScoreBreakdown {
            vector,
            keyword,
            combined: vector * self.vector + keyword * self.keyword,
        }
    }
}

/// Per-candidate score breakdown carried through to the caller
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Cosine similarity of the candidate's embedding to the query vector
    pub vector: f32,

    /// Trigram similarity of the candidate's text to the query text
    pub keyword: f32,

    /// The ranked score. In hybrid mode `vector*wv + keyword*wk`; in
    /// vector-only mode the vector similarity itself.
    pub combined: f32,
}

impl ScoreBreakdown {
    /// Breakdown for a vector-only match: no keyword contribution, the
    /// similarity ranks as-is
    pub fn vector_only(vector: f32) -> Self {
        Self {
            vector,
            keyword: 0.0,
            combined: vector,
        }
    }
}
