use crate::fusion::ScoreBreakdown;
use repogpt_vector_store::{ChunkId, ChunkKind};
use serde::{Deserialize, Serialize};

/// A stage-1 hit: a file whose summary cleared the file-level threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileHit {
    pub file_path: String,

    /// The abstractive summary the hit was scored on
    pub summary: String,

    /// Notable symbols extracted alongside the summary
    pub key_components: Vec<String>,

    pub scores: ScoreBreakdown,
}

/// A stage-2 hit: an evidence passage handed to generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub chunk_id: ChunkId,

    pub file_path: String,

    /// Line range (1-indexed, inclusive) for citation rendering
    pub start_line: u32,
    pub end_line: u32,

    pub content: String,

    pub kind: ChunkKind,

    /// Human-readable name for function/class chunks
    pub name: Option<String>,

    /// Retrieval-stage score breakdown
    pub scores: ScoreBreakdown,

    /// Cross-encoder score, present when the reranking stage ran
    pub rerank_score: Option<f32>,

    /// Position in the final list (0 = best)
    pub rank: usize,
}

impl Passage {
    /// Citation string for the generation step, e.g. `src/auth.rs:10-42`
    pub fn citation(&self) -> String {
        format!("{}:{}-{}", self.file_path, self.start_line, self.end_line)
    }
}

/// Search performance statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Total search time in milliseconds
    pub total_time_ms: u64,

    /// Query embedding time in milliseconds
    pub embed_time_ms: u64,

    /// Stage-1 (file narrowing) time in milliseconds
    pub file_stage_ms: u64,

    /// Stage-2 (chunk retrieval) time in milliseconds
    pub chunk_stage_ms: u64,

    /// Reranking time in milliseconds
    pub rerank_time_ms: u64,

    /// Number of stage-1 candidates
    pub file_candidates: usize,

    /// Number of stage-2 candidates before the final cap
    pub chunk_candidates: usize,

    /// Stage 2 searched the whole repository because stage 1 selected no
    /// files
    pub fallback_used: bool,

    /// The cross-encoder ran and reordered the passages
    pub reranked: bool,

    /// Served from the result cache
    pub cache_hit: bool,
}

/// Ranked, deduplicated output of one retrieval call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalOutcome {
    /// Query that produced this outcome
    pub query: String,

    /// Stage-1 file hits, highest combined score first
    pub files: Vec<FileHit>,

    /// Final ordered evidence passages
    pub passages: Vec<Passage>,

    pub stats: SearchStats,
}

impl RetrievalOutcome {
    /// Get top N passages
    pub fn top(&self, n: usize) -> &[Passage] {
        &self.passages[..n.min(self.passages.len())]
    }

    /// No passages and no file hits
    pub fn is_empty(&self) -> bool {
        self.passages.is_empty() && self.files.is_empty()
    }

    /// Number of passages
    pub fn len(&self) -> usize {
        self.passages.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn test_passage(rank: usize) -> Passage {
        Passage {
            chunk_id: ChunkId(rank as u64),
            file_path: "src/auth.rs".to_string(),
            start_line: 10,
            end_line: 42,
            content: "fn verify() {}".to_string(),
            kind: ChunkKind::Function,
            name: Some("verify".to_string()),
            scores: ScoreBreakdown::default(),
            rerank_score: None,
            rank,
        }
    }

    #[test]
    fn test_citation_format() {
        assert_eq!(test_passage(0).citation(), "src/auth.rs:10-42");
    }

    #[test]
    fn test_top_clamps_to_available() {
        let outcome = RetrievalOutcome {
            query: "query".to_string(),
            files: vec![],
            passages: vec![test_passage(0), test_passage(1), test_passage(2)],
            stats: SearchStats::default(),
        };

        assert_eq!(outcome.top(2).len(), 2);
        assert_eq!(outcome.top(5).len(), 3);
        assert_eq!(outcome.top(2)[0].rank, 0);
    }

    #[test]
    fn test_empty_outcome() {
        let outcome = RetrievalOutcome {
            query: "query".to_string(),
            files: vec![],
            passages: vec![],
            stats: SearchStats::default(),
        };

        assert!(outcome.is_empty());
        assert_eq!(outcome.len(), 0);
    }
}
