use crate::config::RetrievalConfig;
use crate::result::{Passage, SearchStats};
use log::{debug, warn};
use repogpt_embeddings::Reranker;
use std::cmp::Ordering;
use std::sync::Arc;

/// Cross-encoder reranking stage.
///
/// Quality refinement, not a correctness requirement: any reranker failure
/// is swallowed with a warning and the stage-2 order is returned unchanged.
/// Membership never changes; only the optional final cap shortens the list,
/// and it applies on the fail-soft path too.
pub(crate) struct RerankStage {
    reranker: Option<Arc<dyn Reranker>>,
}

impl RerankStage {
    pub(crate) fn new(reranker: Option<Arc<dyn Reranker>>) -> Self {
        Self { reranker }
    }

    pub(crate) async fn apply(
        &self,
        query: &str,
        mut passages: Vec<Passage>,
        config: &RetrievalConfig,
        stats: &mut SearchStats,
    ) -> Vec<Passage> {
        if let Some(reranker) = &self.reranker
            && !passages.is_empty()
        {
            let texts: Vec<String> = passages
                .iter()
                .map(|p| truncate_chars(&p.content, config.rerank_max_chars))
                .collect();

            match reranker.score(query, &texts).await {
                Ok(scores) if scores.len() == passages.len() => {
                    for (passage, score) in passages.iter_mut().zip(scores) {
                        passage.rerank_score = Some(score);
                    }
                    // Stable sort: passages the model scores equally keep
                    // their retrieval order.
                    passages.sort_by(|a, b| {
                        b.rerank_score
                            .partial_cmp(&a.rerank_score)
                            .unwrap_or(Ordering::Equal)
                    });
                    stats.reranked = true;
                    debug!("Reranked {} passages", passages.len());
                }
                Ok(scores) => {
                    warn!(
                        "Reranker returned {} scores for {} passages; keeping retrieval order",
                        scores.len(),
                        passages.len()
                    );
                }
                Err(e) => {
                    warn!("Reranking unavailable, keeping retrieval order: {e}");
                }
            }
        }

        if let Some(limit) = config.rerank_limit {
            passages.truncate(limit);
        }

        for (rank, passage) in passages.iter_mut().enumerate() {
            passage.rank = rank;
        }

        passages
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.len() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fusion::ScoreBreakdown;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use repogpt_embeddings::{EmbeddingError, Reranker};
    use repogpt_vector_store::{ChunkId, ChunkKind};

    struct FixedScores(Vec<f32>);

    #[async_trait]
    impl Reranker for FixedScores {
        async fn score(
            &self,
            _query: &str,
            _passages: &[String],
        ) -> Result<Vec<f32>, EmbeddingError> {
            Ok(self.0.clone())
        }
    }

    struct Unavailable;

    #[async_trait]
    impl Reranker for Unavailable {
        async fn score(
            &self,
            _query: &str,
            _passages: &[String],
        ) -> Result<Vec<f32>, EmbeddingError> {
            Err(EmbeddingError::Other("model unavailable".into()))
        }
    }

    fn passage(id: u64, content: &str) -> Passage {
        Passage {
            chunk_id: ChunkId(id),
            file_path: format!("src/file{id}.rs"),
            start_line: 1,
            end_line: 10,
            content: content.to_string(),
            kind: ChunkKind::Code,
            name: None,
            scores: ScoreBreakdown::default(),
            rerank_score: None,
            rank: 0,
        }
    }

    fn uncapped_config() -> RetrievalConfig {
        RetrievalConfig {
            rerank_limit: None,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_reorders_by_cross_encoder_score() {
        let stage = RerankStage::new(Some(Arc::new(FixedScores(vec![0.1, 0.9, 0.5]))));
        let passages = vec![passage(0, "a"), passage(1, "b"), passage(2, "c")];
        let mut stats = SearchStats::default();

        let result = stage
            .apply("query", passages, &uncapped_config(), &mut stats)
            .await;

        let ids: Vec<u64> = result.iter().map(|p| p.chunk_id.0).collect();
        assert_eq!(ids, vec![1, 2, 0]);
        assert!(stats.reranked);
        assert_eq!(result[0].rerank_score, Some(0.9));
        assert_eq!(result[0].rank, 0);
        assert_eq!(result[2].rank, 2);
    }

    #[tokio::test]
    async fn test_membership_and_length_preserved() {
        let stage = RerankStage::new(Some(Arc::new(FixedScores(vec![0.3, 0.2, 0.8]))));
        let passages = vec![passage(0, "a"), passage(1, "b"), passage(2, "c")];
        let input_ids: std::collections::HashSet<u64> =
            passages.iter().map(|p| p.chunk_id.0).collect();
        let mut stats = SearchStats::default();

        let result = stage
            .apply("query", passages, &uncapped_config(), &mut stats)
            .await;

        assert_eq!(result.len(), 3);
        let output_ids: std::collections::HashSet<u64> =
            result.iter().map(|p| p.chunk_id.0).collect();
        assert_eq!(input_ids, output_ids);
    }

    #[tokio::test]
    async fn test_unavailable_reranker_keeps_order() {
        let stage = RerankStage::new(Some(Arc::new(Unavailable)));
        let passages = vec![passage(0, "a"), passage(1, "b"), passage(2, "c")];
        let mut stats = SearchStats::default();

        let result = stage
            .apply("query", passages, &uncapped_config(), &mut stats)
            .await;

        let ids: Vec<u64> = result.iter().map(|p| p.chunk_id.0).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert!(!stats.reranked);
        assert!(result.iter().all(|p| p.rerank_score.is_none()));
    }

    #[tokio::test]
    async fn test_score_count_mismatch_keeps_order() {
        let stage = RerankStage::new(Some(Arc::new(FixedScores(vec![0.9]))));
        let passages = vec![passage(0, "a"), passage(1, "b")];
        let mut stats = SearchStats::default();

        let result = stage
            .apply("query", passages, &uncapped_config(), &mut stats)
            .await;

        let ids: Vec<u64> = result.iter().map(|p| p.chunk_id.0).collect();
        assert_eq!(ids, vec![0, 1]);
        assert!(!stats.reranked);
    }

    #[tokio::test]
    async fn test_final_cap_applies_on_both_paths() {
        let config = RetrievalConfig {
            rerank_limit: Some(2),
            ..Default::default()
        };

        let reranked_stage = RerankStage::new(Some(Arc::new(FixedScores(vec![0.1, 0.9, 0.5]))));
        let mut stats = SearchStats::default();
        let reranked = reranked_stage
            .apply(
                "query",
                vec![passage(0, "a"), passage(1, "b"), passage(2, "c")],
                &config,
                &mut stats,
            )
            .await;
        assert_eq!(reranked.len(), 2);
        assert_eq!(reranked[0].chunk_id.0, 1);

        let failing_stage = RerankStage::new(Some(Arc::new(Unavailable)));
        let mut stats = SearchStats::default();
        let kept = failing_stage
            .apply(
                "query",
                vec![passage(0, "a"), passage(1, "b"), passage(2, "c")],
                &config,
                &mut stats,
            )
            .await;
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].chunk_id.0, 0);
    }

    #[tokio::test]
    async fn test_no_reranker_passes_through() {
        let stage = RerankStage::new(None);
        let passages = vec![passage(0, "a"), passage(1, "b")];
        let mut stats = SearchStats::default();

        let result = stage
            .apply("query", passages, &uncapped_config(), &mut stats)
            .await;

        let ids: Vec<u64> = result.iter().map(|p| p.chunk_id.0).collect();
        assert_eq!(ids, vec![0, 1]);
        assert!(!stats.reranked);
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("abcdef", 3), "abc");
    }
}
