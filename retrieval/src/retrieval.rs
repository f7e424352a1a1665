use crate::config::{RetrievalConfig, SearchMode};
use crate::error::{Result, RetrievalError};
use crate::fusion::ScoreBreakdown;
use crate::keyword::trigram_similarity;
use crate::rerank::RerankStage;
use crate::result::{FileHit, Passage, RetrievalOutcome, SearchStats};
use log::{debug, info};
use lru::LruCache;
use repogpt_embeddings::{EmbeddingProvider, Reranker};
use repogpt_vector_store::{ChunkId, CodeChunk, FileSummary, RepositoryId, VectorStore};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio::time::timeout;

/// Two-stage hybrid retrieval engine.
///
/// Stage 1 ranks file summaries to narrow the search to a candidate file
/// set; stage 2 ranks code chunks restricted to that set. Both stages score
/// against one embedding of the query, optionally fused with trigram
/// similarity, and the survivors pass through a fail-soft cross-encoder
/// reranking stage.
///
/// Retrieval is stateless and read-only: `search` takes `&self` and nothing
/// in the pipeline mutates indexed data, so concurrent calls need no
/// locking beyond the store's own read guards.
pub struct RetrievalEngine {
    config: RetrievalConfig,
    store: Arc<VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    rerank: RerankStage,
    cache: RwLock<LruCache<String, RetrievalOutcome>>,
}

impl RetrievalEngine {
    /// Create a new retrieval engine without a reranker
    pub fn new(
        config: RetrievalConfig,
        store: Arc<VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        config.validate().map_err(RetrievalError::InvalidConfig)?;

        info!("Initializing retrieval engine");

        let capacity = if config.enable_cache {
            config.cache_size
        } else {
            1
        };
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);

        Ok(Self {
            config,
            store,
            embedder,
            rerank: RerankStage::new(None),
            cache: RwLock::new(LruCache::new(capacity)),
        })
    }

    /// Attach a cross-encoder reranker
    pub fn with_reranker(mut self, reranker: Arc<dyn Reranker>) -> Self {
        self.rerank = RerankStage::new(Some(reranker));
        self
    }

    /// Search with the engine's default configuration
    pub async fn search(&self, repo: &RepositoryId, query: &str) -> Result<RetrievalOutcome> {
        self.search_with_config(repo, query, &self.config).await
    }

    /// Search with an explicit per-call configuration. Concurrent callers
    /// with different tuning never interfere.
    pub async fn search_with_config(
        &self,
        repo: &RepositoryId,
        query: &str,
        config: &RetrievalConfig,
    ) -> Result<RetrievalOutcome> {
        let start = Instant::now();

        config.validate().map_err(RetrievalError::InvalidConfig)?;

        let query_chars = query.chars().count();
        if query_chars < config.min_query_chars {
            return Err(RetrievalError::QueryTooShort {
                min: config.min_query_chars,
                actual: query_chars,
            });
        }

        // Input validation happens before any index access.
        if self.store.repository(repo).await.is_none() {
            return Err(RetrievalError::UnknownRepository(repo.to_string()));
        }

        let key = cache_key(repo, query, config);
        if config.enable_cache {
            let mut cache = self.cache.write().await;
            if let Some(cached) = cache.get(&key) {
                info!("Cache hit for query '{query}' in {repo}");
                let mut outcome = cached.clone();
                outcome.stats.cache_hit = true;
                outcome.stats.total_time_ms = start.elapsed().as_millis() as u64;
                return Ok(outcome);
            }
        }

        debug!("Two-stage search in {repo} for '{query}'");
        let mut stats = SearchStats::default();

        // Stage 0: embed the query once. Both stages rank against this one
        // vector; re-embedding per stage would cost an extra call and let
        // the stages disagree on what the query means.
        let embed_start = Instant::now();
        let query_vec = timeout(
            Duration::from_millis(config.embed_timeout_ms),
            self.embedder.embed_one(query),
        )
        .await
        .map_err(|_| RetrievalError::EmbeddingTimeout {
            timeout_ms: config.embed_timeout_ms,
        })??;
        stats.embed_time_ms = embed_start.elapsed().as_millis() as u64;

        // Stage 1: file narrowing over summaries.
        let file_start = Instant::now();
        let files = self.file_stage(repo, query, &query_vec, config).await?;
        stats.file_stage_ms = file_start.elapsed().as_millis() as u64;
        stats.file_candidates = files.len();
        debug!("Stage 1 selected {} candidate files", files.len());

        // Stage 2: chunk retrieval scoped to the candidate files. An empty
        // candidate set must not starve the pipeline: unless configured
        // otherwise, fall back to searching the whole repository.
        let chunk_start = Instant::now();
        let candidate_paths: HashSet<String> =
            files.iter().map(|f| f.file_path.clone()).collect();
        let scope = if candidate_paths.is_empty() && config.fallback_on_empty_files {
            stats.fallback_used = true;
            info!("No file summaries cleared the threshold; searching {repo} unscoped");
            None
        } else {
            Some(&candidate_paths)
        };
        let mut passages = self.chunk_stage(repo, query, &query_vec, config, scope).await?;

        // Dedup by chunk id. Chunks have exactly one file path, so this is a
        // safeguard against double-issued queries, not a semantic necessity.
        let mut seen: HashSet<ChunkId> = HashSet::new();
        passages.retain(|p| seen.insert(p.chunk_id));

        stats.chunk_stage_ms = chunk_start.elapsed().as_millis() as u64;
        stats.chunk_candidates = passages.len();
        debug!("Stage 2 retrieved {} chunks", passages.len());

        // Final gate: cross-encoder reranking, fail-soft.
        let rerank_start = Instant::now();
        let passages = self.rerank.apply(query, passages, config, &mut stats).await;
        stats.rerank_time_ms = rerank_start.elapsed().as_millis() as u64;

        stats.total_time_ms = start.elapsed().as_millis() as u64;

        let outcome = RetrievalOutcome {
            query: query.to_string(),
            files,
            passages,
            stats,
        };

        if config.enable_cache {
            let mut cache = self.cache.write().await;
            cache.put(key, outcome.clone());
        }

        info!(
            "Search completed in {}ms: {} files, {} passages",
            outcome.stats.total_time_ms,
            outcome.files.len(),
            outcome.passages.len()
        );

        Ok(outcome)
    }

    async fn file_stage(
        &self,
        repo: &RepositoryId,
        query: &str,
        query_vec: &[f32],
        config: &RetrievalConfig,
    ) -> Result<Vec<FileHit>> {
        let hits = match config.mode {
            SearchMode::VectorOnly => self
                .store
                .search_summaries(repo, query_vec, config.file_threshold, config.file_limit)
                .await?
                .into_iter()
                .map(|m| file_hit(m.summary, ScoreBreakdown::vector_only(m.similarity)))
                .collect(),
            SearchMode::Hybrid => {
                // The keyword score can lift candidates the vector threshold
                // alone would drop, so fuse over the full candidate pool and
                // apply the threshold to the combined score.
                let pool = self
                    .store
                    .search_summaries(repo, query_vec, f32::NEG_INFINITY, usize::MAX)
                    .await?;

                let mut hits: Vec<FileHit> = pool
                    .into_iter()
                    .filter_map(|m| {
                        let keyword =
                            trigram_similarity(query, &m.summary.searchable_text());
                        let scores = config.weights.combine(m.similarity, keyword);
                        (scores.combined > config.file_threshold)
                            .then(|| file_hit(m.summary, scores))
                    })
                    .collect();

                // Stable sort: equal combined scores keep the store's
                // deterministic order.
                hits.sort_by(|a, b| {
                    b.scores
                        .combined
                        .partial_cmp(&a.scores.combined)
                        .unwrap_or(Ordering::Equal)
                });
                hits.truncate(config.file_limit);
                hits
            }
        };

        Ok(hits)
    }

    async fn chunk_stage(
        &self,
        repo: &RepositoryId,
        query: &str,
        query_vec: &[f32],
        config: &RetrievalConfig,
        scope: Option<&HashSet<String>>,
    ) -> Result<Vec<Passage>> {
        let passages = match config.mode {
            SearchMode::VectorOnly => self
                .store
                .search_chunks(
                    repo,
                    query_vec,
                    config.chunk_threshold,
                    config.chunk_limit,
                    scope,
                )
                .await?
                .into_iter()
                .map(|m| passage(m.id, m.chunk, ScoreBreakdown::vector_only(m.similarity)))
                .collect(),
            SearchMode::Hybrid => {
                let pool = self
                    .store
                    .search_chunks(repo, query_vec, f32::NEG_INFINITY, usize::MAX, scope)
                    .await?;

                let mut passages: Vec<Passage> = pool
                    .into_iter()
                    .filter_map(|m| {
                        let keyword = trigram_similarity(query, &m.chunk.content);
                        let scores = config.weights.combine(m.similarity, keyword);
                        (scores.combined > config.chunk_threshold)
                            .then(|| passage(m.id, m.chunk, scores))
                    })
                    .collect();

                passages.sort_by(|a, b| {
                    b.scores
                        .combined
                        .partial_cmp(&a.scores.combined)
                        .unwrap_or(Ordering::Equal)
                });
                passages.truncate(config.chunk_limit);
                passages
            }
        };

        Ok(passages)
    }

    /// Clear the search result cache. Call after the store is re-indexed.
    pub async fn clear_cache(&self) {
        let mut cache = self.cache.write().await;
        cache.clear();
        info!("Search cache cleared");
    }

    /// Get cache statistics
    pub async fn cache_stats(&self) -> CacheStats {
        let cache = self.cache.read().await;
        CacheStats {
            size: cache.len(),
            capacity: cache.cap().get(),
        }
    }

    /// Get the engine's default configuration
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }
}

fn file_hit(summary: FileSummary, scores: ScoreBreakdown) -> FileHit {
    FileHit {
        file_path: summary.file_path,
        summary: summary.summary,
        key_components: summary.key_components,
        scores,
    }
}

fn passage(id: ChunkId, chunk: CodeChunk, scores: ScoreBreakdown) -> Passage {
    Passage {
        chunk_id: id,
        file_path: chunk.file_path,
        start_line: chunk.start_line,
        end_line: chunk.end_line,
        content: chunk.content,
        kind: chunk.kind,
        name: chunk.name,
        scores,
        rerank_score: None,
        rank: 0,
    }
}

fn cache_key(repo: &RepositoryId, query: &str, config: &RetrievalConfig) -> String {
    let config_json = serde_json::to_string(config).unwrap_or_default();
    format!("{repo}\u{1f}{query}\u{1f}{config_json}")
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub size: usize,
    pub capacity: usize,
}
