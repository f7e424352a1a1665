use crate::error::VectorStoreError;
use crate::records::{
    ChunkId, ChunkRecord, CodeChunk, FileDependency, FileSummary, Repository, RepositoryId,
    RepositoryStatus, SummaryRecord,
};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// Configuration for the vector store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    /// Width every stored and queried embedding must have
    pub embedding_dim: usize,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self { embedding_dim: 384 }
    }
}

/// A file-summary match from the index
#[derive(Debug, Clone)]
pub struct SummaryMatch {
    pub summary: FileSummary,

    /// Cosine similarity to the query vector (1 - cosine distance).
    /// Not clamped; out-of-range values indicate a correctness bug upstream.
    pub similarity: f32,
}

/// A code-chunk match from the index
#[derive(Debug, Clone)]
pub struct ChunkMatch {
    pub id: ChunkId,
    pub chunk: CodeChunk,
    pub similarity: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredChunk {
    id: ChunkId,
    chunk: CodeChunk,
    embedding: Vec<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredSummary {
    id: u64,
    summary: FileSummary,
    embedding: Vec<f32>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreState {
    repositories: HashMap<RepositoryId, Repository>,
    chunks: HashMap<RepositoryId, Vec<StoredChunk>>,
    summaries: HashMap<RepositoryId, Vec<StoredSummary>>,
    dependencies: HashMap<RepositoryId, Vec<FileDependency>>,
    next_chunk_id: u64,
    next_summary_id: u64,
}

/// Similarity index over ingested repositories.
///
/// Stores `(entity id, vector, metadata)` for two entity kinds, file
/// summaries and code chunks, and answers nearest-neighbor queries with a
/// similarity threshold, a result cap, and a repository scope. Embeddings
/// are produced by ingestion and supplied with the records; the store never
/// embeds anything itself.
///
/// Searches take `&self` and only acquire read locks, so arbitrarily many
/// concurrent queries are safe. Writes happen during ingestion only.
pub struct VectorStore {
    config: VectorStoreConfig,
    db_path: Option<PathBuf>,
    state: RwLock<StoreState>,
}

impl VectorStore {
    /// Create an in-memory store with default configuration
    pub fn in_memory() -> Self {
        Self::in_memory_with_config(VectorStoreConfig::default())
    }

    /// Create an in-memory store with custom configuration
    pub fn in_memory_with_config(config: VectorStoreConfig) -> Self {
        Self {
            config,
            db_path: None,
            state: RwLock::new(StoreState::default()),
        }
    }

    /// Open a store persisted at the given path, creating it if absent
    pub async fn open(db_path: &Path) -> Result<Self, VectorStoreError> {
        Self::open_with_config(db_path, VectorStoreConfig::default()).await
    }

    /// Open a store persisted at the given path with custom configuration
    pub async fn open_with_config(
        db_path: &Path,
        config: VectorStoreConfig,
    ) -> Result<Self, VectorStoreError> {
        info!("Opening vector store at {}", db_path.display());

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let state = if db_path.exists() {
            let content = tokio::fs::read(db_path).await?;
            serde_json::from_slice(&content)?
        } else {
            StoreState::default()
        };

        Ok(Self {
            config,
            db_path: Some(db_path.to_path_buf()),
            state: RwLock::new(state),
        })
    }

    async fn persist(&self, state: &StoreState) -> Result<(), VectorStoreError> {
        if let Some(path) = &self.db_path {
            let content = serde_json::to_vec(state)?;
            tokio::fs::write(path, content).await?;
        }
        Ok(())
    }

    fn check_dimension(&self, embedding: &[f32]) -> Result<(), VectorStoreError> {
        if embedding.len() != self.config.embedding_dim {
            return Err(VectorStoreError::DimensionMismatch {
                expected: self.config.embedding_dim,
                actual: embedding.len(),
            });
        }
        Ok(())
    }

    /// Register or replace a repository entry
    pub async fn upsert_repository(&self, repository: Repository) -> Result<(), VectorStoreError> {
        let mut state = self.state.write().await;
        state.repositories.insert(repository.id.clone(), repository);
        self.persist(&state).await
    }

    /// Look up a repository by id
    pub async fn repository(&self, id: &RepositoryId) -> Option<Repository> {
        let state = self.state.read().await;
        state.repositories.get(id).cloned()
    }

    /// All registered repositories
    pub async fn repositories(&self) -> Vec<Repository> {
        let state = self.state.read().await;
        let mut repos: Vec<Repository> = state.repositories.values().cloned().collect();
        repos.sort_by(|a, b| a.id.cmp(&b.id));
        repos
    }

    /// Update a repository's lifecycle status
    pub async fn set_status(
        &self,
        id: &RepositoryId,
        status: RepositoryStatus,
    ) -> Result<(), VectorStoreError> {
        let mut state = self.state.write().await;
        let repository = state
            .repositories
            .get_mut(id)
            .ok_or_else(|| VectorStoreError::UnknownRepository(id.to_string()))?;
        repository.status = status;
        self.persist(&state).await
    }

    /// Destroy a repository and all derived chunks, summaries, and
    /// dependency records
    pub async fn remove_repository(&self, id: &RepositoryId) -> Result<(), VectorStoreError> {
        let mut state = self.state.write().await;
        state
            .repositories
            .remove(id)
            .ok_or_else(|| VectorStoreError::UnknownRepository(id.to_string()))?;
        state.chunks.remove(id);
        state.summaries.remove(id);
        state.dependencies.remove(id);
        info!("Removed repository {id} and derived records");
        self.persist(&state).await
    }

    /// Add code chunks with their ingestion-time embeddings.
    /// Returns the store-assigned id of each chunk, in input order.
    pub async fn add_chunks(
        &self,
        repo: &RepositoryId,
        records: Vec<ChunkRecord>,
    ) -> Result<Vec<ChunkId>, VectorStoreError> {
        for record in &records {
            self.check_dimension(&record.embedding)?;
        }

        let mut state = self.state.write().await;
        if !state.repositories.contains_key(repo) {
            return Err(VectorStoreError::UnknownRepository(repo.to_string()));
        }

        let mut ids = Vec::with_capacity(records.len());
        let start_id = state.next_chunk_id;
        let entries = state.chunks.entry(repo.clone()).or_default();
        for (offset, record) in records.into_iter().enumerate() {
            let id = ChunkId(start_id + offset as u64);
            ids.push(id);
            entries.push(StoredChunk {
                id,
                chunk: record.chunk,
                embedding: record.embedding,
            });
        }
        state.next_chunk_id = start_id + ids.len() as u64;

        debug!("Added {} chunks to repository {repo}", ids.len());
        self.persist(&state).await?;
        Ok(ids)
    }

    /// Add file summaries with their ingestion-time embeddings.
    /// At most one summary may exist per (repository, file path); a second
    /// insert for the same path is rejected.
    pub async fn add_summaries(
        &self,
        repo: &RepositoryId,
        records: Vec<SummaryRecord>,
    ) -> Result<(), VectorStoreError> {
        for record in &records {
            self.check_dimension(&record.embedding)?;
        }

        let mut state = self.state.write().await;
        if !state.repositories.contains_key(repo) {
            return Err(VectorStoreError::UnknownRepository(repo.to_string()));
        }

        let mut seen: HashSet<String> = state
            .summaries
            .get(repo)
            .map(|entries| {
                entries
                    .iter()
                    .map(|s| s.summary.file_path.clone())
                    .collect()
            })
            .unwrap_or_default();

        for record in &records {
            if !seen.insert(record.summary.file_path.clone()) {
                return Err(VectorStoreError::DuplicateSummary {
                    path: record.summary.file_path.clone(),
                });
            }
        }

        let count = records.len();
        let start_id = state.next_summary_id;
        let entries = state.summaries.entry(repo.clone()).or_default();
        for (offset, record) in records.into_iter().enumerate() {
            entries.push(StoredSummary {
                id: start_id + offset as u64,
                summary: record.summary,
                embedding: record.embedding,
            });
        }
        state.next_summary_id = start_id + count as u64;

        debug!("Added {count} summaries to repository {repo}");
        self.persist(&state).await
    }

    /// Record dependency edges for downstream cross-file reasoning
    pub async fn add_dependencies(
        &self,
        repo: &RepositoryId,
        edges: Vec<FileDependency>,
    ) -> Result<(), VectorStoreError> {
        let mut state = self.state.write().await;
        if !state.repositories.contains_key(repo) {
            return Err(VectorStoreError::UnknownRepository(repo.to_string()));
        }
        state.dependencies.entry(repo.clone()).or_default().extend(edges);
        self.persist(&state).await
    }

    /// Dependency edges recorded for a repository
    pub async fn dependencies(
        &self,
        repo: &RepositoryId,
    ) -> Result<Vec<FileDependency>, VectorStoreError> {
        let state = self.state.read().await;
        if !state.repositories.contains_key(repo) {
            return Err(VectorStoreError::UnknownRepository(repo.to_string()));
        }
        Ok(state.dependencies.get(repo).cloned().unwrap_or_default())
    }

    /// Number of chunks indexed for a repository
    pub async fn chunk_count(&self, repo: &RepositoryId) -> usize {
        let state = self.state.read().await;
        state.chunks.get(repo).map_or(0, Vec::len)
    }

    /// Number of file summaries indexed for a repository
    pub async fn summary_count(&self, repo: &RepositoryId) -> usize {
        let state = self.state.read().await;
        state.summaries.get(repo).map_or(0, Vec::len)
    }

    /// Search file summaries in one repository.
    ///
    /// Returns up to `limit` summaries whose cosine similarity to the query
    /// vector strictly exceeds `threshold`, ordered by similarity descending
    /// with ties broken by insert order, so identical queries against
    /// unchanged data return identical sequences. A registered repository
    /// with no summaries yields an empty result, not an error.
    pub async fn search_summaries(
        &self,
        repo: &RepositoryId,
        query: &[f32],
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<SummaryMatch>, VectorStoreError> {
        self.check_dimension(query)?;

        let state = self.state.read().await;
        if !state.repositories.contains_key(repo) {
            return Err(VectorStoreError::UnknownRepository(repo.to_string()));
        }

        let mut matches: Vec<(u64, SummaryMatch)> = state
            .summaries
            .get(repo)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|stored| {
                        let similarity = cosine_similarity(query, &stored.embedding);
                        (similarity > threshold).then(|| {
                            (
                                stored.id,
                                SummaryMatch {
                                    summary: stored.summary.clone(),
                                    similarity,
                                },
                            )
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        matches.sort_by(|a, b| {
            b.1.similarity
                .partial_cmp(&a.1.similarity)
                .unwrap_or(Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        matches.truncate(limit);

        debug!(
            "Summary search in {repo}: {} over threshold {threshold}",
            matches.len()
        );
        Ok(matches.into_iter().map(|(_, m)| m).collect())
    }

    /// Search code chunks in one repository, optionally restricted to a set
    /// of file paths.
    ///
    /// Same threshold/cap/ordering contract as [`Self::search_summaries`].
    pub async fn search_chunks(
        &self,
        repo: &RepositoryId,
        query: &[f32],
        threshold: f32,
        limit: usize,
        path_filter: Option<&HashSet<String>>,
    ) -> Result<Vec<ChunkMatch>, VectorStoreError> {
        self.check_dimension(query)?;

        let state = self.state.read().await;
        if !state.repositories.contains_key(repo) {
            return Err(VectorStoreError::UnknownRepository(repo.to_string()));
        }

        let mut matches: Vec<ChunkMatch> = state
            .chunks
            .get(repo)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|stored| {
                        path_filter.is_none_or(|paths| paths.contains(&stored.chunk.file_path))
                    })
                    .filter_map(|stored| {
                        let similarity = cosine_similarity(query, &stored.embedding);
                        (similarity > threshold).then(|| ChunkMatch {
                            id: stored.id,
                            chunk: stored.chunk.clone(),
                            similarity,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        matches.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
                .then(a.id.cmp(&b.id))
        });
        matches.truncate(limit);

        debug!(
            "Chunk search in {repo}: {} over threshold {threshold}",
            matches.len()
        );
        Ok(matches)
    }

    /// Get the configuration of this store
    pub fn config(&self) -> &VectorStoreConfig {
        &self.config
    }
}

/// Cosine similarity, `1 - cosine_distance`. Zero-magnitude vectors score 0.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        0.0
    } else {
        dot / (mag_a * mag_b)
    }
}
