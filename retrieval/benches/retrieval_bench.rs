use async_trait::async_trait;
use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use repogpt_embeddings::{EmbeddingError, EmbeddingProvider};
use repogpt_retrieval::{RetrievalConfig, RetrievalEngine};
use repogpt_vector_store::{
    ChunkRecord, CodeChunk, FileSummary, Repository, RepositoryId, RepositoryStatus,
    SummaryRecord, VectorStore, VectorStoreConfig,
};
use std::sync::Arc;
use tokio::runtime::Runtime;

const DIM: usize = 64;

/// Deterministic text-to-vector mapping so benches never download a model
fn pseudo_embed(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; DIM];
    for (i, byte) in text.bytes().enumerate() {
        vector[(i + byte as usize) % DIM] += (byte % 17) as f32 / 16.0;
    }
    let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in &mut vector {
            *v /= norm;
        }
    }
    vector
}

struct PseudoEmbedder;

#[async_trait]
impl EmbeddingProvider for PseudoEmbedder {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|t| pseudo_embed(t)).collect())
    }

    fn dimension(&self) -> usize {
        DIM
    }
}

async fn setup_engine(chunk_count: usize) -> (RetrievalEngine, RepositoryId) {
    let store = Arc::new(VectorStore::in_memory_with_config(VectorStoreConfig {
        embedding_dim: DIM,
    }));

    let repo = RepositoryId::new("bench-repo");
    store
        .upsert_repository(Repository {
            id: repo.clone(),
            source_url: "https://example.com/bench.git".to_string(),
            display_name: "bench".to_string(),
            owner_id: "bench-user".to_string(),
            status: RepositoryStatus::Ready,
            file_tree: None,
            created_at: Utc::now(),
        })
        .await
        .unwrap();

    let file_count = (chunk_count / 10).max(1);
    let summaries: Vec<SummaryRecord> = (0..file_count)
        .map(|i| {
            let text = format!("Implements feature group {i} with helper functions.");
            SummaryRecord {
                summary: FileSummary {
                    file_path: format!("src/file_{i}.rs"),
                    summary: text.clone(),
                    key_components: vec![format!("function_{i}")],
                },
                embedding: pseudo_embed(&text),
            }
        })
        .collect();
    store.add_summaries(&repo, summaries).await.unwrap();

    let chunks: Vec<ChunkRecord> = (0..chunk_count)
        .map(|i| {
            let content = format!(
                "fn function_{i}() {{\n    let x = {i};\n    x * 2\n}}"
            );
            ChunkRecord {
                chunk: CodeChunk::new(
                    format!("src/file_{}.rs", i % file_count),
                    1,
                    50,
                    content.clone(),
                ),
                embedding: pseudo_embed(&content),
            }
        })
        .collect();
    store.add_chunks(&repo, chunks).await.unwrap();

    let config = RetrievalConfig {
        file_threshold: 0.0,
        chunk_threshold: 0.0,
        enable_cache: false,
        ..Default::default()
    };
    let engine = RetrievalEngine::new(config, store, Arc::new(PseudoEmbedder)).unwrap();

    (engine, repo)
}

fn bench_search_latency(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("search_latency");

    for chunk_count in [100, 500, 1000, 5000] {
        group.throughput(Throughput::Elements(chunk_count as u64));

        let (engine, repo) = rt.block_on(setup_engine(chunk_count));

        group.bench_with_input(
            BenchmarkId::from_parameter(chunk_count),
            &chunk_count,
            |b, _| {
                b.to_async(&rt).iter(|| async {
                    let outcome = engine
                        .search(&repo, black_box("function implementation"))
                        .await
                        .unwrap();
                    black_box(outcome);
                });
            },
        );
    }

    group.finish();
}

fn bench_trigram_similarity(c: &mut Criterion) {
    let haystack = "async fn authenticate_user(token: &str) -> Result<User> { verify(token) }";

    c.bench_function("trigram_similarity", |b| {
        b.iter(|| {
            repogpt_retrieval::trigram_similarity(
                black_box("user authentication"),
                black_box(haystack),
            )
        });
    });
}

criterion_group!(benches, bench_search_latency, bench_trigram_similarity);
criterion_main!(benches);
