/*!
# RepoGPT Retrieval

Hierarchical hybrid retrieval engine for repository question answering:
- **Two-stage narrowing**: file summaries are ranked first, then code chunks
  restricted to the selected files
- **Hybrid scoring**: weighted linear fusion of vector similarity and
  trigram keyword similarity
- **Cross-encoder reranking**: fail-soft precision pass over the narrowed
  candidate set
- **LRU caching**: fast repeat queries

## Architecture

```text
Query
  └─> Embed once (timeout, retryable on failure)
        ├─> Stage 1: file summaries (vector [+ trigram] score, threshold, cap)
        │     └─> Candidate file set (empty set ⇒ unscoped fallback)
        └─> Stage 2: code chunks scoped to candidates
              └─> Dedup by chunk id
                    └─> Cross-encoder rerank (fail-soft, optional final cap)
                          └─> Ordered passages with score breakdowns
```

## Example

```rust,no_run
use repogpt_embeddings::EmbeddingService;
use repogpt_retrieval::{RetrievalConfig, RetrievalEngine};
use repogpt_vector_store::{RepositoryId, VectorStore};
use std::path::Path;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let store = Arc::new(VectorStore::open(Path::new(".repogpt/store.json")).await?);
    let embedder = Arc::new(EmbeddingService::new().await?);

    let engine = RetrievalEngine::new(RetrievalConfig::default(), store, embedder)?;
    let repo = RepositoryId::new("my-repo");
    let outcome = engine.search(&repo, "how are auth tokens verified?").await?;

    for passage in outcome.top(5) {
        println!(
            "{} (combined: {:.2})",
            passage.citation(),
            passage.scores.combined
        );
    }

    Ok(())
}
```

Retrieval is read-only and stateless per call: the engine never mutates
indexed data, and an explicit [`RetrievalConfig`] can be passed per search so
concurrent callers with different tuning never interfere.
*/

mod config;
mod error;
mod fusion;
mod keyword;
mod rerank;
mod result;
mod retrieval;

pub use config::{RetrievalConfig, SearchMode};
pub use error::{Result, RetrievalError};
pub use fusion::{ScoreBreakdown, Weights};
pub use keyword::trigram_similarity;
pub use result::{FileHit, Passage, RetrievalOutcome, SearchStats};
pub use retrieval::{CacheStats, RetrievalEngine};
