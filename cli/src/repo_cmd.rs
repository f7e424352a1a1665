use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use log::warn;
use owo_colors::OwoColorize;
use repogpt_embeddings::{EmbeddingService, RerankService};
use repogpt_retrieval::{RetrievalConfig, RetrievalEngine, SearchMode};
use repogpt_vector_store::{
    ChunkRecord, FileDependency, Repository, RepositoryId, RepositoryStatus, SummaryRecord,
    VectorStore,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Subcommand)]
pub enum RepoCommand {
    /// Load ingestion records (chunks, summaries, dependencies) into a store
    Ingest(IngestArgs),

    /// Search an ingested repository
    Search(SearchArgs),

    /// Show ingested repositories and their record counts
    Status(StatusArgs),

    /// Remove a repository and all derived records
    Remove(RemoveArgs),
}

#[derive(Debug, Parser)]
pub struct IngestArgs {
    /// Repository identifier
    #[arg(long, value_name = "ID")]
    pub repo: String,

    /// Display name (defaults to the identifier)
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,

    /// Source URL the repository was cloned from
    #[arg(long, value_name = "URL", default_value = "")]
    pub url: String,

    /// Owning user identifier
    #[arg(long, value_name = "ID", default_value = "local")]
    pub owner: String,

    /// JSON file with chunk records (content + embeddings)
    #[arg(long, value_name = "PATH")]
    pub chunks: Option<PathBuf>,

    /// JSON file with file summary records
    #[arg(long, value_name = "PATH")]
    pub summaries: Option<PathBuf>,

    /// JSON file with dependency edges
    #[arg(long, value_name = "PATH")]
    pub deps: Option<PathBuf>,

    /// Path to the store file
    #[arg(long, value_name = "PATH")]
    pub store: Option<PathBuf>,
}

#[derive(Debug, Parser)]
pub struct SearchArgs {
    /// Search query
    #[arg(value_name = "QUERY")]
    pub query: String,

    /// Repository identifier
    #[arg(long, value_name = "ID")]
    pub repo: String,

    /// Number of results to return
    #[arg(short = 'n', long, default_value_t = 10)]
    pub limit: usize,

    /// Search mode: "hybrid" or "vector-only"
    #[arg(long, default_value = "hybrid")]
    pub mode: String,

    /// Skip cross-encoder reranking
    #[arg(long)]
    pub no_rerank: bool,

    /// Show passage content and search statistics
    #[arg(short, long)]
    pub verbose: bool,

    /// Path to the store file
    #[arg(long, value_name = "PATH")]
    pub store: Option<PathBuf>,
}

#[derive(Debug, Parser)]
pub struct StatusArgs {
    /// Path to the store file
    #[arg(long, value_name = "PATH")]
    pub store: Option<PathBuf>,
}

#[derive(Debug, Parser)]
pub struct RemoveArgs {
    /// Repository identifier
    #[arg(long, value_name = "ID")]
    pub repo: String,

    /// Skip confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Path to the store file
    #[arg(long, value_name = "PATH")]
    pub store: Option<PathBuf>,
}

impl RepoCommand {
    pub async fn run(self) -> Result<()> {
        match self {
            RepoCommand::Ingest(args) => run_ingest(args).await,
            RepoCommand::Search(args) => run_search(args).await,
            RepoCommand::Status(args) => run_status(args).await,
            RepoCommand::Remove(args) => run_remove(args).await,
        }
    }
}

fn store_path(arg: Option<PathBuf>) -> PathBuf {
    arg.unwrap_or_else(|| {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(".repogpt")
            .join("store.json")
    })
}

fn read_records<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<Vec<T>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {what} file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {what} file {}", path.display()))
}

async fn run_ingest(args: IngestArgs) -> Result<()> {
    let path = store_path(args.store);
    let store = VectorStore::open(&path)
        .await
        .context("Failed to open vector store")?;

    let repo = RepositoryId::new(args.repo.clone());
    store
        .upsert_repository(Repository {
            id: repo.clone(),
            source_url: args.url,
            display_name: args.name.unwrap_or(args.repo),
            owner_id: args.owner,
            status: RepositoryStatus::Indexing,
            file_tree: None,
            created_at: Utc::now(),
        })
        .await
        .context("Failed to register repository")?;

    let mut chunk_count = 0;
    if let Some(chunks_path) = args.chunks {
        let records: Vec<ChunkRecord> = read_records(&chunks_path, "chunk")?;
        chunk_count = records.len();
        store
            .add_chunks(&repo, records)
            .await
            .context("Failed to load chunks")?;
    }

    let mut summary_count = 0;
    if let Some(summaries_path) = args.summaries {
        let records: Vec<SummaryRecord> = read_records(&summaries_path, "summary")?;
        summary_count = records.len();
        store
            .add_summaries(&repo, records)
            .await
            .context("Failed to load summaries")?;
    }

    let mut dep_count = 0;
    if let Some(deps_path) = args.deps {
        let edges: Vec<FileDependency> = read_records(&deps_path, "dependency")?;
        dep_count = edges.len();
        store
            .add_dependencies(&repo, edges)
            .await
            .context("Failed to load dependencies")?;
    }

    store.set_status(&repo, RepositoryStatus::Ready).await?;

    println!(
        "{} Loaded {} chunks, {} summaries, {} dependencies into {}",
        "✓".bright_green(),
        chunk_count.bright_cyan(),
        summary_count.bright_cyan(),
        dep_count.bright_cyan(),
        repo.bright_cyan()
    );

    Ok(())
}

async fn run_search(args: SearchArgs) -> Result<()> {
    let path = store_path(args.store);
    if !path.exists() {
        anyhow::bail!(
            "Store not found at {}. Run 'repogpt ingest' first.",
            path.display()
        );
    }

    let mode = match args.mode.as_str() {
        "hybrid" => SearchMode::Hybrid,
        "vector-only" => SearchMode::VectorOnly,
        other => anyhow::bail!("Unknown mode '{other}' (expected 'hybrid' or 'vector-only')"),
    };

    let store = Arc::new(
        VectorStore::open(&path)
            .await
            .context("Failed to open vector store")?,
    );

    let embedder = Arc::new(
        EmbeddingService::new()
            .await
            .context("Failed to initialize embedding service")?,
    );

    let config = RetrievalConfig {
        mode,
        rerank_limit: Some(args.limit),
        ..Default::default()
    };
    let mut engine = RetrievalEngine::new(config, store, embedder)
        .context("Failed to initialize retrieval engine")?;

    if !args.no_rerank {
        // Reranking is a refinement; a missing model must not block search.
        match RerankService::new().await {
            Ok(reranker) => engine = engine.with_reranker(Arc::new(reranker)),
            Err(e) => warn!("Cross-encoder unavailable, skipping reranking: {e}"),
        }
    }

    let repo = RepositoryId::new(args.repo);
    let outcome = engine.search(&repo, &args.query).await.context("Search failed")?;

    if outcome.passages.is_empty() {
        println!("{} No results found", "✗".bright_red());
        return Ok(());
    }

    println!(
        "{} Found {} passages in {}ms\n",
        "✓".bright_green(),
        outcome.passages.len().bright_cyan(),
        outcome.stats.total_time_ms.bright_cyan()
    );

    for passage in &outcome.passages {
        println!(
            "{}. {} {}",
            (passage.rank + 1).bright_yellow(),
            passage.citation().bright_cyan(),
            passage
                .name
                .as_deref()
                .map(|n| format!("({n})"))
                .unwrap_or_default()
                .bright_black()
        );
        print!(
            "   {} {} (vector {:.3}, keyword {:.3})",
            "Score:".bright_black(),
            format!("{:.3}", passage.scores.combined).bright_green(),
            passage.scores.vector,
            passage.scores.keyword
        );
        if let Some(rerank_score) = passage.rerank_score {
            print!(" {} {rerank_score:.3}", "Rerank:".bright_black());
        }
        println!();

        if args.verbose {
            for line in passage.content.lines().take(10) {
                println!("   {}", line.dimmed());
            }
            if passage.content.lines().count() > 10 {
                println!("   {}", "...".dimmed());
            }
        }
        println!();
    }

    if args.verbose {
        println!("{}", "Search Statistics:".bright_blue());
        println!("  Embedding: {}ms", outcome.stats.embed_time_ms);
        println!(
            "  File narrowing: {}ms ({} candidates)",
            outcome.stats.file_stage_ms, outcome.stats.file_candidates
        );
        println!(
            "  Chunk retrieval: {}ms ({} candidates)",
            outcome.stats.chunk_stage_ms, outcome.stats.chunk_candidates
        );
        println!("  Reranking: {}ms", outcome.stats.rerank_time_ms);
        if outcome.stats.fallback_used {
            println!("  {} Unscoped fallback used", "⚠".bright_yellow());
        }
        if outcome.stats.cache_hit {
            println!("  {} Cache hit", "⚡".bright_yellow());
        }
    }

    Ok(())
}

async fn run_status(args: StatusArgs) -> Result<()> {
    let path = store_path(args.store);
    if !path.exists() {
        println!("{} Store not found at {}", "✗".bright_red(), path.display());
        println!("  Run 'repogpt ingest' to create one.");
        return Ok(());
    }

    let store = VectorStore::open(&path)
        .await
        .context("Failed to open vector store")?;

    println!("{} Store at {}", "▶".bright_blue(), path.display().bright_cyan());

    let repositories = store.repositories().await;
    if repositories.is_empty() {
        println!("  No repositories ingested.");
        return Ok(());
    }

    for repository in repositories {
        let chunks = store.chunk_count(&repository.id).await;
        let summaries = store.summary_count(&repository.id).await;
        println!(
            "  {} [{:?}] {} chunks, {} summaries",
            repository.id.bright_cyan(),
            repository.status,
            chunks.bright_cyan(),
            summaries.bright_cyan()
        );
    }

    Ok(())
}

async fn run_remove(args: RemoveArgs) -> Result<()> {
    let path = store_path(args.store);
    if !path.exists() {
        println!("{} Store not found at {}", "✗".bright_red(), path.display());
        return Ok(());
    }

    if !args.yes {
        print!(
            "Remove repository {} and all derived records? [y/N] ",
            args.repo
        );
        use std::io::{self, Write};
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let store = VectorStore::open(&path)
        .await
        .context("Failed to open vector store")?;
    store
        .remove_repository(&RepositoryId::new(args.repo.clone()))
        .await
        .with_context(|| format!("Failed to remove repository {}", args.repo))?;

    println!("{} Repository {} removed", "✓".bright_green(), args.repo.bright_cyan());

    Ok(())
}
