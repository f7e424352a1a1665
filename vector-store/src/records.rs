use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an ingested repository
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepositoryId(String);

impl RepositoryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RepositoryId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Identifier the store assigns to a chunk at insert time. Stable across
/// queries, used for dedup and deterministic tie-breaking.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ChunkId(pub u64);

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of an ingested repository.
///
/// Advisory from the retrieval engine's perspective: ingestion is
/// incremental and searches over partially indexed data are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepositoryStatus {
    Pending,
    Indexing,
    Ready,
    Failed,
}

/// A node in a repository's file tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileNode {
    pub name: String,
    pub path: String,
    pub kind: FileNodeKind,
    #[serde(default)]
    pub children: Vec<FileNode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileNodeKind {
    File,
    Directory,
}

/// A unit of ingested source code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub id: RepositoryId,

    /// Where the source was cloned from
    pub source_url: String,

    pub display_name: String,

    /// Owning user
    pub owner_id: String,

    pub status: RepositoryStatus,

    /// Hierarchical directory/file listing, populated by ingestion
    #[serde(default)]
    pub file_tree: Option<FileNode>,

    pub created_at: DateTime<Utc>,
}

/// AST-derived classification of a code chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkKind {
    Function,
    Class,
    Import,
    #[default]
    Code,
}

/// A contiguous span of source text within one file of one repository.
/// Created during ingestion, immutable afterward. Multiple chunks may share
/// a file path; overlapping spans are permitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeChunk {
    /// Path of the file containing this chunk, relative to the repo root
    pub file_path: String,

    /// The raw source text
    pub content: String,

    /// Starting line number (1-indexed)
    pub start_line: u32,

    /// Ending line number (1-indexed, inclusive)
    pub end_line: u32,

    #[serde(default)]
    pub kind: ChunkKind,

    /// Human-readable name for function/class chunks
    #[serde(default)]
    pub name: Option<String>,
}

impl CodeChunk {
    pub fn new(
        file_path: impl Into<String>,
        start_line: u32,
        end_line: u32,
        content: impl Into<String>,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            content: content.into(),
            start_line,
            end_line,
            kind: ChunkKind::default(),
            name: None,
        }
    }

    /// Number of lines spanned by this chunk
    pub fn line_count(&self) -> u32 {
        if self.end_line >= self.start_line {
            self.end_line - self.start_line + 1
        } else {
            0
        }
    }
}

/// A code chunk together with its ingestion-time embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub chunk: CodeChunk,
    pub embedding: Vec<f32>,
}

/// LLM-generated abstractive summary of one file. Unique per
/// (repository, file path); created during ingestion, immutable afterward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSummary {
    pub file_path: String,

    pub summary: String,

    /// Notable symbol names extracted alongside the summary
    #[serde(default)]
    pub key_components: Vec<String>,
}

impl FileSummary {
    /// The text surface both retrieval stages score against. Ingestion
    /// embeds this exact composition, so the lexical scorer must see the
    /// same string at query time.
    pub fn searchable_text(&self) -> String {
        format!(
            "{} Components: {}",
            self.summary,
            self.key_components.join(", ")
        )
    }
}

/// A file summary together with its ingestion-time embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub summary: FileSummary,
    pub embedding: Vec<f32>,
}

/// Import mechanism behind a dependency edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    Esm,
    CommonJs,
    PythonImport,
    Other,
}

/// A directed `source file -> target module` edge within a repository.
/// Stored for downstream cross-file reasoning; retrieval never consumes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDependency {
    pub source_file_path: String,
    pub target_module: String,
    pub kind: DependencyKind,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_chunk_creation() {
        let chunk = CodeChunk::new("test.rs", 1, 5, "fn main() {}");
        assert_eq!(chunk.file_path, "test.rs");
        assert_eq!(chunk.start_line, 1);
        assert_eq!(chunk.end_line, 5);
        assert_eq!(chunk.line_count(), 5);
        assert_eq!(chunk.kind, ChunkKind::Code);
    }

    #[test]
    fn test_chunk_line_count() {
        let chunk = CodeChunk::new("test.rs", 10, 20, "code");
        assert_eq!(chunk.line_count(), 11);
    }

    #[test]
    fn test_summary_searchable_text() {
        let summary = FileSummary {
            file_path: "src/auth.rs".to_string(),
            summary: "Handles user authentication.".to_string(),
            key_components: vec!["login".to_string(), "verify_token".to_string()],
        };

        assert_eq!(
            summary.searchable_text(),
            "Handles user authentication. Components: login, verify_token"
        );
    }

    #[test]
    fn test_summary_searchable_text_no_components() {
        let summary = FileSummary {
            file_path: "src/lib.rs".to_string(),
            summary: "Crate root.".to_string(),
            key_components: vec![],
        };

        assert_eq!(summary.searchable_text(), "Crate root. Components: ");
    }

    #[test]
    fn test_chunk_kind_serde() {
        let json = serde_json::to_string(&ChunkKind::Function).unwrap();
        assert_eq!(json, "\"function\"");

        let kind: ChunkKind = serde_json::from_str("\"class\"").unwrap();
        assert_eq!(kind, ChunkKind::Class);
    }

    #[test]
    fn test_chunk_record_defaults() {
        let json = r#"{
            "chunk": {
                "file_path": "a.py",
                "content": "import os",
                "start_line": 1,
                "end_line": 1
            },
            "embedding": [0.1, 0.2]
        }"#;

        let record: ChunkRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.chunk.kind, ChunkKind::Code);
        assert_eq!(record.chunk.name, None);
    }
}
