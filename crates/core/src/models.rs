use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Which portfolio entity a stored embedding row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Document,
    Paper,
    Project,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Document => "document",
            SourceKind::Paper => "paper",
            SourceKind::Project => "project",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "document" => Ok(SourceKind::Document),
            "paper" => Ok(SourceKind::Paper),
            "project" => Ok(SourceKind::Project),
            other => Err(format!(
                "unknown source type {other:?}, expected document, paper, or project"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub kind: SourceKind,
    pub id: Uuid,
}

/// One window of document text, derived during ingestion and not persisted
/// on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    pub content: String,
    pub index: usize,
    pub page: u32,
}

/// A row in the hosted embeddings table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub content: String,
    pub embedding: Vec<f32>,
    pub metadata: Value,
    pub source_kind: SourceKind,
    pub source_id: Uuid,
}

/// A row returned by the ranked similarity search.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoredRow {
    pub content: String,
    #[serde(default)]
    pub metadata: Value,
    #[serde(default)]
    pub similarity: f32,
}

/// A row fetched without similarity ranking.
#[derive(Debug, Clone, Deserialize)]
pub struct StoredRow {
    pub content: String,
    #[serde(default)]
    pub metadata: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct RetrievedPassage {
    pub content: String,
    pub metadata: Value,
    pub similarity: f32,
}

/// What a retrieval attempt actually produced.
///
/// `Degraded` means rows were fetched without similarity ranking because the
/// ranked search failed; callers decide how to surface that, instead of the
/// ranking failure being silently papered over.
#[derive(Debug, Clone)]
pub enum RetrievalOutcome {
    Ranked(Vec<RetrievedPassage>),
    Degraded {
        passages: Vec<RetrievedPassage>,
        reason: String,
    },
    Empty,
}

impl RetrievalOutcome {
    pub fn passages(&self) -> &[RetrievedPassage] {
        match self {
            RetrievalOutcome::Ranked(passages) => passages,
            RetrievalOutcome::Degraded { passages, .. } => passages,
            RetrievalOutcome::Empty => &[],
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, RetrievalOutcome::Degraded { .. })
    }
}

#[derive(Debug)]
pub struct SkippedChunk {
    pub index: usize,
    pub reason: String,
}

/// Outcome of ingesting one document's text. Per-chunk failures are recorded
/// here rather than failing the operation.
#[derive(Debug)]
pub struct IngestionReport {
    pub source: SourceRef,
    pub file_name: String,
    pub total_chunks: usize,
    pub embedded_count: usize,
    pub skipped: Vec<SkippedChunk>,
    pub ingested_at: DateTime<Utc>,
}
