use crate::chunking::{split_text, ChunkingConfig};
use crate::embeddings::Embedder;
use crate::error::{IngestError, RagError};
use crate::extractor::extract_document_text;
use crate::models::{
    EmbeddingRecord, IngestionReport, SkippedChunk, SourceKind, SourceRef, TextChunk,
};
use crate::traits::VectorStore;
use chrono::Utc;
use futures_util::{stream, StreamExt};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy)]
pub struct IngestionOptions {
    pub chunking: ChunkingConfig,
    pub embed_concurrency: usize,
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            chunking: ChunkingConfig::default(),
            embed_concurrency: 4,
        }
    }
}

/// Chunks one document's text, embeds the chunks with a bounded fan-out, and
/// stores the rows in chunk order.
///
/// A chunk whose embedding or insert fails is logged, recorded in the
/// report, and skipped; the operation itself always completes.
pub async fn ingest_text<E, S>(
    embedder: &E,
    store: &S,
    source: SourceRef,
    file_name: &str,
    text: &str,
    options: IngestionOptions,
) -> IngestionReport
where
    E: Embedder + Sync,
    S: VectorStore + Sync,
{
    let chunks = split_text(text, options.chunking);
    let total_chunks = chunks.len();
    let concurrency = options.embed_concurrency.max(1);

    debug!(
        source_type = %source.kind,
        source_id = %source.id,
        total_chunks,
        concurrency,
        "embedding document chunks"
    );

    let embedded: Vec<(TextChunk, Result<Vec<f32>, RagError>)> =
        stream::iter(chunks)
            .map(|chunk| async move {
                let vector = embedder.embed(&chunk.content).await;
                (chunk, vector)
            })
            .buffered(concurrency)
            .collect()
            .await;

    let mut embedded_count = 0usize;
    let mut skipped = Vec::new();

    for (chunk, embedding) in embedded {
        let embedding = match embedding {
            Ok(vector) => vector,
            Err(error) => {
                warn!(chunk_index = chunk.index, error = %error, "skipping chunk, embedding failed");
                skipped.push(SkippedChunk {
                    index: chunk.index,
                    reason: error.to_string(),
                });
                continue;
            }
        };

        let record = EmbeddingRecord {
            metadata: json!({
                "file_name": file_name,
                "page": chunk.page,
                "chunk_index": chunk.index,
                "content_sha256": digest_content(&chunk.content),
            }),
            content: chunk.content,
            embedding,
            source_kind: source.kind,
            source_id: source.id,
        };

        match store.insert(&record).await {
            Ok(()) => embedded_count += 1,
            Err(error) => {
                warn!(chunk_index = chunk.index, error = %error, "skipping chunk, insert failed");
                skipped.push(SkippedChunk {
                    index: chunk.index,
                    reason: error.to_string(),
                });
            }
        }
    }

    IngestionReport {
        source,
        file_name: file_name.to_string(),
        total_chunks,
        embedded_count,
        skipped,
        ingested_at: Utc::now(),
    }
}

pub fn digest_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn discover_pdf_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let is_pdf = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

        if is_pdf {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

pub struct FolderReport {
    pub reports: Vec<IngestionReport>,
    pub skipped_files: Vec<SkippedFile>,
}

/// Seeds the store from a folder of PDFs, best-effort: files that fail text
/// extraction are reported and skipped, never aborting the run. Each file
/// becomes its own source with a fresh id.
pub async fn ingest_folder<E, S>(
    embedder: &E,
    store: &S,
    folder: &Path,
    kind: SourceKind,
    options: IngestionOptions,
) -> Result<FolderReport, IngestError>
where
    E: Embedder + Sync,
    S: VectorStore + Sync,
{
    let files = discover_pdf_files(folder);

    if files.is_empty() {
        return Err(IngestError::InvalidArgument(format!(
            "no pdf files found in {}",
            folder.display()
        )));
    }

    let mut reports = Vec::new();
    let mut skipped_files = Vec::new();

    for path in files {
        let prepared = (|| {
            let file_name = path
                .file_name()
                .and_then(|name| name.to_str())
                .ok_or_else(|| {
                    IngestError::MissingFileName(format!(
                        "path missing filename: {}",
                        path.display()
                    ))
                })?
                .to_string();
            let text = extract_document_text(&path)?;
            Ok::<_, IngestError>((file_name, text))
        })();

        match prepared {
            Ok((file_name, text)) => {
                let source = SourceRef {
                    kind,
                    id: Uuid::new_v4(),
                };
                reports.push(ingest_text(embedder, store, source, &file_name, &text, options).await);
            }
            Err(error) => skipped_files.push(SkippedFile {
                path,
                reason: error.to_string(),
            }),
        }
    }

    Ok(FolderReport {
        reports,
        skipped_files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RagError;
    use crate::models::{ScoredRow, StoredRow};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::tempdir;

    const FAIL_MARKER: &str = "UNEMBEDDABLE";

    struct MarkerEmbedder;

    #[async_trait]
    impl Embedder for MarkerEmbedder {
        fn dimensions(&self) -> usize {
            3
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
            if text.contains(FAIL_MARKER) {
                return Err(RagError::EmptyEmbedding);
            }
            Ok(vec![0.1, 0.2, 0.3])
        }
    }

    #[derive(Default)]
    struct RecordingStore {
        rows: Mutex<Vec<EmbeddingRecord>>,
    }

    #[async_trait]
    impl VectorStore for RecordingStore {
        async fn insert(&self, record: &EmbeddingRecord) -> Result<(), RagError> {
            self.rows.lock().unwrap().push(record.clone());
            Ok(())
        }

        async fn search_ranked(
            &self,
            _query_vector: &[f32],
            _threshold: f32,
            _limit: usize,
            _kind: Option<SourceKind>,
            _id: Option<Uuid>,
        ) -> Result<Vec<ScoredRow>, RagError> {
            Ok(Vec::new())
        }

        async fn fetch_unranked(
            &self,
            _kind: Option<SourceKind>,
            _id: Option<Uuid>,
            _limit: usize,
        ) -> Result<Vec<StoredRow>, RagError> {
            Ok(Vec::new())
        }
    }

    fn digits(length: usize) -> String {
        (0..length)
            .map(|value| char::from(b'0' + (value % 10) as u8))
            .collect()
    }

    fn options() -> IngestionOptions {
        IngestionOptions {
            chunking: ChunkingConfig {
                window_chars: 1_000,
                overlap_chars: 200,
            },
            embed_concurrency: 3,
        }
    }

    fn source() -> SourceRef {
        SourceRef {
            kind: SourceKind::Document,
            id: Uuid::new_v4(),
        }
    }

    #[tokio::test]
    async fn ingestion_stores_all_chunks_in_order() {
        let store = RecordingStore::default();
        let text = digits(2_500);

        let report =
            ingest_text(&MarkerEmbedder, &store, source(), "cv.pdf", &text, options()).await;

        assert_eq!(report.total_chunks, 4);
        assert_eq!(report.embedded_count, 4);
        assert!(report.skipped.is_empty());

        let rows = store.rows.lock().unwrap();
        let indexes: Vec<u64> = rows
            .iter()
            .map(|row| row.metadata["chunk_index"].as_u64().unwrap())
            .collect();
        assert_eq!(indexes, vec![0, 1, 2, 3]);
        assert_eq!(rows[0].metadata["file_name"], "cv.pdf");
        assert_eq!(rows[0].metadata["page"], 1);
    }

    #[tokio::test]
    async fn one_failed_embedding_skips_only_that_chunk() {
        let store = RecordingStore::default();

        // The marker sits in the region covered only by the second window,
        // past the first window's end and before the third window's start.
        let mut text = digits(2_500);
        text.replace_range(1_100..1_100 + FAIL_MARKER.len(), FAIL_MARKER);

        let report =
            ingest_text(&MarkerEmbedder, &store, source(), "cv.pdf", &text, options()).await;

        assert_eq!(report.total_chunks, 4);
        assert_eq!(report.embedded_count, 3);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].index, 1);
        assert_eq!(report.embedded_count, report.total_chunks - report.skipped.len());

        let rows = store.rows.lock().unwrap();
        let indexes: Vec<u64> = rows
            .iter()
            .map(|row| row.metadata["chunk_index"].as_u64().unwrap())
            .collect();
        assert_eq!(indexes, vec![0, 2, 3]);
    }

    #[tokio::test]
    async fn empty_text_reports_zero_chunks() {
        let store = RecordingStore::default();

        let report = ingest_text(&MarkerEmbedder, &store, source(), "empty.pdf", "", options()).await;

        assert_eq!(report.total_chunks, 0);
        assert_eq!(report.embedded_count, 0);
        assert!(store.rows.lock().unwrap().is_empty());
    }

    #[test]
    fn content_digest_is_reproducible() {
        assert_eq!(digest_content("abc"), digest_content("abc"));
        assert_ne!(digest_content("abc"), digest_content("abd"));
        assert_eq!(digest_content("abc").len(), 64);
    }

    #[test]
    fn discover_pdf_files_is_recursive_and_sorted() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("nested");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(dir.path().join("b.pdf"), b"%PDF-1.4\n%fake").unwrap();
        std::fs::write(nested.join("a.pdf"), b"%PDF-1.4\n%fake").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"not a pdf").unwrap();

        let files = discover_pdf_files(dir.path());
        assert_eq!(files.len(), 2);
    }

    #[tokio::test]
    async fn folder_ingestion_fails_without_pdfs() {
        let dir = tempdir().unwrap();
        let store = RecordingStore::default();

        let result = ingest_folder(
            &MarkerEmbedder,
            &store,
            dir.path(),
            SourceKind::Document,
            options(),
        )
        .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn folder_ingestion_skips_unreadable_pdfs() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("broken.pdf"), b"%PDF-1.4\n%broken").unwrap();
        let store = RecordingStore::default();

        let report = ingest_folder(
            &MarkerEmbedder,
            &store,
            dir.path(),
            SourceKind::Document,
            options(),
        )
        .await
        .expect("best-effort run should succeed");

        assert!(report.reports.is_empty());
        assert_eq!(report.skipped_files.len(), 1);
        assert_eq!(
            report.skipped_files[0]
                .path
                .file_name()
                .and_then(|name| name.to_str()),
            Some("broken.pdf")
        );
    }
}
