use crate::embeddings::Embedder;
use crate::error::RagError;
use crate::models::{RetrievalOutcome, RetrievedPassage, SourceKind, StoredRow};
use crate::traits::VectorStore;
use tracing::warn;
use uuid::Uuid;

/// Similarity assigned to rows served without ranking, inherited from the
/// source pipeline's fallback constant.
pub const FALLBACK_SIMILARITY: f32 = 0.8;

#[derive(Debug, Clone, Copy)]
pub struct RetrievalConfig {
    pub match_threshold: f32,
    pub match_limit: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            match_threshold: 0.7,
            match_limit: 5,
        }
    }
}

pub struct Retriever<E, S> {
    embedder: E,
    store: S,
    config: RetrievalConfig,
}

impl<E, S> Retriever<E, S>
where
    E: Embedder + Send + Sync,
    S: VectorStore + Send + Sync,
{
    pub fn new(embedder: E, store: S, config: RetrievalConfig) -> Self {
        Self {
            embedder,
            store,
            config,
        }
    }

    /// Embeds the question and runs the ranked similarity search.
    ///
    /// Zero rows is `Empty`, not an error. When the ranked search itself
    /// fails, rows are fetched unranked and tagged `Degraded` with the
    /// failure reason, so callers can surface the loss of ranking instead of
    /// silently serving it as the real thing.
    pub async fn search(
        &self,
        question: &str,
        kind: Option<SourceKind>,
        id: Option<Uuid>,
    ) -> Result<RetrievalOutcome, RagError> {
        if question.trim().is_empty() {
            return Err(RagError::InvalidInput("query is empty".to_string()));
        }

        let query_vector = self.embedder.embed(question).await?;

        let ranked = self
            .store
            .search_ranked(
                &query_vector,
                self.config.match_threshold,
                self.config.match_limit,
                kind,
                id,
            )
            .await;

        match ranked {
            Ok(rows) if rows.is_empty() => Ok(RetrievalOutcome::Empty),
            Ok(rows) => {
                let mut passages: Vec<RetrievedPassage> = rows
                    .into_iter()
                    .map(|row| RetrievedPassage {
                        content: row.content,
                        metadata: row.metadata,
                        similarity: row.similarity,
                    })
                    .collect();

                passages.sort_by(|left, right| right.similarity.total_cmp(&left.similarity));
                Ok(RetrievalOutcome::Ranked(passages))
            }
            Err(error) => {
                warn!(error = %error, "ranked search unavailable, falling back to unranked rows");

                let rows = self
                    .store
                    .fetch_unranked(kind, id, self.config.match_limit)
                    .await?;

                if rows.is_empty() {
                    return Ok(RetrievalOutcome::Empty);
                }

                Ok(RetrievalOutcome::Degraded {
                    passages: rows
                        .into_iter()
                        .map(|row| RetrievedPassage {
                            content: row.content,
                            metadata: row.metadata,
                            similarity: FALLBACK_SIMILARITY,
                        })
                        .collect(),
                    reason: error.to_string(),
                })
            }
        }
    }

    /// All stored rows for one source, without ranking.
    pub async fn fetch_source_rows(
        &self,
        kind: SourceKind,
        id: Uuid,
        limit: usize,
    ) -> Result<Vec<StoredRow>, RagError> {
        self.store.fetch_unranked(Some(kind), Some(id), limit).await
    }
}
