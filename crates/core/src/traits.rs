use crate::error::RagError;
use crate::models::{EmbeddingRecord, ScoredRow, SourceKind, StoredRow};
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use uuid::Uuid;

/// Lazy, finite sequence of text increments from the model endpoint.
pub type TokenStream = BoxStream<'static, Result<String, RagError>>;

#[async_trait]
pub trait VectorStore {
    /// Stores one embedding row.
    async fn insert(&self, record: &EmbeddingRecord) -> Result<(), RagError>;

    /// Rows ranked most-similar first with similarity >= `threshold`, capped
    /// at `limit`. Backend failures are returned, never papered over.
    async fn search_ranked(
        &self,
        query_vector: &[f32],
        threshold: f32,
        limit: usize,
        kind: Option<SourceKind>,
        id: Option<Uuid>,
    ) -> Result<Vec<ScoredRow>, RagError>;

    /// Rows without similarity ranking, for the degraded retrieval path and
    /// for source-scoped content fetches.
    async fn fetch_unranked(
        &self,
        kind: Option<SourceKind>,
        id: Option<Uuid>,
        limit: usize,
    ) -> Result<Vec<StoredRow>, RagError>;
}

#[async_trait]
pub trait TextGenerator {
    /// One complete response.
    async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, RagError>;

    /// A non-restartable stream of text increments; dropping the stream is
    /// how a consumer cancels.
    async fn stream(&self, prompt: &str, system: Option<&str>) -> Result<TokenStream, RagError>;
}
