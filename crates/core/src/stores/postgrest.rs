use crate::config::StoreConfig;
use crate::error::RagError;
use crate::models::{EmbeddingRecord, ScoredRow, SourceKind, StoredRow};
use crate::traits::VectorStore;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use uuid::Uuid;

/// Embeddings-table accessor over a PostgREST-style HTTP surface: inserts and
/// ranked similarity search go through SQL functions exposed as RPC
/// endpoints, unranked fetches read the table directly.
pub struct PostgrestStore {
    client: Client,
    base_url: String,
    service_key: String,
}

impl PostgrestStore {
    pub fn new(client: Client, config: &StoreConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            service_key: config.service_key.clone(),
        }
    }

    fn rpc_url(&self, function: &str) -> String {
        format!("{}/rest/v1/rpc/{}", self.base_url, function)
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }
}

#[async_trait]
impl VectorStore for PostgrestStore {
    async fn insert(&self, record: &EmbeddingRecord) -> Result<(), RagError> {
        let response = self
            .authorized(self.client.post(self.rpc_url("insert_embedding")))
            .json(&json!({
                "p_content": record.content,
                "p_embedding": record.embedding,
                "p_metadata": record.metadata,
                "p_source_type": record.source_kind,
                "p_source_id": record.source_id,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RagError::BackendResponse {
                backend: "store".to_string(),
                details: format!("insert_embedding returned {}", response.status()),
            });
        }

        Ok(())
    }

    async fn search_ranked(
        &self,
        query_vector: &[f32],
        threshold: f32,
        limit: usize,
        kind: Option<SourceKind>,
        id: Option<Uuid>,
    ) -> Result<Vec<ScoredRow>, RagError> {
        let response = self
            .authorized(self.client.post(self.rpc_url("match_embeddings")))
            .json(&json!({
                "query_embedding": query_vector,
                "match_threshold": threshold,
                "match_count": limit,
                "source_type_filter": kind,
                "source_id_filter": id,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RagError::BackendResponse {
                backend: "store".to_string(),
                details: format!("match_embeddings returned {}", response.status()),
            });
        }

        Ok(response.json().await?)
    }

    async fn fetch_unranked(
        &self,
        kind: Option<SourceKind>,
        id: Option<Uuid>,
        limit: usize,
    ) -> Result<Vec<StoredRow>, RagError> {
        let mut query = vec![
            ("select".to_string(), "content,metadata".to_string()),
            ("limit".to_string(), limit.to_string()),
        ];

        if let Some(kind) = kind {
            query.push(("source_type".to_string(), format!("eq.{kind}")));
        }
        if let Some(id) = id {
            query.push(("source_id".to_string(), format!("eq.{id}")));
        }

        let response = self
            .authorized(self.client.get(self.table_url("embeddings")))
            .query(&query)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RagError::BackendResponse {
                backend: "store".to_string(),
                details: format!("embeddings fetch returned {}", response.status()),
            });
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranked_rows_parse_from_rpc_payload() {
        let payload = r#"[
            {"content": "first", "metadata": {"file_name": "cv.pdf"}, "similarity": 0.91},
            {"content": "second", "similarity": 0.74}
        ]"#;

        let rows: Vec<ScoredRow> = serde_json::from_str(payload).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].metadata["file_name"], "cv.pdf");
        assert!(rows[1].metadata.is_null());
        assert!((rows[1].similarity - 0.74).abs() < f32::EPSILON);
    }

    #[test]
    fn unranked_rows_parse_without_similarity() {
        let payload = r#"[{"content": "plain", "metadata": {}}]"#;
        let rows: Vec<StoredRow> = serde_json::from_str(payload).unwrap();

        assert_eq!(rows[0].content, "plain");
    }

    #[test]
    fn source_filters_render_as_postgrest_predicates() {
        assert_eq!(format!("eq.{}", SourceKind::Paper), "eq.paper");
    }
}
