use crate::embeddings::Embedder;
use crate::error::RagError;
use crate::models::{RetrievalOutcome, RetrievedPassage, SourceKind};
use crate::prompt::PromptAssembler;
use crate::retriever::Retriever;
use crate::traits::{TextGenerator, VectorStore};
use futures_util::stream::BoxStream;
use futures_util::{stream, StreamExt};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

/// How many stored passages feed one structured summary.
pub const SUMMARY_PASSAGE_LIMIT: usize = 20;

/// Increments of one chat turn, in emission order: content fragments, then
/// the deduplicated source labels, then the end marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    Content(String),
    Sources(Vec<String>),
    Done,
}

pub type ChatStream = BoxStream<'static, Result<ChatEvent, RagError>>;

/// One chat turn walks embed-query, search, prompt, stream. The first two
/// stages fail soft: a turn with a broken embedder or store still answers,
/// with degraded or empty context, rather than aborting.
pub struct ChatPipeline<E, S, G> {
    retriever: Retriever<E, S>,
    generator: G,
    assembler: PromptAssembler,
}

impl<E, S, G> ChatPipeline<E, S, G>
where
    E: Embedder + Send + Sync,
    S: VectorStore + Send + Sync,
    G: TextGenerator + Send + Sync,
{
    pub fn new(retriever: Retriever<E, S>, generator: G, assembler: PromptAssembler) -> Self {
        Self {
            retriever,
            generator,
            assembler,
        }
    }

    pub async fn answer(
        &self,
        question: &str,
        kind: Option<SourceKind>,
        id: Option<Uuid>,
    ) -> Result<ChatStream, RagError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(RagError::InvalidInput("question is required".to_string()));
        }

        let outcome = match self.retriever.search(question, kind, id).await {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!(error = %error, "retrieval unavailable, answering without context");
                RetrievalOutcome::Empty
            }
        };

        if let RetrievalOutcome::Degraded { reason, .. } = &outcome {
            warn!(reason = %reason, "similarity ranking degraded for this turn");
        }

        let sources = collect_sources(outcome.passages());
        let context = self.assembler.build_context(outcome.passages());
        let prompt = self.assembler.build_prompt(question, &context);

        let tokens = self
            .generator
            .stream(&prompt, Some(self.assembler.system_prompt()))
            .await?;

        let tail = stream::iter([Ok(ChatEvent::Sources(sources)), Ok(ChatEvent::Done)]);

        Ok(tokens
            .map(|piece| piece.map(ChatEvent::Content))
            .chain(tail)
            .boxed())
    }

    /// Structured summary of one source's stored content, through the same
    /// truncation policy as chat context.
    pub async fn summarize_source(
        &self,
        title: &str,
        kind: SourceKind,
        id: Uuid,
    ) -> Result<String, RagError> {
        let rows = self
            .retriever
            .fetch_source_rows(kind, id, SUMMARY_PASSAGE_LIMIT)
            .await?;

        if rows.is_empty() {
            return Err(RagError::InvalidInput(format!(
                "no stored content for {kind} {id}"
            )));
        }

        let body = rows
            .iter()
            .map(|row| row.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let prompt = self.assembler.build_summary_prompt(title, &body);
        self.generator.generate(&prompt, None).await
    }
}

/// Order-preserving deduplication of passage labels: file name when present,
/// then title, then a generic fallback.
pub fn collect_sources(passages: &[RetrievedPassage]) -> Vec<String> {
    let mut sources: Vec<String> = Vec::new();

    for passage in passages {
        let label = passage
            .metadata
            .get("file_name")
            .and_then(Value::as_str)
            .or_else(|| passage.metadata.get("title").and_then(Value::as_str))
            .unwrap_or("document")
            .to_string();

        if !sources.contains(&label) {
            sources.push(label);
        }
    }

    sources
}
