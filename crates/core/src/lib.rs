pub mod chat;
pub mod chunking;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod generation;
pub mod ingest;
pub mod models;
pub mod prompt;
pub mod retriever;
mod retry;
pub mod sse;
pub mod stores;
pub mod traits;

pub use chat::{collect_sources, ChatEvent, ChatPipeline, ChatStream, SUMMARY_PASSAGE_LIMIT};
pub use chunking::{split_text, ChunkingConfig, PLACEHOLDER_PAGE};
pub use config::{EmbeddingConfig, GenerationConfig, RagConfig, StoreConfig};
pub use embeddings::{Embedder, HttpEmbedder, DEFAULT_EMBEDDING_DIMENSIONS};
pub use error::{ConfigError, IngestError, RagError};
pub use extractor::{extract_document_text, LopdfExtractor, PdfExtractor};
pub use generation::{HttpGenerator, DONE_SENTINEL};
pub use ingest::{
    digest_content, discover_pdf_files, ingest_folder, ingest_text, FolderReport,
    IngestionOptions, SkippedFile,
};
pub use models::{
    EmbeddingRecord, IngestionReport, RetrievalOutcome, RetrievedPassage, ScoredRow,
    SkippedChunk, SourceKind, SourceRef, StoredRow, TextChunk,
};
pub use prompt::{PromptAssembler, TruncationPolicy, DEFAULT_PERSONA, NO_CONTEXT_SENTENCE};
pub use retriever::{RetrievalConfig, Retriever, FALLBACK_SIMILARITY};
pub use stores::PostgrestStore;
pub use traits::{TextGenerator, TokenStream, VectorStore};
