use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),

    #[error("environment variable {name} still holds a placeholder value ({value}); set a real credential")]
    Placeholder { name: &'static str, value: String },

    #[error("environment variable {name} is not a valid url: {details}")]
    InvalidUrl { name: &'static str, details: String },

    #[error("invalid value for {name}: {details}")]
    InvalidValue { name: &'static str, details: String },
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("path has no file name: {0}")]
    MissingFileName(String),

    #[error("document has no readable text: {0}")]
    EmptyDocument(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

#[derive(Debug, Error)]
pub enum RagError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("embedding service returned an empty vector")]
    EmptyEmbedding,

    #[error("embedding has dimension {actual}, expected {expected}")]
    EmbeddingDimension { expected: usize, actual: usize },
}

pub type Result<T, E = RagError> = std::result::Result<T, E>;
