use crate::chunking::ChunkingConfig;
use crate::error::ConfigError;
use crate::prompt::DEFAULT_PERSONA;
use crate::retriever::RetrievalConfig;
use std::str::FromStr;
use url::Url;

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_LLM_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 50_000;
pub const DEFAULT_EMBED_CONCURRENCY: usize = 4;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Connection settings for the hosted embeddings table.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub base_url: String,
    pub service_key: String,
}

/// Connection settings for the external embedding endpoint.
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub dimensions: usize,
}

/// Connection settings for the external chat-completion endpoint.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
}

/// Everything the pipeline needs, resolved from the environment up front.
///
/// Missing, empty, or placeholder values fail here with a message naming the
/// variable, before any network call is made.
#[derive(Debug, Clone)]
pub struct RagConfig {
    pub store: StoreConfig,
    pub embedding: EmbeddingConfig,
    pub generation: GenerationConfig,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub persona: String,
    pub max_context_chars: usize,
    pub embed_concurrency: usize,
    pub max_retries: u32,
    pub timeout_secs: u64,
}

impl RagConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store = StoreConfig {
            base_url: required_url(&lookup, "STORE_URL")?,
            service_key: required(&lookup, "STORE_SERVICE_KEY")?,
        };

        let embedding = EmbeddingConfig {
            endpoint: required_url(&lookup, "EMBEDDING_API_URL")?,
            api_key: required(&lookup, "EMBEDDING_API_KEY")?,
            model: optional(&lookup, "EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            dimensions: parsed(&lookup, "EMBEDDING_DIMENSIONS", 1_536)?,
        };

        let generation = GenerationConfig {
            endpoint: required_url(&lookup, "LLM_API_URL")?,
            api_key: required(&lookup, "LLM_API_KEY")?,
            model: optional(&lookup, "LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            temperature: parsed(&lookup, "LLM_TEMPERATURE", DEFAULT_LLM_TEMPERATURE)?,
        };

        let chunking = ChunkingConfig {
            window_chars: parsed(&lookup, "CHUNK_WINDOW_CHARS", ChunkingConfig::default().window_chars)?,
            overlap_chars: parsed(&lookup, "CHUNK_OVERLAP_CHARS", ChunkingConfig::default().overlap_chars)?,
        };

        if chunking.window_chars == 0 {
            return Err(ConfigError::InvalidValue {
                name: "CHUNK_WINDOW_CHARS",
                details: "window must be at least 1 character".to_string(),
            });
        }

        if chunking.overlap_chars >= chunking.window_chars {
            return Err(ConfigError::InvalidValue {
                name: "CHUNK_OVERLAP_CHARS",
                details: format!(
                    "overlap {} must be smaller than window {}",
                    chunking.overlap_chars, chunking.window_chars
                ),
            });
        }

        let retrieval = RetrievalConfig {
            match_threshold: parsed(&lookup, "MATCH_THRESHOLD", RetrievalConfig::default().match_threshold)?,
            match_limit: parsed(&lookup, "MATCH_LIMIT", RetrievalConfig::default().match_limit)?,
        };

        Ok(Self {
            store,
            embedding,
            generation,
            chunking,
            retrieval,
            persona: optional(&lookup, "ASSISTANT_PERSONA")
                .unwrap_or_else(|| DEFAULT_PERSONA.to_string()),
            max_context_chars: parsed(&lookup, "MAX_CONTEXT_CHARS", DEFAULT_MAX_CONTEXT_CHARS)?,
            embed_concurrency: parsed(&lookup, "EMBED_CONCURRENCY", DEFAULT_EMBED_CONCURRENCY)?,
            max_retries: parsed(&lookup, "MAX_RETRIES", DEFAULT_MAX_RETRIES)?,
            timeout_secs: parsed(&lookup, "HTTP_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
        })
    }
}

fn optional<F>(lookup: &F, name: &'static str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = optional(lookup, name).ok_or(ConfigError::MissingVar(name))?;

    if is_placeholder(&value) {
        return Err(ConfigError::Placeholder { name, value });
    }

    Ok(value)
}

fn required_url<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = required(lookup, name)?;

    Url::parse(&value).map_err(|error| ConfigError::InvalidUrl {
        name,
        details: error.to_string(),
    })?;

    Ok(value.trim_end_matches('/').to_string())
}

fn parsed<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional(lookup, name) {
        Some(value) => value.parse().map_err(|error: T::Err| ConfigError::InvalidValue {
            name,
            details: error.to_string(),
        }),
        None => Ok(default),
    }
}

fn is_placeholder(value: &str) -> bool {
    let lowered = value.to_lowercase();
    lowered.starts_with("your-")
        || lowered.contains("placeholder")
        || lowered.contains("example.com")
        || lowered == "changeme"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_vars() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("STORE_URL", "https://abc.supabase.co"),
            ("STORE_SERVICE_KEY", "service-role-key"),
            ("EMBEDDING_API_URL", "https://api.llm.test/v1/embeddings"),
            ("EMBEDDING_API_KEY", "embed-key"),
            ("LLM_API_URL", "https://api.llm.test/v1/chat/completions"),
            ("LLM_API_KEY", "llm-key"),
        ])
    }

    fn config_from(vars: HashMap<&'static str, &'static str>) -> Result<RagConfig, ConfigError> {
        RagConfig::from_lookup(|name| vars.get(name).map(|value| value.to_string()))
    }

    #[test]
    fn minimal_environment_resolves_with_defaults() {
        let config = config_from(base_vars()).expect("minimal env should resolve");

        assert_eq!(config.chunking.window_chars, 1_000);
        assert_eq!(config.chunking.overlap_chars, 200);
        assert_eq!(config.retrieval.match_limit, 5);
        assert_eq!(config.embedding.model, DEFAULT_EMBEDDING_MODEL);
        assert_eq!(config.max_context_chars, DEFAULT_MAX_CONTEXT_CHARS);
        assert_eq!(config.store.base_url, "https://abc.supabase.co");
    }

    #[test]
    fn missing_variable_names_the_variable() {
        let mut vars = base_vars();
        vars.remove("LLM_API_KEY");

        let error = config_from(vars).expect_err("missing key must fail");
        assert!(error.to_string().contains("LLM_API_KEY"));
    }

    #[test]
    fn placeholder_credential_is_rejected() {
        let mut vars = base_vars();
        vars.insert("STORE_SERVICE_KEY", "your-service-key");

        let error = config_from(vars).expect_err("placeholder must fail");
        assert!(matches!(error, ConfigError::Placeholder { name: "STORE_SERVICE_KEY", .. }));
    }

    #[test]
    fn invalid_store_url_is_rejected() {
        let mut vars = base_vars();
        vars.insert("STORE_URL", "not a url");

        let error = config_from(vars).expect_err("bad url must fail");
        assert!(matches!(error, ConfigError::InvalidUrl { name: "STORE_URL", .. }));
    }

    #[test]
    fn overlap_must_stay_below_window() {
        let mut vars = base_vars();
        vars.insert("CHUNK_WINDOW_CHARS", "100");
        vars.insert("CHUNK_OVERLAP_CHARS", "100");

        let error = config_from(vars).expect_err("overlap >= window must fail");
        assert!(matches!(error, ConfigError::InvalidValue { name: "CHUNK_OVERLAP_CHARS", .. }));
    }

    #[test]
    fn trailing_slash_is_stripped_from_urls() {
        let mut vars = base_vars();
        vars.insert("STORE_URL", "https://abc.supabase.co/");

        let config = config_from(vars).expect("env should resolve");
        assert_eq!(config.store.base_url, "https://abc.supabase.co");
    }
}
