use crate::config::GenerationConfig;
use crate::error::RagError;
use crate::retry::with_retries;
use crate::traits::{TextGenerator, TokenStream};
use async_trait::async_trait;
use futures_util::{future, stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const DONE_SENTINEL: &str = "[DONE]";

/// Chat-completion client for an external endpoint speaking the
/// `data: {json}` / `data: [DONE]` server-sent-event dialect.
#[derive(Debug, Clone)]
pub struct HttpGenerator {
    client: Client,
    config: GenerationConfig,
    max_retries: u32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Deserialize)]
struct StreamFrame {
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Deserialize, Default)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

impl HttpGenerator {
    pub fn new(client: Client, config: GenerationConfig, max_retries: u32) -> Self {
        Self {
            client,
            config,
            max_retries,
        }
    }

    fn messages<'a>(&self, prompt: &'a str, system: Option<&'a str>) -> Vec<ChatMessage<'a>> {
        let mut messages = Vec::new();
        if let Some(system) = system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });
        messages
    }

    async fn request_completion(
        &self,
        prompt: &str,
        system: Option<&str>,
    ) -> Result<String, RagError> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&ChatRequest {
                model: &self.config.model,
                messages: self.messages(prompt, system),
                temperature: self.config.temperature,
                stream: false,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RagError::BackendResponse {
                backend: "llm".to_string(),
                details: response.status().to_string(),
            });
        }

        let payload: ChatResponse = response.json().await?;

        payload
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| RagError::BackendResponse {
                backend: "llm".to_string(),
                details: "completion had no choices".to_string(),
            })
    }
}

#[async_trait]
impl TextGenerator for HttpGenerator {
    async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, RagError> {
        with_retries("llm", self.max_retries, || {
            self.request_completion(prompt, system)
        })
        .await
    }

    async fn stream(&self, prompt: &str, system: Option<&str>) -> Result<TokenStream, RagError> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&ChatRequest {
                model: &self.config.model,
                messages: self.messages(prompt, system),
                temperature: self.config.temperature,
                stream: true,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RagError::BackendResponse {
                backend: "llm".to_string(),
                details: response.status().to_string(),
            });
        }

        let tokens = response
            .bytes_stream()
            .scan((String::new(), false), |(buffer, done), chunk| {
                if *done {
                    return future::ready(None);
                }

                let pieces = match chunk {
                    Ok(bytes) => {
                        buffer.push_str(&String::from_utf8_lossy(&bytes));
                        drain_sse_frames(buffer, done)
                    }
                    Err(error) => vec![Err(RagError::from(error))],
                };

                future::ready(Some(stream::iter(pieces)))
            })
            .flatten()
            .boxed();

        Ok(tokens)
    }
}

/// Pulls every complete `data:` line out of `buffer`, leaving any partial
/// trailing line in place for the next network read. Sets `done` when the
/// end-of-stream sentinel arrives.
fn drain_sse_frames(buffer: &mut String, done: &mut bool) -> Vec<Result<String, RagError>> {
    let mut pieces = Vec::new();

    while let Some(position) = buffer.find('\n') {
        let line = buffer[..position].trim().to_string();
        buffer.drain(..=position);

        if *done {
            continue;
        }

        let Some(data) = line.strip_prefix("data:") else {
            continue;
        };
        let data = data.trim();

        if data == DONE_SENTINEL {
            *done = true;
            continue;
        }

        if let Ok(frame) = serde_json::from_str::<StreamFrame>(data) {
            for choice in frame.choices {
                if let Some(content) = choice.delta.content {
                    if !content.is_empty() {
                        pieces.push(Ok(content));
                    }
                }
            }
        }
    }

    pieces
}
