//! Chat completion client
//!
//! Talks to an OpenAI-compatible chat completions endpoint. Streaming
//! responses arrive as SSE `data:` lines and are exposed as a token
//! stream, which feeds the sentence splitter during answer playback.

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::config::LlmConfig;
use crate::{Error, Result};

/// A chat message
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    /// Role: "system", "user", or "assistant"
    pub role: String,
    /// Message content
    pub content: String,
}

impl ChatMessage {
    /// Create a system message
    #[must_use]
    pub fn system(content: &str) -> Self {
        Self {
            role: "system".to_string(),
            content: content.to_string(),
        }
    }

    /// Create a user message
    #[must_use]
    pub fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Chat completion client
pub struct ChatClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl ChatClient {
    /// Create a new chat client
    ///
    /// # Errors
    ///
    /// Returns error if endpoint or API key is missing
    pub fn new(config: LlmConfig) -> Result<Self> {
        if config.endpoint.is_empty() {
            return Err(Error::Config("llm.endpoint required".to_string()));
        }
        if config.api_key.is_empty() {
            return Err(Error::Config("llm.api_key required".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            config,
        })
    }

    /// Request a completion and return the token stream
    ///
    /// # Errors
    ///
    /// Returns error if the request fails; stream items carry per-chunk
    /// transport errors
    pub async fn stream_completion(
        &self,
        messages: &[ChatMessage],
    ) -> Result<ReceiverStream<Result<String>>> {
        let request = ChatRequest {
            model: &self.config.model,
            messages,
            stream: true,
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Chat(format!("chat API error {status}: {body}")));
        }

        let (tx, rx) = mpsc::channel::<Result<String>>(32);

        tokio::spawn(async move {
            let mut stream = response.bytes_stream();
            // SSE lines can straddle chunk boundaries; carry the remainder
            let mut pending = String::new();

            while let Some(chunk) = stream.next().await {
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(e) => {
                        let _ = tx.send(Err(e.into())).await;
                        return;
                    }
                };

                pending.push_str(&String::from_utf8_lossy(&chunk));

                while let Some(pos) = pending.find('\n') {
                    let line = pending[..pos].trim().to_string();
                    pending.drain(..=pos);

                    let Some(payload) = line.strip_prefix("data: ") else {
                        continue;
                    };
                    if payload == "[DONE]" {
                        return;
                    }

                    match serde_json::from_str::<StreamChunk>(payload) {
                        Ok(parsed) => {
                            let delta = parsed
                                .choices
                                .first()
                                .and_then(|c| c.delta.content.clone());
                            if let Some(token) = delta {
                                if tx.send(Ok(token)).await.is_err() {
                                    return;
                                }
                            }
                        }
                        Err(e) => {
                            tracing::debug!(error = %e, "skipping unparsable SSE chunk");
                        }
                    }
                }
            }
        });

        Ok(ReceiverStream::new(rx))
    }

    /// Request a complete (non-streaming) completion
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response is empty
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let request = ChatRequest {
            model: &self.config.model,
            messages,
            stream: false,
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Chat(format!("chat API error {status}: {body}")));
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| Error::Chat("empty completion".to_string()))
    }
}
