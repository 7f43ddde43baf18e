//! Text-to-speech synthesis
//!
//! The synthesis service may stream audio chunks internally, but it is
//! exposed here as a single completed payload or a failure.

use async_trait::async_trait;

use crate::config::TtsConfig;
use crate::{Error, Result};

/// Synthesizes speech from text
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesize text into a complete MP3 payload
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;
}

/// HTTP-backed synthesizer
pub struct HttpSynthesizer {
    client: reqwest::Client,
    config: TtsConfig,
}

impl HttpSynthesizer {
    /// Create a new synthesizer
    ///
    /// # Errors
    ///
    /// Returns error if endpoint or API key is missing
    pub fn new(config: TtsConfig) -> Result<Self> {
        if config.endpoint.is_empty() {
            return Err(Error::Config("tts.endpoint required".to_string()));
        }
        if config.api_key.is_empty() {
            return Err(Error::Config("tts.api_key required".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            config,
        })
    }
}

#[async_trait]
impl Synthesizer for HttpSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct SynthesisRequest<'a> {
            text: &'a str,
            voice: &'a str,
            speed: u8,
            volume: u8,
            pitch: u8,
        }

        let request = SynthesisRequest {
            text,
            voice: &self.config.voice,
            speed: self.config.speed,
            volume: self.config.volume,
            pitch: self.config.pitch,
        };

        tracing::debug!(chars = text.len(), voice = %self.config.voice, "starting synthesis");

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
            return Err(Error::Synthesis(format!("synthesis API error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        tracing::debug!(bytes = audio.len(), "synthesis complete");
        Ok(audio.to_vec())
    }
}
