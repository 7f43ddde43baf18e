//! Error types for the Viva gateway

use thiserror::Error;

/// Result type alias for Viva operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the Viva gateway
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Capture device could not be opened; fatal for the turn
    #[error("capture unavailable: {0}")]
    CaptureUnavailable(String),

    /// Audio error (playback, format conversion)
    #[error("audio error: {0}")]
    Audio(String),

    /// Transcript channel error
    #[error("channel error: {0}")]
    Channel(String),

    /// Speech synthesis error
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// Chat completion error
    #[error("chat error: {0}")]
    Chat(String),

    /// Question bank error
    #[error("question bank error: {0}")]
    QuestionBank(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// WebSocket error
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
