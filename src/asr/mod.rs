//! Realtime transcript channel
//!
//! The cloud recognizer is an external collaborator: audio frames go in,
//! incremental transcript events come out. The channel is split into a
//! frame sink and an event source so the capture loop and the receive loop
//! can run as independent tasks.

mod client;
pub mod wire;

pub use client::RtasrChannel;

use async_trait::async_trait;

use crate::Result;
use crate::audio::AudioFrame;

/// An event emitted by the transcript channel
///
/// `Partial` text is cumulative-so-far for the current utterance, not a
/// delta. The upstream service periodically restarts its cumulative buffer
/// when it decides a new utterance has begun; see
/// [`crate::dialogue::RecumulatingSegmenter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEvent {
    /// The service accepted the connection and is ready for audio
    Started,
    /// Cumulative in-progress transcript for the current utterance
    Partial(String),
    /// The service finished processing after the end marker
    Ended,
    /// The service reported an error
    Error(String),
}

/// Connects transcript channels
#[async_trait]
pub trait TranscriptConnector: Send + Sync {
    /// Open the channel, returning the send and receive halves
    ///
    /// # Errors
    ///
    /// Returns error if the connection cannot be established
    async fn connect(&self) -> Result<(Box<dyn FrameSink>, Box<dyn EventSource>)>;
}

/// Send half of a transcript channel
#[async_trait]
pub trait FrameSink: Send {
    /// Stream one audio frame to the recognizer
    ///
    /// # Errors
    ///
    /// Returns error if the channel rejects the frame
    async fn send_frame(&mut self, frame: AudioFrame) -> Result<()>;

    /// Tell the recognizer no more audio is coming
    ///
    /// # Errors
    ///
    /// Returns error if the marker cannot be sent
    async fn send_end_marker(&mut self) -> Result<()>;

    /// Close the send half
    ///
    /// # Errors
    ///
    /// Returns error if the close handshake fails
    async fn close(&mut self) -> Result<()>;
}

/// Receive half of a transcript channel
#[async_trait]
pub trait EventSource: Send {
    /// Receive the next event; `Ok(None)` once the channel has closed
    ///
    /// # Errors
    ///
    /// Returns error on transport failure
    async fn recv(&mut self) -> Result<Option<TranscriptEvent>>;
}
