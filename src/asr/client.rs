//! WebSocket transcript channel client

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::audio::AudioFrame;
use crate::config::AsrConfig;
use crate::{Error, Result};

use super::{EventSource, FrameSink, TranscriptConnector, TranscriptEvent, wire};

/// End-of-audio marker understood by the recognizer
const END_MARKER: &str = r#"{"end": true}"#;

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsStream = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Realtime transcription channel over WebSocket
///
/// The configured URL already carries the provider's auth parameters;
/// signing is the operator's concern.
pub struct RtasrChannel {
    config: AsrConfig,
}

impl RtasrChannel {
    /// Create a channel connector from configuration
    ///
    /// # Errors
    ///
    /// Returns error if no URL is configured
    pub fn new(config: AsrConfig) -> Result<Self> {
        if config.url.is_empty() {
            return Err(Error::Config("asr.url required for recording".to_string()));
        }
        Ok(Self { config })
    }
}

#[async_trait]
impl TranscriptConnector for RtasrChannel {
    async fn connect(&self) -> Result<(Box<dyn FrameSink>, Box<dyn EventSource>)> {
        let (ws, _response) = connect_async(self.config.url.as_str()).await?;
        tracing::debug!("transcript channel connected");

        let (write, read) = ws.split();
        Ok((
            Box::new(WsFrameSink { write }),
            Box::new(WsEventSource { read }),
        ))
    }
}

/// Send half of the WebSocket channel
struct WsFrameSink {
    write: WsSink,
}

#[async_trait]
impl FrameSink for WsFrameSink {
    async fn send_frame(&mut self, frame: AudioFrame) -> Result<()> {
        self.write.send(Message::Binary(frame.bytes.into())).await?;
        Ok(())
    }

    async fn send_end_marker(&mut self) -> Result<()> {
        self.write.send(Message::Text(END_MARKER.into())).await?;
        tracing::debug!("end marker sent");
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.write.close().await?;
        Ok(())
    }
}

/// Receive half of the WebSocket channel
struct WsEventSource {
    read: WsStream,
}

#[async_trait]
impl EventSource for WsEventSource {
    async fn recv(&mut self) -> Result<Option<TranscriptEvent>> {
        loop {
            match self.read.next().await {
                Some(Ok(Message::Text(text))) => {
                    if let Some(event) = wire::parse_event(text.as_str()) {
                        return Ok(Some(event));
                    }
                    // Non-event frame, keep reading
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => {} // binary/ping/pong frames carry no events
                Some(Err(e)) => return Err(e.into()),
            }
        }
    }
}
