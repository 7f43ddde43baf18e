//! Strictly ordered audio playback

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::audio::PlaybackSink;
use crate::{Error, Result};

use super::dispatcher::SynthesisResult;

/// Bounded wait while the next sequence number is outstanding
const GAP_POLL: Duration = Duration::from_secs(1);

/// Plays synthesis results strictly in sequence order
///
/// Results arrive in synthesis-completion order. A result whose sequence
/// number is ahead of the playback cursor is buffered, never played early;
/// playback only ever consumes the contiguous prefix. This is what
/// guarantees the audio order matches the text order: popping whichever
/// buffered result is currently smallest would play a later sentence ahead
/// of an unfinished earlier one.
pub struct OrderedPlaybackQueue;

impl OrderedPlaybackQueue {
    /// Start the playback worker for one turn
    #[must_use]
    pub fn spawn(
        sink: Arc<dyn PlaybackSink>,
        results_rx: mpsc::Receiver<SynthesisResult>,
    ) -> PlaybackDriver {
        PlaybackDriver {
            handle: tokio::spawn(run_playback(sink, results_rx)),
        }
    }
}

/// Handle to a running playback worker
pub struct PlaybackDriver {
    handle: JoinHandle<u64>,
}

impl PlaybackDriver {
    /// Wait until everything submitted has been played (or skipped) and
    /// return the number of consumed slots
    ///
    /// # Errors
    ///
    /// Returns error if the playback task panicked
    pub async fn drain(self) -> Result<u64> {
        self.handle
            .await
            .map_err(|e| Error::Audio(format!("playback task failed: {e}")))
    }
}

/// Playback loop: consume the contiguous prefix, block bounded on gaps
async fn run_playback(
    sink: Arc<dyn PlaybackSink>,
    mut results_rx: mpsc::Receiver<SynthesisResult>,
) -> u64 {
    let mut next_to_play: u64 = 0;
    let mut buffer: HashMap<u64, SynthesisResult> = HashMap::new();
    let mut closed = false;

    loop {
        while let Some(result) = buffer.remove(&next_to_play) {
            match result.payload {
                Ok(audio) => {
                    tracing::debug!(seq = result.seq, bytes = audio.len(), "playing slot");
                    if let Err(e) = sink.play(&audio).await {
                        tracing::warn!(seq = result.seq, error = %e, "playback failed, skipping slot");
                    }
                }
                Err(reason) => {
                    tracing::warn!(seq = result.seq, reason = %reason, "skipping failed synthesis slot");
                }
            }
            next_to_play += 1;
        }

        if closed {
            if !buffer.is_empty() {
                // Sequence numbers below the gap never arrived; nothing
                // after the gap may play
                tracing::warn!(
                    discarded = buffer.len(),
                    next_to_play,
                    "discarding non-contiguous results at teardown"
                );
            }
            break;
        }

        match tokio::time::timeout(GAP_POLL, results_rx.recv()).await {
            Ok(Some(result)) => {
                if result.seq < next_to_play {
                    tracing::debug!(seq = result.seq, "duplicate submission ignored");
                } else {
                    // Idempotent per key: first submission wins
                    buffer.entry(result.seq).or_insert(result);
                }
            }
            Ok(None) => closed = true,
            Err(_) => {
                tracing::trace!(next_to_play, "waiting for next slot");
            }
        }
    }

    tracing::debug!(played = next_to_play, "playback drained");
    next_to_play
}
