//! Bounded-concurrency synthesis dispatch

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::tts::Synthesizer;
use crate::{Error, Result};

use super::splitter::TextUnit;

/// Synthesized payloads smaller than this are treated as failures; the
/// service occasionally returns truncated audio on error
pub const MIN_AUDIO_BYTES: usize = 1000;

/// Depth of the pending-job queue; dispatch blocks once it is full
const JOB_QUEUE_DEPTH: usize = 8;

/// Outcome of synthesizing one [`TextUnit`]
///
/// Arrival order at the playback queue is unrelated to `seq` order. A
/// failed slot carries its sequence number so the queue can skip it
/// without stalling.
#[derive(Debug, Clone)]
pub struct SynthesisResult {
    /// Sequence number of the source unit
    pub seq: u64,
    /// Audio payload, or the failure reason
    pub payload: std::result::Result<Vec<u8>, String>,
}

/// Fans text units out to the synthesis service
///
/// A fixed pool of workers pulls from a bounded job queue, so at most
/// `concurrency` requests are in flight and producers feel back-pressure
/// once the queue fills. Results go to the ordered playback queue; results
/// for a queue that has been torn down are discarded.
pub struct SynthesisDispatcher {
    jobs_tx: mpsc::Sender<TextUnit>,
    workers: Vec<JoinHandle<()>>,
}

impl SynthesisDispatcher {
    /// Start the worker pool
    #[must_use]
    pub fn spawn(
        synthesizer: Arc<dyn Synthesizer>,
        concurrency: usize,
        results_tx: mpsc::Sender<SynthesisResult>,
    ) -> Self {
        let (jobs_tx, jobs_rx) = mpsc::channel::<TextUnit>(JOB_QUEUE_DEPTH);
        let jobs_rx = Arc::new(tokio::sync::Mutex::new(jobs_rx));

        let workers = (0..concurrency.max(1))
            .map(|worker| {
                let jobs_rx = Arc::clone(&jobs_rx);
                let synthesizer = Arc::clone(&synthesizer);
                let results_tx = results_tx.clone();

                tokio::spawn(async move {
                    loop {
                        let unit = jobs_rx.lock().await.recv().await;
                        let Some(unit) = unit else { break };

                        tracing::debug!(worker, seq = unit.seq, "synthesizing unit");
                        let result = synthesize_unit(synthesizer.as_ref(), &unit).await;

                        if results_tx.send(result).await.is_err() {
                            // Playback queue torn down: discard and stop
                            break;
                        }
                    }
                })
            })
            .collect();

        Self { jobs_tx, workers }
    }

    /// Queue a unit for synthesis, waiting if the job queue is full
    ///
    /// # Errors
    ///
    /// Returns error if the worker pool has shut down
    pub async fn dispatch(&self, unit: TextUnit) -> Result<()> {
        self.jobs_tx
            .send(unit)
            .await
            .map_err(|_| Error::Synthesis("dispatcher closed".to_string()))
    }

    /// Signal end of input and wait for in-flight synthesis to complete
    ///
    /// Dropping the workers' result senders is what tells the playback
    /// queue that no more submissions are expected.
    pub async fn finish(self) {
        drop(self.jobs_tx);
        for worker in self.workers {
            let _ = worker.await;
        }
    }
}

/// Synthesize one unit, mapping failures to an error-tagged result
async fn synthesize_unit(synthesizer: &dyn Synthesizer, unit: &TextUnit) -> SynthesisResult {
    let payload = match synthesizer.synthesize(&unit.text).await {
        Ok(audio) if audio.len() >= MIN_AUDIO_BYTES => Ok(audio),
        Ok(audio) => {
            tracing::warn!(seq = unit.seq, bytes = audio.len(), "audio payload too small");
            Err(format!("audio payload too small: {} bytes", audio.len()))
        }
        Err(e) => {
            tracing::warn!(seq = unit.seq, error = %e, "synthesis failed");
            Err(e.to_string())
        }
    };

    SynthesisResult {
        seq: unit.seq,
        payload,
    }
}
