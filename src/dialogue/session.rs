//! Turn-taking recording session
//!
//! Composes a capture source, a transcript channel, the segmenter and the
//! turn timer into one capture operation: start a turn, stream audio until
//! the timer (or an explicit stop) ends it, drain trailing transcript
//! events, and hand back the finalized utterances.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::asr::{EventSource as _, FrameSink as _, TranscriptConnector, TranscriptEvent};
use crate::audio::{CaptureSource, CaptureStream as _};
use crate::config::{CaptureParams, TurnConfig};
use crate::{Error, Result};

use super::segmenter::{RecumulatingSegmenter, Segmenter};
use super::timer::TurnTimer;

/// Timer poll cadence
const TIMER_TICK: Duration = Duration::from_millis(200);

/// Lifecycle of one recording turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    /// No turn running
    Idle,
    /// Audio is streaming and partials are being collected
    Recording,
    /// Turn complete; waiting out the grace period for trailing events
    Draining,
    /// Teardown done, outcome available
    Finished,
}

/// Result of one recording turn
///
/// A turn with no recognized speech is a normal outcome, not an error;
/// multi-turn interviews must survive an unanswered question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// At least one utterance was collected
    Speech {
        /// Finalized utterances in emission order
        utterances: Vec<String>,
        /// Non-fatal channel warning; the answer may be truncated
        warning: Option<String>,
    },
    /// The turn ended without any recognized speech
    NoSpeechDetected,
}

impl AnswerOutcome {
    /// Joined answer text, if any speech was collected
    #[must_use]
    pub fn text(&self) -> Option<String> {
        match self {
            Self::Speech { utterances, .. } => Some(utterances.join(" ")),
            Self::NoSpeechDetected => None,
        }
    }
}

/// State shared between the session tasks, guarded by one lock
struct TurnShared {
    state: TurnState,
    timer: TurnTimer,
    segmenter: Box<dyn Segmenter>,
    utterances: Vec<String>,
    warning: Option<String>,
}

fn lock(shared: &Arc<Mutex<TurnShared>>) -> MutexGuard<'_, TurnShared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One-turn speech capture over a transcript channel
///
/// The capture device and the transcript channel are exclusively owned by
/// a session between `start` and the handle's completion; run turns
/// sequentially.
pub struct RecordingSession {
    capture: Arc<dyn CaptureSource>,
    connector: Arc<dyn TranscriptConnector>,
    params: CaptureParams,
    turn: TurnConfig,
}

impl RecordingSession {
    /// Create a session over the given devices
    pub fn new(
        capture: Arc<dyn CaptureSource>,
        connector: Arc<dyn TranscriptConnector>,
        params: CaptureParams,
        turn: TurnConfig,
    ) -> Self {
        Self {
            capture,
            connector,
            params,
            turn,
        }
    }

    /// Begin a turn with the default segmenter
    ///
    /// # Errors
    ///
    /// Returns `CaptureUnavailable` if the device cannot be opened (no
    /// channel is opened in that case), or a channel error if the
    /// transcript connection fails.
    pub async fn start(&self) -> Result<RecordingHandle> {
        self.start_with(Box::new(RecumulatingSegmenter::new())).await
    }

    /// Begin a turn with a custom segmentation strategy
    ///
    /// # Errors
    ///
    /// Same as [`Self::start`]
    pub async fn start_with(&self, segmenter: Box<dyn Segmenter>) -> Result<RecordingHandle> {
        // Fail fast: nothing else is acquired when the device is missing
        let mut capture_stream = self.capture.open(&self.params)?;

        let (mut sink, mut source) = match self.connector.connect().await {
            Ok(halves) => halves,
            Err(e) => {
                capture_stream.close();
                return Err(e);
            }
        };

        let shared = Arc::new(Mutex::new(TurnShared {
            state: TurnState::Recording,
            timer: TurnTimer::new(self.turn.min_duration, self.turn.silence_timeout, Instant::now()),
            segmenter,
            utterances: Vec::new(),
            warning: None,
        }));

        let (stop_tx, stop_rx) = watch::channel(false);

        // Capture loop: stream frames until the turn completes, then tell
        // the recognizer no more audio is coming
        let mut capture_stop = stop_rx.clone();
        let capture_task: JoinHandle<()> = tokio::spawn(async move {
            loop {
                if *capture_stop.borrow() {
                    break;
                }
                tokio::select! {
                    changed = capture_stop.changed() => {
                        if changed.is_err() || *capture_stop.borrow() {
                            break;
                        }
                    }
                    frame = capture_stream.read_frame() => {
                        match frame {
                            Ok(frame) => {
                                if let Err(e) = sink.send_frame(frame).await {
                                    tracing::warn!(error = %e, "frame send failed");
                                    break;
                                }
                            }
                            Err(e) => {
                                tracing::warn!(error = %e, "capture read failed");
                                break;
                            }
                        }
                    }
                }
            }

            capture_stream.close();
            if let Err(e) = sink.send_end_marker().await {
                tracing::debug!(error = %e, "end marker send failed");
            }
            if let Err(e) = sink.close().await {
                tracing::debug!(error = %e, "channel close failed");
            }
        });

        // Receive loop: single consumer, so partials are processed in
        // arrival order and utterances finalize in that same order
        let recv_shared = Arc::clone(&shared);
        let recv_stop = stop_tx.clone();
        let recv_task: JoinHandle<()> = tokio::spawn(async move {
            loop {
                match source.recv().await {
                    Ok(Some(TranscriptEvent::Started)) => {
                        tracing::debug!("transcription started");
                    }
                    Ok(Some(TranscriptEvent::Partial(text))) => {
                        let mut shared = lock(&recv_shared);
                        shared.timer.record_activity(Instant::now());
                        if let Some(utterance) = shared.segmenter.push(&text) {
                            tracing::debug!(utterance = %utterance, "utterance finalized");
                            shared.utterances.push(utterance);
                        }
                    }
                    Ok(Some(TranscriptEvent::Ended)) | Ok(None) => {
                        tracing::debug!("transcript stream ended");
                        let _ = recv_stop.send(true);
                        break;
                    }
                    Ok(Some(TranscriptEvent::Error(message))) => {
                        tracing::warn!(message = %message, "channel error, keeping partial answer");
                        lock(&recv_shared).warning = Some(message);
                        let _ = recv_stop.send(true);
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "receive failed, keeping partial answer");
                        lock(&recv_shared).warning = Some(e.to_string());
                        let _ = recv_stop.send(true);
                        break;
                    }
                }
            }
        });

        // Timer watch: raises the turn-complete signal on expiry
        let monitor_shared = Arc::clone(&shared);
        let monitor_stop_tx = stop_tx.clone();
        let mut monitor_stop_rx = stop_rx.clone();
        tokio::spawn(async move {
            let mut ticks = tokio::time::interval(TIMER_TICK);
            loop {
                tokio::select! {
                    changed = monitor_stop_rx.changed() => {
                        if changed.is_err() || *monitor_stop_rx.borrow() {
                            break;
                        }
                    }
                    _ = ticks.tick() => {
                        if lock(&monitor_shared).timer.poll(Instant::now()) {
                            tracing::debug!("turn timer expired");
                            let _ = monitor_stop_tx.send(true);
                            break;
                        }
                    }
                }
            }
        });

        // Driver: waits for the turn-complete signal, drains, assembles the
        // outcome
        let driver_shared = Arc::clone(&shared);
        let mut driver_stop = stop_rx;
        let turn = self.turn;
        let driver: JoinHandle<AnswerOutcome> = tokio::spawn(async move {
            while !*driver_stop.borrow() {
                if driver_stop.changed().await.is_err() {
                    break;
                }
            }

            {
                let mut shared = lock(&driver_shared);
                shared.state = TurnState::Draining;
                shared.timer.force();
            }

            // The capture loop exits on the signal and sends the end
            // marker; give trailing events the grace period to arrive
            let mut capture_task = capture_task;
            if tokio::time::timeout(Duration::from_secs(1), &mut capture_task)
                .await
                .is_err()
            {
                capture_task.abort();
            }

            let mut recv_task = recv_task;
            if tokio::time::timeout(turn.drain_grace, &mut recv_task).await.is_err() {
                tracing::debug!("drain grace elapsed with receive loop still open");
                recv_task.abort();
            }

            let mut shared = lock(&driver_shared);
            if let Some(tail) = shared.segmenter.finish() {
                shared.utterances.push(tail);
            }
            shared.state = TurnState::Finished;

            let utterances = std::mem::take(&mut shared.utterances);
            let warning = shared.warning.take();
            drop(shared);

            if utterances.is_empty() {
                if let Some(warning) = warning {
                    tracing::warn!(warning = %warning, "turn ended with no speech");
                }
                AnswerOutcome::NoSpeechDetected
            } else {
                tracing::info!(utterances = utterances.len(), "turn complete");
                AnswerOutcome::Speech {
                    utterances,
                    warning,
                }
            }
        });

        Ok(RecordingHandle {
            stop_tx,
            shared,
            driver,
        })
    }
}

/// Handle to a running turn
pub struct RecordingHandle {
    stop_tx: watch::Sender<bool>,
    shared: Arc<Mutex<TurnShared>>,
    driver: JoinHandle<AnswerOutcome>,
}

impl RecordingHandle {
    /// Explicit early termination; runs the same drain sequence as timer
    /// expiry
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    /// Current turn state
    #[must_use]
    pub fn state(&self) -> TurnState {
        lock(&self.shared).state
    }

    /// Block until the turn ends (timer expiry or stop), trailing events
    /// drain, and the utterance list is final
    ///
    /// # Errors
    ///
    /// Returns error only if the session task panicked; channel failures
    /// degrade to a warning on the outcome instead
    pub async fn finish(self) -> Result<AnswerOutcome> {
        self.driver
            .await
            .map_err(|e| Error::Channel(format!("session task failed: {e}")))
    }
}
