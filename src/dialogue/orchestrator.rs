//! Top-level speech turn driver
//!
//! Composes the synthesis dispatcher and ordered playback queue for the
//! output path with a recording session for the input path, exposing
//! "ask and collect the answer" as one operation.

use std::sync::Arc;

use futures::{Stream, StreamExt};
use tokio::sync::mpsc;

use crate::Result;
use crate::audio::PlaybackSink;
use crate::tts::Synthesizer;

use super::dispatcher::{SynthesisDispatcher, SynthesisResult};
use super::playback_queue::OrderedPlaybackQueue;
use super::session::{AnswerOutcome, RecordingSession};
use super::splitter::{SentenceSplitter, TextUnit};

/// Depth of the synthesis-result queue between dispatcher and playback
const RESULT_QUEUE_DEPTH: usize = 16;

/// Drives complete question/answer exchanges
///
/// Owns the output devices for the duration of each turn; turns run
/// sequentially.
pub struct SpeechTurn {
    synthesizer: Arc<dyn Synthesizer>,
    sink: Arc<dyn PlaybackSink>,
    session: RecordingSession,
    max_concurrency: usize,
}

impl SpeechTurn {
    /// Create an orchestrator over the given services and devices
    pub fn new(
        synthesizer: Arc<dyn Synthesizer>,
        sink: Arc<dyn PlaybackSink>,
        session: RecordingSession,
        max_concurrency: usize,
    ) -> Self {
        Self {
            synthesizer,
            sink,
            session,
            max_concurrency,
        }
    }

    /// Synthesize and play a complete text as a single unit
    ///
    /// # Errors
    ///
    /// Returns error if dispatch fails; synthesis failures degrade to a
    /// skipped slot
    pub async fn speak(&self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Ok(());
        }

        let (dispatcher, driver) = self.output_pipeline();
        dispatcher
            .dispatch(TextUnit {
                seq: 0,
                text: text.to_string(),
            })
            .await?;
        dispatcher.finish().await;
        driver.drain().await?;
        Ok(())
    }

    /// Ask a question and collect the spoken answer
    ///
    /// Plays the prompt to completion, then records one turn.
    ///
    /// # Errors
    ///
    /// Returns error if the prompt cannot be dispatched or the capture
    /// device is unavailable
    pub async fn ask_and_collect(&self, prompt: &str) -> Result<AnswerOutcome> {
        tracing::info!(prompt = %prompt, "asking");
        self.speak(prompt).await?;

        let handle = self.session.start().await?;
        handle.finish().await
    }

    /// Play a live token stream while recording the listener's reply
    ///
    /// Tokens flow through the sentence splitter into concurrent synthesis
    /// and ordered playback; a recording session runs alongside for the
    /// eventual rebuttal. Returns the full spoken text and the collected
    /// answer.
    ///
    /// # Errors
    ///
    /// Returns error if the capture device is unavailable or dispatch
    /// fails; token-stream errors end playback early but keep the turn
    pub async fn stream_and_collect<S>(&self, tokens: S) -> Result<(String, AnswerOutcome)>
    where
        S: Stream<Item = Result<String>> + Unpin,
    {
        let handle = self.session.start().await?;

        let (dispatcher, driver) = self.output_pipeline();
        let mut splitter = SentenceSplitter::new();
        let mut spoken = String::new();
        let mut tokens = tokens;

        while let Some(token) = tokens.next().await {
            match token {
                Ok(token) => {
                    spoken.push_str(&token);
                    for unit in splitter.push(&token) {
                        dispatcher.dispatch(unit).await?;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "token stream failed, ending playback early");
                    break;
                }
            }
        }

        if let Some(unit) = splitter.finish() {
            dispatcher.dispatch(unit).await?;
        }

        dispatcher.finish().await;
        let played = driver.drain().await?;
        tracing::debug!(units = splitter.emitted(), played, "streamed answer playback done");

        let outcome = handle.finish().await?;
        Ok((spoken, outcome))
    }

    /// Build the dispatcher → ordered-queue pipeline for one turn
    fn output_pipeline(&self) -> (SynthesisDispatcher, super::playback_queue::PlaybackDriver) {
        let (results_tx, results_rx) = mpsc::channel::<SynthesisResult>(RESULT_QUEUE_DEPTH);
        let dispatcher = SynthesisDispatcher::spawn(
            Arc::clone(&self.synthesizer),
            self.max_concurrency,
            results_tx,
        );
        let driver = OrderedPlaybackQueue::spawn(Arc::clone(&self.sink), results_rx);
        (dispatcher, driver)
    }
}
