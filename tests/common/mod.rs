//! Hardware-free fakes for the dialogue engine
//!
//! Capture, transcript channel, synthesis, and playback all have in-memory
//! stand-ins so turn-taking and ordering behavior can be tested without
//! audio devices or network services.

#![allow(dead_code)] // each test binary uses a different subset

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use viva_gateway::asr::{EventSource, FrameSink, TranscriptConnector, TranscriptEvent};
use viva_gateway::audio::{AudioFrame, CaptureSource, CaptureStream, PlaybackSink};
use viva_gateway::config::{CaptureParams, TurnConfig};
use viva_gateway::tts::Synthesizer;
use viva_gateway::{Error, Result};

/// Short turn timings so tests stay fast
pub fn test_turn_config() -> TurnConfig {
    TurnConfig {
        min_duration: Duration::from_millis(250),
        silence_timeout: Duration::from_millis(150),
        drain_grace: Duration::from_millis(100),
    }
}

/// Small frames at a fast cadence
pub fn test_capture_params() -> CaptureParams {
    CaptureParams {
        sample_rate: 16_000,
        channels: 1,
        bits_per_sample: 16,
        frame_bytes: 64,
        frame_interval: Duration::from_millis(5),
    }
}

// ---------------------------------------------------------------- capture

/// Capture source producing silent frames at the configured cadence
pub struct FakeCaptureSource;

impl CaptureSource for FakeCaptureSource {
    fn open(&self, params: &CaptureParams) -> Result<Box<dyn CaptureStream>> {
        Ok(Box::new(FakeCaptureStream {
            frame_bytes: params.frame_bytes,
            interval: params.frame_interval,
        }))
    }
}

struct FakeCaptureStream {
    frame_bytes: usize,
    interval: Duration,
}

#[async_trait]
impl CaptureStream for FakeCaptureStream {
    async fn read_frame(&mut self) -> Result<AudioFrame> {
        tokio::time::sleep(self.interval).await;
        Ok(AudioFrame {
            bytes: vec![0u8; self.frame_bytes],
        })
    }

    fn close(&mut self) {}
}

/// Capture source whose device is missing
pub struct UnavailableCaptureSource;

impl CaptureSource for UnavailableCaptureSource {
    fn open(&self, _params: &CaptureParams) -> Result<Box<dyn CaptureStream>> {
        Err(Error::CaptureUnavailable("no input device".to_string()))
    }
}

// ---------------------------------------------------------------- channel

/// One scripted transcript event with a delay before delivery
pub type ScriptedEvent = (Duration, TranscriptEvent);

/// Connector replaying a scripted event sequence
///
/// Tracks how often it was connected, how many frames were sent, and
/// whether the end marker went out.
pub struct FakeConnector {
    script: Mutex<Vec<ScriptedEvent>>,
    pub connects: AtomicUsize,
    pub frames_sent: Arc<AtomicUsize>,
    pub end_marker_sent: Arc<AtomicBool>,
}

impl FakeConnector {
    pub fn new(script: Vec<ScriptedEvent>) -> Self {
        Self {
            script: Mutex::new(script),
            connects: AtomicUsize::new(0),
            frames_sent: Arc::new(AtomicUsize::new(0)),
            end_marker_sent: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Partial events at a steady 20ms cadence, preceded by `Started`
    pub fn with_partials(partials: &[&str]) -> Self {
        let mut script = vec![(Duration::from_millis(1), TranscriptEvent::Started)];
        for partial in partials {
            script.push((
                Duration::from_millis(20),
                TranscriptEvent::Partial((*partial).to_string()),
            ));
        }
        Self::new(script)
    }
}

#[async_trait]
impl TranscriptConnector for FakeConnector {
    async fn connect(&self) -> Result<(Box<dyn FrameSink>, Box<dyn EventSource>)> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let script = {
            let mut guard = self.script.lock().unwrap();
            std::mem::take(&mut *guard)
        };

        Ok((
            Box::new(CountingSink {
                frames: Arc::clone(&self.frames_sent),
                end_marker: Arc::clone(&self.end_marker_sent),
            }),
            Box::new(ScriptedSource {
                events: script.into(),
            }),
        ))
    }
}

struct CountingSink {
    frames: Arc<AtomicUsize>,
    end_marker: Arc<AtomicBool>,
}

#[async_trait]
impl FrameSink for CountingSink {
    async fn send_frame(&mut self, _frame: AudioFrame) -> Result<()> {
        self.frames.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn send_end_marker(&mut self) -> Result<()> {
        self.end_marker.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

struct ScriptedSource {
    events: VecDeque<ScriptedEvent>,
}

#[async_trait]
impl EventSource for ScriptedSource {
    async fn recv(&mut self) -> Result<Option<TranscriptEvent>> {
        match self.events.pop_front() {
            Some((delay, event)) => {
                tokio::time::sleep(delay).await;
                Ok(Some(event))
            }
            // Script exhausted: stay open until the session tears down
            None => {
                std::future::pending::<()>().await;
                Ok(None)
            }
        }
    }
}

// -------------------------------------------------------------- synthesis

/// Per-text synthesis behavior
#[derive(Clone)]
pub enum SynthBehavior {
    /// Succeed after the delay; payload embeds the text for identification
    Ok(Duration),
    /// Fail after the delay
    Fail(Duration),
    /// Succeed but return a payload below the minimum size
    TooSmall(Duration),
}

/// Synthesizer with scripted per-text delays and failures
///
/// Unscripted texts succeed immediately.
pub struct FakeSynthesizer {
    behaviors: Mutex<Vec<(String, SynthBehavior)>>,
    pub calls: AtomicUsize,
}

impl FakeSynthesizer {
    pub fn new(behaviors: Vec<(&str, SynthBehavior)>) -> Self {
        Self {
            behaviors: Mutex::new(
                behaviors
                    .into_iter()
                    .map(|(text, b)| (text.to_string(), b))
                    .collect(),
            ),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn instant() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl Synthesizer for FakeSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let behavior = self
            .behaviors
            .lock()
            .unwrap()
            .iter()
            .find(|(t, _)| t == text)
            .map(|(_, b)| b.clone())
            .unwrap_or(SynthBehavior::Ok(Duration::ZERO));

        match behavior {
            SynthBehavior::Ok(delay) => {
                tokio::time::sleep(delay).await;
                Ok(label_payload(text))
            }
            SynthBehavior::Fail(delay) => {
                tokio::time::sleep(delay).await;
                Err(Error::Synthesis(format!("scripted failure for: {text}")))
            }
            SynthBehavior::TooSmall(delay) => {
                tokio::time::sleep(delay).await;
                Ok(text.as_bytes().to_vec())
            }
        }
    }
}

/// Encode a text label into a payload above the minimum audio size
pub fn label_payload(text: &str) -> Vec<u8> {
    let mut payload = text.as_bytes().to_vec();
    payload.resize(1500, 0);
    payload
}

/// Recover the text label from a payload
pub fn payload_label(payload: &[u8]) -> String {
    let end = payload
        .iter()
        .position(|&b| b == 0)
        .unwrap_or(payload.len());
    String::from_utf8_lossy(&payload[..end]).to_string()
}

// --------------------------------------------------------------- playback

/// Sink recording the labels of played payloads in order
pub struct RecordingSink {
    played: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self {
            played: Mutex::new(Vec::new()),
        }
    }

    pub fn played(&self) -> Vec<String> {
        self.played.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlaybackSink for RecordingSink {
    async fn play(&self, audio: &[u8]) -> Result<()> {
        self.played.lock().unwrap().push(payload_label(audio));
        Ok(())
    }
}
