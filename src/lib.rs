//! Viva Gateway - streaming dialogue engine for AI-led voice interviews
//!
//! This library provides the core functionality for the Viva gateway:
//! - Turn-taking speech capture (incremental transcripts → finalized utterances)
//! - Ordered synthesis and playback (token stream → sentence units → audio)
//! - Interview flow (question banks, transcripts, scoring)
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                   Interview Runner                    │
//! │   Sections  │  Question Bank  │  Report  │  Summary  │
//! └──────────────────────┬───────────────────────────────┘
//!                        │
//! ┌──────────────────────▼───────────────────────────────┐
//! │                    Speech Turn                        │
//! │  Splitter → Dispatcher → Ordered Queue → Playback    │
//! │  Capture → Transcript Channel → Segmenter/Timer      │
//! └──────────────────────┬───────────────────────────────┘
//!                        │
//! ┌──────────────────────▼───────────────────────────────┐
//! │               External Services                       │
//! │   Realtime ASR  │  TTS  │  Chat Completion           │
//! └──────────────────────────────────────────────────────┘
//! ```

pub mod asr;
pub mod audio;
pub mod config;
pub mod dialogue;
pub mod error;
pub mod interview;
pub mod llm;
pub mod setup;
pub mod tts;

pub use config::Config;
pub use dialogue::{
    AnswerOutcome, OrderedPlaybackQueue, RecordingSession, RecumulatingSegmenter,
    SentenceSplitter, SpeechTurn, SynthesisDispatcher, TextUnit, TurnTimer,
};
pub use error::{Error, Result};
pub use interview::{InterviewRunner, QuestionBank, ReportWriter, Section};
