//! Configuration management for the Viva gateway
//!
//! All external-service credentials and device parameters are explicit
//! configuration passed at construction time, so there is no process-wide
//! mutable state. Precedence is env > TOML file > default.

pub mod file;

use std::path::PathBuf;
use std::time::Duration;

use crate::interview::Section;
use crate::{Error, Result};

/// Viva gateway configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Interview plan (candidate, sections)
    pub interview: InterviewPlan,

    /// Capture device parameters
    pub capture: CaptureParams,

    /// Turn-taking timing
    pub turn: TurnConfig,

    /// Transcript channel credentials
    pub asr: AsrConfig,

    /// Speech synthesis credentials and voice parameters
    pub tts: TtsConfig,

    /// Chat completion credentials
    pub llm: LlmConfig,

    /// Path to data directory (reports, question banks)
    pub data_dir: PathBuf,
}

/// Interview plan: who is being interviewed and which sections run
#[derive(Debug, Clone)]
pub struct InterviewPlan {
    /// Candidate name, used in the opening line
    pub candidate_name: Option<String>,

    /// Position being interviewed for
    pub position: String,

    /// Target company
    pub company: Option<String>,

    /// Technical domain
    pub tech_domain: Option<String>,

    /// Strict mode: pressure-style interview phrasing
    pub strict_mode: bool,

    /// Sections to run, in order
    pub sections: Vec<Section>,

    /// Path to the question bank JSON file
    pub questions_file: PathBuf,

    /// Path to the Markdown transcript file
    pub report_file: PathBuf,
}

/// Capture device parameters
///
/// Defaults match what the realtime transcript service expects:
/// 16 kHz mono s16le, 1280-byte frames sent every 40 ms.
#[derive(Debug, Clone, Copy)]
pub struct CaptureParams {
    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Channel count
    pub channels: u16,

    /// Bits per sample
    pub bits_per_sample: u16,

    /// Frame size in bytes
    pub frame_bytes: usize,

    /// Interval between frames
    pub frame_interval: Duration,
}

impl Default for CaptureParams {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            channels: 1,
            bits_per_sample: 16,
            frame_bytes: 1280,
            frame_interval: Duration::from_millis(40),
        }
    }
}

/// Turn-taking timing configuration
#[derive(Debug, Clone, Copy)]
pub struct TurnConfig {
    /// Minimum recording duration before silence can end the turn
    pub min_duration: Duration,

    /// Silence window after the last partial that ends the turn
    pub silence_timeout: Duration,

    /// Grace period for trailing transcript events after stop
    pub drain_grace: Duration,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            min_duration: Duration::from_secs(8),
            silence_timeout: Duration::from_secs(3),
            drain_grace: Duration::from_secs(2),
        }
    }
}

/// Transcript channel configuration
///
/// The URL carries the provider's auth query parameters and is treated as
/// an opaque credential.
#[derive(Debug, Clone, Default)]
pub struct AsrConfig {
    /// Fully authorized WebSocket URL
    pub url: String,
}

/// Speech synthesis configuration
#[derive(Debug, Clone)]
pub struct TtsConfig {
    /// Synthesis HTTP endpoint
    pub endpoint: String,

    /// API key
    pub api_key: String,

    /// Voice identifier
    pub voice: String,

    /// Speed (provider scale 0-100)
    pub speed: u8,

    /// Volume (provider scale 0-100)
    pub volume: u8,

    /// Pitch (provider scale 0-100)
    pub pitch: u8,

    /// Max concurrent synthesis requests
    pub max_concurrency: usize,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            voice: "serena".to_string(),
            speed: 50,
            volume: 50,
            pitch: 50,
            max_concurrency: 3,
        }
    }
}

/// Chat completion configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// OpenAI-compatible chat completions endpoint
    pub endpoint: String,

    /// API key
    pub api_key: String,

    /// Model identifier
    pub model: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            model: "generalv3.5".to_string(),
        }
    }
}

impl Config {
    /// Load configuration (env > TOML file > default)
    ///
    /// # Errors
    ///
    /// Returns error if a configured section identifier is unknown
    pub fn load() -> Result<Self> {
        let fc = file::load_config_file();

        let data_dir = directories::BaseDirs::new()
            .map_or_else(|| PathBuf::from("."), |d| d.data_dir().join("viva"));
        std::fs::create_dir_all(&data_dir).ok();

        let sections = match fc.interview.sections {
            Some(names) => names
                .iter()
                .map(|n| Section::parse(n).ok_or_else(|| Error::Config(format!("unknown section: {n}"))))
                .collect::<Result<Vec<_>>>()?,
            None => Section::default_order(),
        };

        let interview = InterviewPlan {
            candidate_name: fc.interview.candidate_name,
            position: fc.interview.position.unwrap_or_else(|| "the position".to_string()),
            company: fc.interview.company,
            tech_domain: fc.interview.tech_domain,
            strict_mode: fc.interview.strict_mode.unwrap_or(false),
            sections,
            questions_file: fc
                .interview
                .questions_file
                .map_or_else(|| data_dir.join("questions.json"), PathBuf::from),
            report_file: fc
                .interview
                .report_file
                .map_or_else(|| data_dir.join("QA.md"), PathBuf::from),
        };

        let turn_default = TurnConfig::default();
        let turn = TurnConfig {
            min_duration: env_secs("VIVA_MIN_DURATION")
                .or(fc.turn.min_duration_secs.map(Duration::from_secs))
                .unwrap_or(turn_default.min_duration),
            silence_timeout: env_secs("VIVA_SILENCE_TIMEOUT")
                .or(fc.turn.silence_timeout_secs.map(Duration::from_secs))
                .unwrap_or(turn_default.silence_timeout),
            drain_grace: env_secs("VIVA_DRAIN_GRACE")
                .or(fc.turn.drain_grace_secs.map(Duration::from_secs))
                .unwrap_or(turn_default.drain_grace),
        };

        let asr = AsrConfig {
            url: std::env::var("VIVA_ASR_URL")
                .ok()
                .or(fc.asr.url)
                .unwrap_or_default(),
        };

        let tts_default = TtsConfig::default();
        let tts = TtsConfig {
            endpoint: std::env::var("VIVA_TTS_ENDPOINT")
                .ok()
                .or(fc.tts.endpoint)
                .unwrap_or(tts_default.endpoint),
            api_key: std::env::var("VIVA_TTS_API_KEY")
                .ok()
                .or(fc.tts.api_key)
                .unwrap_or(tts_default.api_key),
            voice: std::env::var("VIVA_TTS_VOICE")
                .ok()
                .or(fc.tts.voice)
                .unwrap_or(tts_default.voice),
            speed: fc.tts.speed.unwrap_or(tts_default.speed),
            volume: fc.tts.volume.unwrap_or(tts_default.volume),
            pitch: fc.tts.pitch.unwrap_or(tts_default.pitch),
            max_concurrency: fc.tts.max_concurrency.unwrap_or(tts_default.max_concurrency),
        };

        let llm_default = LlmConfig::default();
        let llm = LlmConfig {
            endpoint: std::env::var("VIVA_LLM_ENDPOINT")
                .ok()
                .or(fc.llm.endpoint)
                .unwrap_or(llm_default.endpoint),
            api_key: std::env::var("VIVA_LLM_API_KEY")
                .ok()
                .or(fc.llm.api_key)
                .unwrap_or(llm_default.api_key),
            model: std::env::var("VIVA_LLM_MODEL")
                .ok()
                .or(fc.llm.model)
                .unwrap_or(llm_default.model),
        };

        Ok(Self {
            interview,
            capture: CaptureParams::default(),
            turn,
            asr,
            tts,
            llm,
            data_dir,
        })
    }
}

/// Read a duration in whole seconds from an environment variable
fn env_secs(key: &str) -> Option<Duration> {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .map(Duration::from_secs)
}
