//! TOML configuration file loading
//!
//! Supports `~/.config/viva/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of
//! defaults. The `viva setup` wizard writes this file.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct VivaConfigFile {
    /// Interview plan (candidate, sections, strictness)
    #[serde(default)]
    pub interview: InterviewFileConfig,

    /// Turn-taking timing
    #[serde(default)]
    pub turn: TurnFileConfig,

    /// Transcript channel (realtime ASR) configuration
    #[serde(default)]
    pub asr: AsrFileConfig,

    /// Speech synthesis configuration
    #[serde(default)]
    pub tts: TtsFileConfig,

    /// Chat completion configuration
    #[serde(default)]
    pub llm: LlmFileConfig,
}

/// Interview plan configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct InterviewFileConfig {
    /// Candidate name, used in the opening line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_name: Option<String>,

    /// Position being interviewed for
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,

    /// Target company
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,

    /// Technical domain (e.g. "backend", "embedded")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tech_domain: Option<String>,

    /// Strict mode: pressure-style interview phrasing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strict_mode: Option<bool>,

    /// Section identifiers to run, in order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sections: Option<Vec<String>>,

    /// Path to the question bank JSON file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub questions_file: Option<String>,

    /// Path to the Markdown transcript/report file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_file: Option<String>,
}

/// Turn-taking timing configuration (all in seconds)
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct TurnFileConfig {
    /// Minimum recording duration before silence can end the turn
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_duration_secs: Option<u64>,

    /// Silence window after which the turn ends
    #[serde(skip_serializing_if = "Option::is_none")]
    pub silence_timeout_secs: Option<u64>,

    /// Grace period for trailing transcript events after stop
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drain_grace_secs: Option<u64>,
}

/// Realtime transcript channel configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct AsrFileConfig {
    /// Fully authorized WebSocket URL. Signing is provider-specific and
    /// handled by the operator; the URL is treated as an opaque credential.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Speech synthesis configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct TtsFileConfig {
    /// Synthesis HTTP endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// API key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Voice identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,

    /// Speed (provider scale, typically 0-100)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<u8>,

    /// Volume (provider scale, typically 0-100)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<u8>,

    /// Pitch (provider scale, typically 0-100)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pitch: Option<u8>,

    /// Max concurrent synthesis requests
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrency: Option<usize>,
}

/// Chat completion configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LlmFileConfig {
    /// OpenAI-compatible chat completions endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// API key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Path to the config file: `~/.config/viva/config.toml`
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("viva").join("config.toml"))
}

/// Load the TOML config file, returning defaults when absent or unparsable
#[must_use]
pub fn load_config_file() -> VivaConfigFile {
    let Some(path) = config_file_path() else {
        return VivaConfigFile::default();
    };

    if !path.exists() {
        return VivaConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::debug!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                VivaConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to read config file");
            VivaConfigFile::default()
        }
    }
}
