//! Interactive first-run setup wizard (`viva setup`)

use std::path::PathBuf;

use dialoguer::{Confirm, Input, MultiSelect};

use crate::Section;
use crate::config::file::{
    AsrFileConfig, InterviewFileConfig, LlmFileConfig, TtsFileConfig, VivaConfigFile,
};

/// Run the interactive setup wizard
///
/// # Errors
///
/// Returns error if user input fails or config cannot be written
pub fn run_setup() -> anyhow::Result<()> {
    println!("Viva Setup\n");

    let existing = crate::config::file::load_config_file();
    let config_path = crate::config::file::config_file_path()
        .unwrap_or_else(|| PathBuf::from("~/.config/viva/config.toml"));

    if config_path.exists() {
        println!("Existing config found at {}\n", config_path.display());
    }

    // 1. Candidate details
    let candidate_name: String = Input::new()
        .with_prompt("Candidate name (blank to skip)")
        .with_initial_text(existing.interview.candidate_name.unwrap_or_default())
        .allow_empty(true)
        .interact_text()?;

    let position: String = Input::new()
        .with_prompt("Position")
        .with_initial_text(existing.interview.position.unwrap_or_default())
        .interact_text()?;

    let company: String = Input::new()
        .with_prompt("Target company (blank to skip)")
        .with_initial_text(existing.interview.company.unwrap_or_default())
        .allow_empty(true)
        .interact_text()?;

    let tech_domain: String = Input::new()
        .with_prompt("Technical domain (blank to skip)")
        .with_initial_text(existing.interview.tech_domain.unwrap_or_default())
        .allow_empty(true)
        .interact_text()?;

    let strict_mode = Confirm::new()
        .with_prompt("Strict mode (pressure-style interview)?")
        .default(existing.interview.strict_mode.unwrap_or(false))
        .interact()?;

    // 2. Section selection
    let labels: Vec<&str> = Section::ALL.iter().map(|s| s.title()).collect();
    let preselected: Vec<bool> = existing.interview.sections.as_ref().map_or_else(
        || vec![true; Section::ALL.len()],
        |chosen| {
            Section::ALL
                .iter()
                .map(|s| chosen.iter().any(|c| c == s.id()))
                .collect()
        },
    );

    let picked = MultiSelect::new()
        .with_prompt("Interview sections (space to toggle)")
        .items(&labels)
        .defaults(&preselected)
        .interact()?;

    let sections: Vec<String> = picked
        .into_iter()
        .map(|i| Section::ALL[i].id().to_string())
        .collect();

    // 3. Service credentials
    let asr_url: String = Input::new()
        .with_prompt("Realtime ASR WebSocket URL (signed)")
        .with_initial_text(existing.asr.url.unwrap_or_default())
        .allow_empty(true)
        .interact_text()?;

    let tts_endpoint: String = Input::new()
        .with_prompt("TTS endpoint")
        .with_initial_text(existing.tts.endpoint.unwrap_or_default())
        .allow_empty(true)
        .interact_text()?;

    let tts_api_key: String = Input::new()
        .with_prompt("TTS API key")
        .with_initial_text(existing.tts.api_key.unwrap_or_default())
        .allow_empty(true)
        .interact_text()?;

    let llm_endpoint: String = Input::new()
        .with_prompt("Chat completions endpoint")
        .with_initial_text(existing.llm.endpoint.unwrap_or_default())
        .allow_empty(true)
        .interact_text()?;

    let llm_api_key: String = Input::new()
        .with_prompt("Chat API key")
        .with_initial_text(existing.llm.api_key.unwrap_or_default())
        .allow_empty(true)
        .interact_text()?;

    let config = VivaConfigFile {
        interview: InterviewFileConfig {
            candidate_name: non_empty(candidate_name),
            position: non_empty(position),
            company: non_empty(company),
            tech_domain: non_empty(tech_domain),
            strict_mode: Some(strict_mode),
            sections: Some(sections),
            questions_file: existing.interview.questions_file,
            report_file: existing.interview.report_file,
        },
        turn: existing.turn,
        asr: AsrFileConfig {
            url: non_empty(asr_url),
        },
        tts: TtsFileConfig {
            endpoint: non_empty(tts_endpoint),
            api_key: non_empty(tts_api_key),
            ..existing.tts
        },
        llm: LlmFileConfig {
            endpoint: non_empty(llm_endpoint),
            api_key: non_empty(llm_api_key),
            model: existing.llm.model,
        },
    };

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&config_path, toml::to_string_pretty(&config)?)?;

    println!("\nConfig written to {}", config_path.display());
    println!("Run `viva run` to start an interview.");
    Ok(())
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
