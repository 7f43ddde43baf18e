use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use viva_gateway::asr::RtasrChannel;
use viva_gateway::audio::{
    CaptureSource, CaptureStream as _, MicSource, PlaybackSink, SpeakerSink, samples_to_wav,
};
use viva_gateway::dialogue::{RecordingSession, SpeechTurn};
use viva_gateway::interview::{InterviewRunner, InterviewSummary, ReportWriter};
use viva_gateway::llm::ChatClient;
use viva_gateway::tts::{HttpSynthesizer, Synthesizer};
use viva_gateway::{Config, QuestionBank};

/// Viva - voice interview gateway
#[derive(Parser)]
#[command(name = "viva", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the configured interview
    Run,
    /// Score an existing interview transcript
    Summarize,
    /// Interactive first-run setup
    Setup,
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,

        /// Save the captured audio to a WAV file
        #[arg(long)]
        save: Option<std::path::PathBuf>,
    },
    /// Test speaker output
    TestSpeaker,
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,viva_gateway=info",
        1 => "info,viva_gateway=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Command::Setup) => return viva_gateway::setup::run_setup(),
        Some(Command::TestMic { duration, save }) => return test_mic(duration, save).await,
        Some(Command::TestSpeaker) => return test_speaker(),
        Some(Command::TestTts { text }) => return test_tts(&text).await,
        Some(Command::Summarize) => return summarize().await,
        Some(Command::Run) | None => {}
    }

    let config = Config::load()?;
    tracing::info!(
        position = %config.interview.position,
        sections = config.interview.sections.len(),
        "starting interview"
    );

    let synthesizer: Arc<dyn Synthesizer> = Arc::new(HttpSynthesizer::new(config.tts.clone())?);
    let sink = Arc::new(SpeakerSink::new()?);
    let connector = Arc::new(RtasrChannel::new(config.asr.clone())?);

    let session = RecordingSession::new(
        Arc::new(MicSource),
        connector,
        config.capture,
        config.turn,
    );
    let orchestrator = SpeechTurn::new(synthesizer, sink, session, config.tts.max_concurrency);

    let chat = match ChatClient::new(config.llm.clone()) {
        Ok(client) => Some(client),
        Err(e) => {
            tracing::warn!(error = %e, "chat unavailable, reverse questions will not be answered");
            None
        }
    };

    let bank = QuestionBank::load(&config.interview.questions_file)?;
    let report = ReportWriter::new(config.interview.report_file.clone());

    let runner = InterviewRunner::new(config.interview, orchestrator, chat, bank, report);
    let summary = runner.run().await?;

    println!(
        "Interview finished: {} section(s) completed, {} failed",
        summary.completed.len(),
        summary.failed.len()
    );
    for (section, reason) in &summary.failed {
        println!("  failed: {section} ({reason})");
    }

    Ok(())
}

/// Score an existing transcript with the chat model
async fn summarize() -> anyhow::Result<()> {
    let config = Config::load()?;
    let report = ReportWriter::new(config.interview.report_file.clone());
    let content = report.read()?;

    let chat = ChatClient::new(config.llm)?;
    let summary = InterviewSummary::new(chat).score_report(&content).await?;

    let out_path = config.interview.report_file.with_file_name("summary.md");
    std::fs::write(&out_path, summary.to_markdown())?;

    println!("Weighted total: {:.1} / 100", summary.total);
    println!("Summary written to {}", out_path.display());
    Ok(())
}

/// Test microphone input
async fn test_mic(duration: u64, save: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let config = Config::load()?;
    let mut stream = MicSource.open(&config.capture)?;

    let frames_per_sec =
        u64::try_from(1000 / config.capture.frame_interval.as_millis().max(1)).unwrap_or(25);
    let mut captured: Vec<u8> = Vec::new();

    for second in 0..duration {
        let mut level = 0u16;
        for _ in 0..frames_per_sec {
            let frame = stream.read_frame().await?;
            level = level.max(peak_level(&frame.bytes));
            captured.extend_from_slice(&frame.bytes);
        }

        // Visual meter
        let meter_len = usize::from(level / 1024).min(32);
        let meter: String = "#".repeat(meter_len) + &" ".repeat(32 - meter_len);
        println!("[{:2}s] peak: {:5} | [{}]", second + 1, level, meter);
    }

    stream.close();

    if let Some(path) = save {
        let samples: Vec<f32> = captured
            .chunks_exact(2)
            .map(|b| f32::from(i16::from_le_bytes([b[0], b[1]])) / 32768.0)
            .collect();
        let wav = samples_to_wav(&samples, config.capture.sample_rate)?;
        std::fs::write(&path, wav)?;
        println!("\nSaved capture to {}", path.display());
    }

    println!("\n---");
    println!("If you saw movement in the meter, your mic is working!");
    Ok(())
}

/// Peak absolute sample value in a little-endian s16 frame
fn peak_level(bytes: &[u8]) -> u16 {
    bytes
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]).unsigned_abs())
        .max()
        .unwrap_or(0)
}

/// Test speaker output with a sine wave
fn test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let sink = SpeakerSink::new()?;

    // 2 seconds of 440Hz sine at the playback rate, 30% volume
    let sample_rate = 24_000usize;
    let num_samples = sample_rate * 2;

    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.3
        })
        .collect();

    println!("Playing {} samples at {sample_rate} Hz...", samples.len());
    sink.play_samples(samples)?;

    println!("\n---");
    println!("If you heard the tone, your speakers are working!");
    Ok(())
}

/// Test TTS synthesis and playback
async fn test_tts(text: &str) -> anyhow::Result<()> {
    println!("Testing TTS with text: \"{text}\"\n");

    let config = Config::load()?;
    let synthesizer = HttpSynthesizer::new(config.tts)?;

    println!("Synthesizing speech...");
    let audio = synthesizer.synthesize(text).await?;
    println!("Got {} bytes of audio data", audio.len());

    println!("Playing audio...");
    let sink = SpeakerSink::new()?;
    sink.play(&audio).await?;

    // Let the device settle before exit
    tokio::time::sleep(Duration::from_millis(100)).await;

    println!("\n---");
    println!("If you heard the speech, TTS is working!");
    Ok(())
}
