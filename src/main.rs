use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use parley_assistant::voice::{
    Microphone, PLAYBACK_SAMPLE_RATE, SAMPLE_RATE, Speaker, Synthesizer,
};
use parley_assistant::{Config, Session, language};

/// Parley - wake-word-gated voice assistant
#[derive(Parser)]
#[command(name = "parley", version, about)]
struct Cli {
    /// Path to a config file (defaults to the XDG config directory)
    #[arg(short, long, env = "PARLEY_CONFIG")]
    config: Option<PathBuf>,

    /// Text-only mode (no audio hardware required)
    #[arg(long, env = "PARLEY_TEXT_ONLY")]
    text: bool,

    /// Force the input language (name or code); skips detection
    #[arg(short, long)]
    language: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output
    TestSpeaker,
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
    /// List supported language names and codes
    Languages,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,parley_assistant=info",
        1 => "info,parley_assistant=debug",
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
    let config_path = cli.config.as_deref();

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::TestMic { duration } => test_mic(duration).await,
            Command::TestSpeaker => test_speaker(),
            Command::TestTts { text } => test_tts(config_path, &text).await,
            Command::Languages => {
                list_languages();
                Ok(())
            }
        };
    }

    let mut config = Config::load(config_path)?;
    if cli.text {
        config.voice.enabled = false;
    }

    let language_override = cli
        .language
        .map(|input| {
            language::resolve(&input)
                .map(ToString::to_string)
                .ok_or_else(|| anyhow::anyhow!("unknown language: {input}"))
        })
        .transpose()?;

    tracing::info!(
        voice = config.voice.enabled,
        language = ?language_override,
        "starting parley"
    );

    let session = Session::new(config, language_override)?;
    session.run().await?;
    Ok(())
}

/// Record from the default microphone and report what was captured
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    let mut mic = Microphone::open()?;
    mic.start()?;

    println!("Recording for {duration} seconds...");
    tokio::time::sleep(Duration::from_secs(duration)).await;

    let samples = mic.drain();
    mic.stop();

    #[allow(clippy::cast_precision_loss)]
    let seconds = samples.len() as f32 / SAMPLE_RATE as f32;
    println!("Captured {} samples ({seconds:.1}s of audio).", samples.len());
    Ok(())
}

/// Play a short test tone
fn test_speaker() -> anyhow::Result<()> {
    let speaker = Speaker::open()?;

    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..PLAYBACK_SAMPLE_RATE)
        .map(|i| {
            let t = i as f32 / PLAYBACK_SAMPLE_RATE as f32;
            0.2 * (2.0 * std::f32::consts::PI * 440.0 * t).sin()
        })
        .collect();

    println!("Playing test tone...");
    speaker.play_samples(&samples)?;
    Ok(())
}

/// Synthesize text and play it
async fn test_tts(config_path: Option<&Path>, text: &str) -> anyhow::Result<()> {
    let config = Config::load(config_path)?;
    let synthesizer = Synthesizer::new(
        &config.voice,
        config.api_keys.openai.clone(),
        config.api_keys.elevenlabs.clone(),
    )?;

    println!("Synthesizing: {text}");
    let audio = synthesizer.synthesize(text).await?;

    let speaker = Speaker::open()?;
    speaker.play_mp3(&audio)?;
    Ok(())
}

/// Print the language name/code table
fn list_languages() {
    let mut languages = language::LANGUAGES.to_vec();
    languages.sort_unstable_by_key(|(name, _)| *name);

    for (name, code) in languages {
        println!("{name} ({code})");
    }
}
