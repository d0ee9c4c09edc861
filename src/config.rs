//! Configuration management for the Parley assistant

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{Error, Result};

/// Default configuration compiled into the binary, used when no config
/// file is present on disk
const EMBEDDED_DEFAULT: &str = include_str!("../config/default.toml");

/// Assistant configuration
///
/// Loaded once before the session starts and treated as immutable for its
/// lifetime.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Language and translation settings
    pub language: LanguageConfig,

    /// Generation backend settings
    pub model: ModelConfig,

    /// Command phrase table
    pub commands: CommandsConfig,

    /// Wake word settings
    pub wake: WakeConfig,

    /// Voice input/output settings
    pub voice: VoiceConfig,

    /// Translation service settings
    pub translation: TranslationConfig,

    /// Conversation transcript settings
    pub transcript: TranscriptConfig,

    /// API keys (environment only, never from file)
    #[serde(skip)]
    pub api_keys: ApiKeys,
}

/// Language handling configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LanguageConfig {
    /// Default language code assumed when detection is unavailable
    pub default: String,

    /// Translate non-English input to English and replies back
    pub translation_enabled: bool,

    /// Detect the spoken language during transcription
    pub auto_detect: bool,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            default: "en".to_string(),
            translation_enabled: true,
            auto_detect: true,
        }
    }
}

/// Generation backend configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Base URL of an OpenAI-compatible chat completions API
    pub base_url: String,

    /// Model identifier sent with each request
    pub name: String,

    /// Maximum user utterances retained in conversation history
    pub max_history: usize,

    /// Maximum tokens per generated reply
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// Nucleus sampling threshold
    pub top_p: f32,

    /// Message cap for the backend's running dialogue context
    pub max_context_messages: usize,

    /// Optional system prompt prepended to every request
    pub system_prompt: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/v1".to_string(),
            name: "parley-chat".to_string(),
            max_history: 5,
            max_tokens: 256,
            temperature: 0.7,
            top_p: 0.9,
            max_context_messages: 20,
            system_prompt: None,
        }
    }
}

/// Command phrase configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CommandsConfig {
    /// Phrases that end the session (matched by exact lowercase equality)
    pub exit_phrases: Vec<String>,

    /// Farewell spoken when an exit phrase is heard
    pub farewell: String,

    /// Command types in dispatch order; first matching type wins
    pub custom: Vec<CommandPhrases>,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            exit_phrases: ["bye", "goodbye", "exit", "quit", "stop"]
                .map(String::from)
                .to_vec(),
            farewell: "Goodbye!".to_string(),
            custom: default_command_table(),
        }
    }
}

/// Trigger phrases for one command type
#[derive(Debug, Clone, Deserialize)]
pub struct CommandPhrases {
    /// Command type label (unique; handlers are looked up by label)
    pub label: String,

    /// Case-insensitive trigger phrases
    pub phrases: Vec<String>,
}

fn default_command_table() -> Vec<CommandPhrases> {
    let table = [
        (
            "time",
            &["what time is it", "tell me the time", "current time"][..],
        ),
        (
            "date",
            &["what day is it", "what is the date", "today's date"][..],
        ),
        (
            "weather",
            &["what's the weather", "weather forecast", "how's the weather"][..],
        ),
        ("help", &["what can you do", "help me", "show commands"][..]),
    ];

    table
        .into_iter()
        .map(|(label, phrases)| CommandPhrases {
            label: label.to_string(),
            phrases: phrases.iter().map(ToString::to_string).collect(),
        })
        .collect()
}

/// Wake word configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WakeConfig {
    /// Wake phrase that activates the assistant (e.g. "hey parley")
    pub phrase: String,

    /// Spoken acknowledgment when the wake phrase arrives with no command
    pub acknowledgment: String,
}

impl Default for WakeConfig {
    fn default() -> Self {
        Self {
            phrase: "hey parley".to_string(),
            acknowledgment: "I'm listening".to_string(),
        }
    }
}

/// Voice processing configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Enable voice input/output (text mode otherwise)
    pub enabled: bool,

    /// STT model identifier (e.g. "whisper-1")
    pub stt_model: String,

    /// TTS model identifier (e.g. "tts-1")
    pub tts_model: String,

    /// TTS voice identifier
    pub tts_voice: String,

    /// TTS speed multiplier (0.25 to 4.0)
    pub tts_speed: f64,

    /// ElevenLabs voice ID used when the primary TTS provider fails
    pub tts_fallback_voice: Option<String>,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            stt_model: "whisper-1".to_string(),
            tts_model: "tts-1".to_string(),
            tts_voice: "alloy".to_string(),
            tts_speed: 1.0,
            tts_fallback_voice: None,
        }
    }
}

/// Translation service configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// Base URL of a LibreTranslate-compatible service
    pub url: String,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:5000".to_string(),
        }
    }
}

/// Conversation transcript configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TranscriptConfig {
    /// Write a plain-text transcript of each session
    pub enabled: bool,

    /// Directory for transcript files; defaults to the data directory
    pub dir: Option<PathBuf>,
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
        }
    }
}

/// API keys for external services
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// `OpenAI` API key (generation, Whisper, TTS)
    pub openai: Option<String>,

    /// `ElevenLabs` API key (fallback TTS)
    pub elevenlabs: Option<String>,

    /// LibreTranslate API key (optional; public instances require one)
    pub libretranslate: Option<String>,
}

impl ApiKeys {
    /// Load API keys from the environment
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            openai: std::env::var("OPENAI_API_KEY").ok(),
            elevenlabs: std::env::var("ELEVENLABS_API_KEY").ok(),
            libretranslate: std::env::var("LIBRETRANSLATE_API_KEY").ok(),
        }
    }
}

/// Return the XDG data directory for transcripts and session files
///
/// Uses `~/.local/share/omni/parley/` on Linux
#[must_use]
pub fn data_dir() -> PathBuf {
    directories::ProjectDirs::from("dev", "omni", "omni")
        .map_or_else(|| PathBuf::from("."), |d| d.data_dir().join("parley"))
}

impl Config {
    /// Load configuration
    ///
    /// Resolution order: explicit path, then `parley.toml` in the XDG config
    /// directory, then the embedded default. Environment overrides are
    /// applied last.
    ///
    /// # Errors
    ///
    /// Returns error if an explicit config file is missing or unparseable
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_file(path)?,
            None => match Self::find_config_file() {
                Some(path) => Self::load_file(&path)?,
                None => {
                    tracing::debug!("no config file found, using embedded default");
                    toml::from_str(EMBEDDED_DEFAULT)?
                }
            },
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Parse a config file from disk
    fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        let config: Self = toml::from_str(&content)?;
        tracing::info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Locate `parley.toml` in the XDG config directory
    fn find_config_file() -> Option<PathBuf> {
        let dirs = directories::ProjectDirs::from("dev", "omni", "omni")?;
        let path = dirs.config_dir().join("parley").join("parley.toml");
        path.exists().then_some(path)
    }

    /// Apply environment variable overrides
    fn apply_env(&mut self) {
        self.api_keys = ApiKeys::from_env();

        if let Ok(url) = std::env::var("PARLEY_GENERATION_URL") {
            self.model.base_url = url;
        }
        if let Ok(url) = std::env::var("PARLEY_TRANSLATION_URL") {
            self.translation.url = url;
        }
        if let Ok(model) = std::env::var("PARLEY_MODEL") {
            self.model.name = model;
        }
    }

    /// Reject configurations the pipeline cannot run with
    fn validate(&self) -> Result<()> {
        if self.wake.phrase.trim().is_empty() {
            return Err(Error::Config("wake.phrase must not be empty".to_string()));
        }

        let mut seen = std::collections::HashSet::new();
        for entry in &self.commands.custom {
            if !seen.insert(entry.label.as_str()) {
                return Err(Error::Config(format!(
                    "duplicate command label: {}",
                    entry.label
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_default_matches_built_in_defaults() {
        let parsed: Config = toml::from_str(EMBEDDED_DEFAULT).unwrap();
        let built_in = Config::default();

        assert_eq!(parsed.language.default, built_in.language.default);
        assert_eq!(parsed.model.max_history, built_in.model.max_history);
        assert_eq!(parsed.wake.phrase, built_in.wake.phrase);
        assert_eq!(parsed.commands.exit_phrases, built_in.commands.exit_phrases);
        assert_eq!(parsed.voice.tts_voice, built_in.voice.tts_voice);
        assert!(parsed.commands.exit_phrases.contains(&"goodbye".to_string()));
    }

    #[test]
    fn default_command_table_order() {
        let config = Config::default();
        let labels: Vec<&str> = config
            .commands
            .custom
            .iter()
            .map(|c| c.label.as_str())
            .collect();
        assert_eq!(labels, ["time", "date", "weather", "help"]);
    }

    #[test]
    fn duplicate_labels_rejected() {
        let mut config = Config::default();
        config.commands.custom.push(CommandPhrases {
            label: "time".to_string(),
            phrases: vec!["again".to_string()],
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_wake_phrase_rejected() {
        let mut config = Config::default();
        config.wake.phrase = "  ".to_string();
        assert!(config.validate().is_err());
    }
}
