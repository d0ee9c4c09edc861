//! Speech synthesis
//!
//! Primary synthesis through the OpenAI TTS API with an optional ElevenLabs
//! fallback: if the primary provider fails, the fallback is tried before
//! the error is surfaced.

use serde::Serialize;

use crate::config::VoiceConfig;
use crate::{Error, Result};

struct OpenAiTts {
    api_key: String,
    model: String,
    voice: String,
    speed: f64,
}

struct ElevenLabsTts {
    api_key: String,
    voice_id: String,
}

/// Synthesizes speech (MP3 bytes) from text
pub struct Synthesizer {
    client: reqwest::Client,
    primary: OpenAiTts,
    fallback: Option<ElevenLabsTts>,
}

impl Synthesizer {
    /// Create a synthesizer from voice configuration and API keys
    ///
    /// # Errors
    ///
    /// Returns error if the primary provider's API key is missing
    pub fn new(
        config: &VoiceConfig,
        openai_key: Option<String>,
        elevenlabs_key: Option<String>,
    ) -> Result<Self> {
        let api_key = openai_key
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::Config("OPENAI_API_KEY required for speech output".to_string()))?;

        let primary = OpenAiTts {
            api_key,
            model: config.tts_model.clone(),
            voice: config.tts_voice.clone(),
            speed: config.tts_speed,
        };

        let fallback = match (elevenlabs_key, &config.tts_fallback_voice) {
            (Some(key), Some(voice_id)) if !key.is_empty() => Some(ElevenLabsTts {
                api_key: key,
                voice_id: voice_id.clone(),
            }),
            _ => None,
        };

        Ok(Self {
            client: reqwest::Client::new(),
            primary,
            fallback,
        })
    }

    /// Synthesize text to MP3 bytes, trying the fallback provider if the
    /// primary fails
    ///
    /// # Errors
    ///
    /// Returns error if every configured provider fails
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        match self.synthesize_openai(text).await {
            Ok(audio) => Ok(audio),
            Err(e) => match &self.fallback {
                Some(fallback) => {
                    tracing::warn!(error = %e, "primary TTS failed, trying fallback");
                    self.synthesize_elevenlabs(fallback, text).await
                }
                None => Err(e),
            },
        }
    }

    async fn synthesize_openai(&self, text: &str) -> Result<Vec<u8>> {
        #[derive(Serialize)]
        struct TtsRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f64,
        }

        let request = TtsRequest {
            model: &self.primary.model,
            input: text,
            voice: &self.primary.voice,
            speed: self.primary.speed,
        };

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/speech")
            .header("Authorization", format!("Bearer {}", self.primary.api_key))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("OpenAI TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }

    async fn synthesize_elevenlabs(&self, fallback: &ElevenLabsTts, text: &str) -> Result<Vec<u8>> {
        #[derive(Serialize)]
        struct ElevenLabsRequest<'a> {
            text: &'a str,
            model_id: &'a str,
        }

        let url = format!(
            "https://api.elevenlabs.io/v1/text-to-speech/{}",
            fallback.voice_id
        );

        let request = ElevenLabsRequest {
            text,
            model_id: "eleven_multilingual_v2",
        };

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &fallback.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("ElevenLabs TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_primary_key_is_rejected() {
        let config = VoiceConfig::default();
        assert!(Synthesizer::new(&config, None, None).is_err());
    }

    #[test]
    fn fallback_requires_both_key_and_voice() {
        let mut config = VoiceConfig::default();

        let synth =
            Synthesizer::new(&config, Some("key".to_string()), Some("el-key".to_string()))
                .unwrap();
        assert!(synth.fallback.is_none());

        config.tts_fallback_voice = Some("voice-id".to_string());
        let synth =
            Synthesizer::new(&config, Some("key".to_string()), Some("el-key".to_string()))
                .unwrap();
        assert!(synth.fallback.is_some());
    }
}
