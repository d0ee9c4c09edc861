//! Speech recognition
//!
//! Transcribes WAV audio through the Whisper transcription API. The
//! verbose response reports the spoken language, which feeds the turn
//! pipeline's translation decision without a second recognition pass.

use serde::Deserialize;

use crate::language;
use crate::{Error, Result};

/// Transcribed speech plus the language it was spoken in
#[derive(Debug, Clone)]
pub struct Transcription {
    /// Recognized text
    pub text: String,

    /// Language code (detected, or the forced language when auto-detect
    /// is off)
    pub language: String,
}

/// Verbose Whisper transcription response
#[derive(Deserialize)]
struct WhisperResponse {
    text: String,
    /// Full language name, e.g. "english"
    language: Option<String>,
}

/// Transcribes speech to text
pub struct Transcriber {
    client: reqwest::Client,
    api_key: String,
    model: String,
    forced_language: Option<String>,
    fallback_language: String,
}

impl Transcriber {
    /// Create a transcriber
    ///
    /// `forced_language` pins recognition to one language code (auto-detect
    /// off); `fallback_language` is reported when the service omits the
    /// spoken language.
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new(
        api_key: Option<String>,
        model: String,
        forced_language: Option<String>,
        fallback_language: String,
    ) -> Result<Self> {
        let api_key = api_key
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::Config("OPENAI_API_KEY required for speech input".to_string()))?;

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            forced_language,
            fallback_language,
        })
    }

    /// Transcribe WAV audio to text
    ///
    /// # Errors
    ///
    /// Returns error if the transcription request fails
    pub async fn transcribe(&self, audio: &[u8]) -> Result<Transcription> {
        tracing::debug!(audio_bytes = audio.len(), "starting transcription");

        let mut form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio.to_vec())
                    .file_name("audio.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Stt(e.to_string()))?,
            )
            .text("model", self.model.clone())
            .text("response_format", "verbose_json");

        if let Some(ref lang) = self.forced_language {
            form = form.text("language", lang.clone());
        }

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/transcriptions")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "transcription request failed");
                Error::Stt(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "transcription API error");
            return Err(Error::Stt(format!("API error {status}: {body}")));
        }

        let result: WhisperResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse transcription response");
            Error::Stt(e.to_string())
        })?;

        let language = self.resolve_language(result.language.as_deref());

        tracing::info!(transcript = %result.text, language = %language, "transcription complete");
        Ok(Transcription {
            text: result.text,
            language,
        })
    }

    /// Map the service's reported language name to a code
    fn resolve_language(&self, reported: Option<&str>) -> String {
        if let Some(ref forced) = self.forced_language {
            return forced.clone();
        }

        reported
            .and_then(language::resolve)
            .map_or_else(|| self.fallback_language.clone(), ToString::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transcriber(forced: Option<&str>) -> Transcriber {
        Transcriber::new(
            Some("test-key".to_string()),
            "whisper-1".to_string(),
            forced.map(ToString::to_string),
            "en".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn missing_key_is_rejected() {
        assert!(Transcriber::new(None, "whisper-1".to_string(), None, "en".to_string()).is_err());
        assert!(
            Transcriber::new(Some(String::new()), "whisper-1".to_string(), None, "en".to_string())
                .is_err()
        );
    }

    #[test]
    fn reported_language_name_maps_to_code() {
        let t = transcriber(None);
        assert_eq!(t.resolve_language(Some("spanish")), "es");
        assert_eq!(t.resolve_language(Some("English")), "en");
    }

    #[test]
    fn unknown_or_missing_language_falls_back() {
        let t = transcriber(None);
        assert_eq!(t.resolve_language(Some("klingon")), "en");
        assert_eq!(t.resolve_language(None), "en");
    }

    #[test]
    fn forced_language_wins() {
        let t = transcriber(Some("de"));
        assert_eq!(t.resolve_language(Some("spanish")), "de");
    }
}
