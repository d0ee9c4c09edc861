//! LibreTranslate-compatible translation backend

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::language::TranslationBackend;
use crate::{Error, Result};

#[derive(Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

#[derive(Serialize)]
struct DetectRequest<'a> {
    q: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Deserialize)]
struct Detection {
    language: String,
}

/// Translation backend over a LibreTranslate-compatible HTTP API
pub struct LibreTranslateBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl LibreTranslateBackend {
    /// Create a backend for the service at `base_url`
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }
}

#[async_trait]
impl TranslationBackend for LibreTranslateBackend {
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String> {
        let request = TranslateRequest {
            q: text,
            source,
            target,
            format: "text",
            api_key: self.api_key.as_deref(),
        };

        let response = self
            .client
            .post(format!("{}/translate", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Translation(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Translation(format!(
                "translate API error {status}: {body}"
            )));
        }

        let result: TranslateResponse = response
            .json()
            .await
            .map_err(|e| Error::Translation(e.to_string()))?;

        tracing::debug!(source, target, "translation complete");
        Ok(result.translated_text)
    }

    async fn detect(&self, text: &str) -> Result<String> {
        let request = DetectRequest {
            q: text,
            api_key: self.api_key.as_deref(),
        };

        let response = self
            .client
            .post(format!("{}/detect", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Detection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Detection(format!(
                "detect API error {status}: {body}"
            )));
        }

        let detections: Vec<Detection> = response
            .json()
            .await
            .map_err(|e| Error::Detection(e.to_string()))?;

        detections
            .into_iter()
            .next()
            .map(|d| d.language)
            .ok_or_else(|| Error::Detection("no language detected".to_string()))
    }
}
