//! Shared test doubles
//!
//! Deterministic stand-ins for the generation and translation services so
//! pipeline behavior can be tested without hardware or network.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parley_assistant::conversation::GenerationContext;
use parley_assistant::{Error, GenerationBackend, GenerationOutcome, Result, TranslationBackend};

/// Echoes the newest utterance back, numbering turns via its carry-over
///
/// Replies look like `echo 3: <utterance>`; the number comes from the prior
/// carry-over, so it proves the context round-trips through the pipeline.
#[derive(Default)]
pub struct EchoBackend {
    pub calls: AtomicUsize,
}

impl EchoBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationBackend for EchoBackend {
    async fn generate(
        &self,
        history: &[String],
        prior: Option<&GenerationContext>,
    ) -> Result<GenerationOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let turn = prior
            .and_then(|c| c.payload().get("turns"))
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(0)
            + 1;
        let newest = history.last().cloned().unwrap_or_default();

        Ok(GenerationOutcome {
            reply: format!("echo {turn}: {newest}"),
            context: GenerationContext::new(serde_json::json!({ "turns": turn })),
        })
    }
}

/// Always fails, as an unreachable generation service would
pub struct OfflineBackend;

#[async_trait]
impl GenerationBackend for OfflineBackend {
    async fn generate(
        &self,
        _history: &[String],
        _prior: Option<&GenerationContext>,
    ) -> Result<GenerationOutcome> {
        Err(Error::Generation("backend offline".to_string()))
    }
}

/// Marker-based translator: text starting with `es:` is "Spanish"
///
/// Translations are tagged with `[source->target]` so tests can assert
/// exactly which translations happened.
pub struct MarkerTranslator;

#[async_trait]
impl TranslationBackend for MarkerTranslator {
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String> {
        Ok(format!("{text} [{source}->{target}]"))
    }

    async fn detect(&self, text: &str) -> Result<String> {
        if text.starts_with("es:") {
            Ok("es".to_string())
        } else {
            Ok("en".to_string())
        }
    }
}

/// Always fails, as an unreachable translation service would
pub struct OfflineTranslator;

#[async_trait]
impl TranslationBackend for OfflineTranslator {
    async fn translate(&self, _text: &str, _source: &str, _target: &str) -> Result<String> {
        Err(Error::Translation("translator offline".to_string()))
    }

    async fn detect(&self, _text: &str) -> Result<String> {
        Err(Error::Detection("translator offline".to_string()))
    }
}
