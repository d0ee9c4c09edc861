//! Language detection and translation bridging
//!
//! All translation pivots through English. Detection and translation are
//! best-effort: any failure degrades to pass-through text so a turn never
//! dies on a translation problem.

use std::sync::Arc;

use async_trait::async_trait;

use crate::Result;

/// Pivot language code; the generation backend works in this language
pub const PIVOT_LANGUAGE: &str = "en";

/// Translation service interface
///
/// Both operations may fail (network or service errors); callers decide how
/// to degrade. The bridge below never propagates these failures.
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    /// Translate `text` from `source` to `target` language code
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String>;

    /// Detect the language of `text`, returning its code
    async fn detect(&self, text: &str) -> Result<String>;
}

/// Bidirectional translation to and from the pivot language
pub struct LanguageBridge {
    backend: Arc<dyn TranslationBackend>,
    fallback: String,
}

impl LanguageBridge {
    /// Create a bridge over a translation backend
    ///
    /// `fallback` is the language code reported when detection fails.
    pub fn new(backend: Arc<dyn TranslationBackend>, fallback: impl Into<String>) -> Self {
        Self {
            backend,
            fallback: fallback.into(),
        }
    }

    /// Detect the language of `text` and translate it to the pivot language
    ///
    /// Returns `(detected_code, pivot_text)`. Pivot-language input is
    /// returned unchanged without a round-trip. Detection or translation
    /// failure returns the original text with the best-known code.
    pub async fn to_pivot(&self, text: &str) -> (String, String) {
        if text.trim().is_empty() {
            return (self.fallback.clone(), text.to_string());
        }

        let detected = match self.backend.detect(text).await {
            Ok(code) => code,
            Err(e) => {
                tracing::warn!(error = %e, "language detection failed, assuming fallback");
                return (self.fallback.clone(), text.to_string());
            }
        };

        if detected == PIVOT_LANGUAGE {
            return (detected, text.to_string());
        }

        match self
            .backend
            .translate(text, &detected, PIVOT_LANGUAGE)
            .await
        {
            Ok(translated) => {
                tracing::debug!(from = %detected, "translated input to pivot");
                (detected, translated)
            }
            Err(e) => {
                tracing::warn!(error = %e, from = %detected, "translation failed, passing through");
                (detected, text.to_string())
            }
        }
    }

    /// Translate pivot-language `text` to `target`
    ///
    /// Pivot target returns the input unchanged. Translation failure returns
    /// the untranslated pivot text.
    pub async fn from_pivot(&self, text: &str, target: &str) -> String {
        if target == PIVOT_LANGUAGE {
            return text.to_string();
        }

        match self
            .backend
            .translate(text, PIVOT_LANGUAGE, target)
            .await
        {
            Ok(translated) => translated,
            Err(e) => {
                tracing::warn!(error = %e, to = %target, "reverse translation failed, passing through");
                text.to_string()
            }
        }
    }

    /// Language code used when detection fails
    #[must_use]
    pub fn fallback(&self) -> &str {
        &self.fallback
    }
}

/// Language name to code table, used for presentation and selection only
pub const LANGUAGES: &[(&str, &str)] = &[
    ("afrikaans", "af"),
    ("albanian", "sq"),
    ("amharic", "am"),
    ("arabic", "ar"),
    ("armenian", "hy"),
    ("azerbaijani", "az"),
    ("basque", "eu"),
    ("belarusian", "be"),
    ("bengali", "bn"),
    ("bosnian", "bs"),
    ("bulgarian", "bg"),
    ("catalan", "ca"),
    ("cebuano", "ceb"),
    ("chichewa", "ny"),
    ("chinese (simplified)", "zh-cn"),
    ("chinese (traditional)", "zh-tw"),
    ("corsican", "co"),
    ("croatian", "hr"),
    ("czech", "cs"),
    ("danish", "da"),
    ("dutch", "nl"),
    ("english", "en"),
    ("esperanto", "eo"),
    ("estonian", "et"),
    ("filipino", "tl"),
    ("finnish", "fi"),
    ("french", "fr"),
    ("frisian", "fy"),
    ("galician", "gl"),
    ("georgian", "ka"),
    ("german", "de"),
    ("greek", "el"),
    ("gujarati", "gu"),
    ("haitian creole", "ht"),
    ("hausa", "ha"),
    ("hawaiian", "haw"),
    ("hebrew", "he"),
    ("hindi", "hi"),
    ("hmong", "hmn"),
    ("hungarian", "hu"),
    ("icelandic", "is"),
    ("igbo", "ig"),
    ("indonesian", "id"),
    ("irish", "ga"),
    ("italian", "it"),
    ("japanese", "ja"),
    ("javanese", "jw"),
    ("kannada", "kn"),
    ("kazakh", "kk"),
    ("khmer", "km"),
    ("korean", "ko"),
    ("kurdish (kurmanji)", "ku"),
    ("kyrgyz", "ky"),
    ("lao", "lo"),
    ("latin", "la"),
    ("latvian", "lv"),
    ("lithuanian", "lt"),
    ("luxembourgish", "lb"),
    ("macedonian", "mk"),
    ("malagasy", "mg"),
    ("malay", "ms"),
    ("malayalam", "ml"),
    ("maltese", "mt"),
    ("maori", "mi"),
    ("marathi", "mr"),
    ("mongolian", "mn"),
    ("myanmar (burmese)", "my"),
    ("nepali", "ne"),
    ("norwegian", "no"),
    ("odia", "or"),
    ("pashto", "ps"),
    ("persian", "fa"),
    ("polish", "pl"),
    ("portuguese", "pt"),
    ("punjabi", "pa"),
    ("romanian", "ro"),
    ("russian", "ru"),
    ("samoan", "sm"),
    ("scots gaelic", "gd"),
    ("serbian", "sr"),
    ("sesotho", "st"),
    ("shona", "sn"),
    ("sindhi", "sd"),
    ("sinhala", "si"),
    ("slovak", "sk"),
    ("slovenian", "sl"),
    ("somali", "so"),
    ("spanish", "es"),
    ("sundanese", "su"),
    ("swahili", "sw"),
    ("swedish", "sv"),
    ("tajik", "tg"),
    ("tamil", "ta"),
    ("telugu", "te"),
    ("thai", "th"),
    ("turkish", "tr"),
    ("ukrainian", "uk"),
    ("urdu", "ur"),
    ("uyghur", "ug"),
    ("uzbek", "uz"),
    ("vietnamese", "vi"),
    ("welsh", "cy"),
    ("xhosa", "xh"),
    ("yiddish", "yi"),
    ("yoruba", "yo"),
    ("zulu", "zu"),
];

/// Look up a language code by its English name (case-insensitive)
#[must_use]
pub fn code_for_name(name: &str) -> Option<&'static str> {
    let name = name.to_lowercase();
    LANGUAGES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, code)| *code)
}

/// Look up a language name by its code
#[must_use]
pub fn name_for_code(code: &str) -> Option<&'static str> {
    let code = code.to_lowercase();
    LANGUAGES
        .iter()
        .find(|(_, c)| *c == code)
        .map(|(name, _)| *name)
}

/// Resolve a user-supplied language name or code to a code
///
/// Returns `None` when the input matches neither column of the table.
#[must_use]
pub fn resolve(input: &str) -> Option<&'static str> {
    let lowered = input.to_lowercase();
    code_for_name(&lowered).or_else(|| {
        LANGUAGES
            .iter()
            .find(|(_, c)| *c == lowered)
            .map(|(_, code)| *code)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    struct UppercaseBackend;

    #[async_trait]
    impl TranslationBackend for UppercaseBackend {
        async fn translate(&self, text: &str, _source: &str, _target: &str) -> Result<String> {
            Ok(text.to_uppercase())
        }

        async fn detect(&self, text: &str) -> Result<String> {
            if text.contains("hola") {
                Ok("es".to_string())
            } else {
                Ok("en".to_string())
            }
        }
    }

    struct FailingBackend;

    #[async_trait]
    impl TranslationBackend for FailingBackend {
        async fn translate(&self, _text: &str, _source: &str, _target: &str) -> Result<String> {
            Err(Error::Translation("service down".to_string()))
        }

        async fn detect(&self, _text: &str) -> Result<String> {
            Err(Error::Detection("service down".to_string()))
        }
    }

    #[tokio::test]
    async fn pivot_input_is_never_round_tripped() {
        let bridge = LanguageBridge::new(Arc::new(UppercaseBackend), "en");
        let (code, text) = bridge.to_pivot("hello there").await;
        assert_eq!(code, "en");
        assert_eq!(text, "hello there");
    }

    #[tokio::test]
    async fn non_pivot_input_is_translated() {
        let bridge = LanguageBridge::new(Arc::new(UppercaseBackend), "en");
        let (code, text) = bridge.to_pivot("hola amigo").await;
        assert_eq!(code, "es");
        assert_eq!(text, "HOLA AMIGO");
    }

    #[tokio::test]
    async fn from_pivot_with_pivot_target_is_identity() {
        let bridge = LanguageBridge::new(Arc::new(UppercaseBackend), "en");
        assert_eq!(bridge.from_pivot("hello", "en").await, "hello");
    }

    #[tokio::test]
    async fn failures_degrade_to_pass_through() {
        let bridge = LanguageBridge::new(Arc::new(FailingBackend), "en");

        let (code, text) = bridge.to_pivot("bonjour").await;
        assert_eq!(code, "en");
        assert_eq!(text, "bonjour");

        assert_eq!(bridge.from_pivot("hello", "fr").await, "hello");
    }

    #[tokio::test]
    async fn empty_input_skips_detection() {
        let bridge = LanguageBridge::new(Arc::new(FailingBackend), "de");
        let (code, text) = bridge.to_pivot("   ").await;
        assert_eq!(code, "de");
        assert_eq!(text, "   ");
    }

    #[test]
    fn table_lookups() {
        assert_eq!(code_for_name("Spanish"), Some("es"));
        assert_eq!(name_for_code("JA"), Some("japanese"));
        assert_eq!(resolve("german"), Some("de"));
        assert_eq!(resolve("de"), Some("de"));
        assert_eq!(resolve("klingon"), None);
    }
}
