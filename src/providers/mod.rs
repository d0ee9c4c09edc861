//! HTTP adapters for the generation and translation backend traits

mod generation;
mod translation;

pub use generation::ChatCompletionsBackend;
pub use translation::LibreTranslateBackend;
