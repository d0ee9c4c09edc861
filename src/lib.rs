//! Parley - a wake-word-gated voice assistant
//!
//! This library wires a generation backend, speech recognition, speech
//! synthesis, and machine translation behind a per-utterance turn pipeline:
//!
//! ```text
//! utterance ──► CommandSet ──short-circuit──► reply
//!                   │
//!              not a command
//!                   ▼
//!            LanguageBridge.to_pivot
//!                   ▼
//!            ConversationState (bounded FIFO)
//!                   ▼
//!            GenerationBackend.generate ──► carry-over stored
//!                   ▼
//!            LanguageBridge.from_pivot ──► reply
//! ```
//!
//! Inference, recognition, synthesis, and translation are all delegated to
//! external services behind traits; the code here is orchestration.

pub mod commands;
pub mod config;
pub mod conversation;
pub mod error;
pub mod generation;
pub mod language;
pub mod providers;
pub mod session;
pub mod transcript;
pub mod turn;
pub mod voice;

pub use commands::{CommandOutcome, CommandSet};
pub use config::Config;
pub use conversation::{ConversationState, GenerationContext};
pub use error::{Error, Result};
pub use generation::{GenerationBackend, GenerationOutcome};
pub use language::{LanguageBridge, PIVOT_LANGUAGE, TranslationBackend};
pub use session::Session;
pub use turn::{TurnProcessor, TurnReply};
