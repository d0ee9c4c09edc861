//! Per-utterance turn processing
//!
//! The pipeline for one user utterance: command short-circuit, language
//! normalization to the pivot, history bookkeeping, response generation,
//! reverse translation. One processor per session; turns run strictly one
//! at a time.

use std::sync::Arc;

use crate::commands::{CommandOutcome, CommandSet};
use crate::config::LanguageConfig;
use crate::conversation::ConversationState;
use crate::generation::GenerationBackend;
use crate::language::{LanguageBridge, PIVOT_LANGUAGE};
use crate::Result;

/// The response to one processed turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReply {
    /// Final response text, in the speaker's language where possible
    pub text: String,

    /// The session should terminate after delivering this reply
    pub exit: bool,
}

/// Orchestrates command matching, translation, history, and generation
/// for each incoming utterance
pub struct TurnProcessor {
    commands: CommandSet,
    bridge: LanguageBridge,
    state: ConversationState,
    backend: Arc<dyn GenerationBackend>,
    translation_enabled: bool,
    default_language: String,
}

impl TurnProcessor {
    /// Create a processor owning a fresh conversation
    #[must_use]
    pub fn new(
        commands: CommandSet,
        bridge: LanguageBridge,
        backend: Arc<dyn GenerationBackend>,
        language: &LanguageConfig,
        max_history: usize,
    ) -> Self {
        Self {
            commands,
            bridge,
            state: ConversationState::new(max_history),
            backend,
            translation_enabled: language.translation_enabled,
            default_language: language.default.clone(),
        }
    }

    /// Process one utterance and produce the reply
    ///
    /// Commands short-circuit: they never enter the conversation history.
    /// `known_language` (e.g. reported by speech capture) skips detection
    /// and translation of the input. Translation failures degrade to
    /// pass-through text.
    ///
    /// # Errors
    ///
    /// Returns error only when the generation backend fails; no fallback
    /// reply is fabricated.
    pub async fn handle_turn(
        &mut self,
        raw: &str,
        known_language: Option<&str>,
    ) -> Result<TurnReply> {
        match self.commands.match_utterance(raw) {
            CommandOutcome::Exit(farewell) => {
                tracing::info!("exit requested");
                return Ok(TurnReply {
                    text: farewell,
                    exit: true,
                });
            }
            CommandOutcome::Command(text) => {
                return Ok(TurnReply { text, exit: false });
            }
            CommandOutcome::NotMatched => {}
        }

        let (detected, pivot_text) = if let Some(lang) = known_language {
            (lang.to_string(), raw.to_string())
        } else if self.translation_enabled {
            self.bridge.to_pivot(raw).await
        } else {
            (self.default_language.clone(), raw.to_string())
        };

        tracing::debug!(language = %detected, "utterance normalized");

        self.state.append(pivot_text);

        let history = self.state.snapshot();
        let outcome = self.backend.generate(&history, self.state.context()).await?;
        self.state.update_context(outcome.context);

        tracing::debug!(reply_len = outcome.reply.len(), "reply generated");

        let text = if detected != PIVOT_LANGUAGE && self.translation_enabled {
            self.bridge.from_pivot(&outcome.reply, &detected).await
        } else {
            outcome.reply
        };

        Ok(TurnReply { text, exit: false })
    }

    /// Read-only view of the retained conversation history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.state.snapshot()
    }

    /// Mutable access to the command set, for runtime handler registration
    pub fn commands_mut(&mut self) -> &mut CommandSet {
        &mut self.commands
    }
}
