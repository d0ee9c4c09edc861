//! Generation backend interface
//!
//! The turn pipeline is backend-agnostic: anything that can turn the
//! accumulated dialogue plus an opaque carry-over into a reply and an
//! updated carry-over can serve as the backend.

use async_trait::async_trait;

use crate::conversation::GenerationContext;
use crate::Result;

/// A generated reply plus the backend's updated carry-over state
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    /// Reply text in the pivot language
    pub reply: String,

    /// Carry-over to round-trip into the next `generate` call
    pub context: GenerationContext,
}

/// Produces replies from accumulated dialogue
///
/// `history` is the retained user utterances, oldest first, with the current
/// turn's text as the final element. `prior` is the carry-over returned from
/// the previous call, `None` on the first turn. Sampling randomness is
/// expected; identical inputs need not produce identical replies.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate a reply
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot produce a reply. This is fatal to
    /// the turn; callers must not fabricate a response.
    async fn generate(
        &self,
        history: &[String],
        prior: Option<&GenerationContext>,
    ) -> Result<GenerationOutcome>;
}
