//! Voice input/output
//!
//! Microphone capture, wake phrase gating, speech recognition, speech
//! synthesis, and speaker playback. The turn pipeline itself is
//! voice-agnostic; everything here feeds it text and speaks its replies.

mod capture;
mod playback;
mod stt;
mod tts;
mod wake;

pub use capture::{Microphone, SAMPLE_RATE, samples_to_wav};
pub use playback::{PLAYBACK_SAMPLE_RATE, Speaker};
pub use stt::{Transcriber, Transcription};
pub use tts::Synthesizer;
pub use wake::{GateState, WakeGate, strip_wake_phrase};
