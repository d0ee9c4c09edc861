//! Wake phrase gating
//!
//! Segments speech out of the microphone stream with a local energy gate,
//! then confirms the wake phrase against the transcript. Acoustic wake-word
//! accuracy is delegated to the recognition service; the gate only keeps
//! silence and noise away from it.

use crate::Result;

/// Minimum RMS energy to count as speech
const ENERGY_THRESHOLD: f32 = 0.03;

/// Minimum speech length for a usable segment (0.3s at 16kHz)
const MIN_SPEECH_SAMPLES: usize = 4800;

/// Trailing silence that ends an utterance (0.5s at 16kHz)
const SILENCE_SAMPLES: usize = 8000;

/// Gate state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// Waiting for speech
    Idle,
    /// Accumulating a speech segment, wake phrase not yet confirmed
    Listening,
    /// Wake phrase confirmed, capturing the command utterance
    Triggered,
}

/// Wake phrase gate over a stream of audio samples
pub struct WakeGate {
    phrase: String,
    state: GateState,
    speech: Vec<f32>,
    silence: usize,
}

impl WakeGate {
    /// Create a gate for one wake phrase
    ///
    /// # Errors
    ///
    /// Returns error if the phrase is empty after normalization
    pub fn new(phrase: &str) -> Result<Self> {
        let phrase = phrase.trim().to_lowercase();
        if phrase.is_empty() {
            return Err(crate::Error::Config("wake phrase must not be empty".to_string()));
        }

        tracing::debug!(phrase = %phrase, "wake gate initialized");

        Ok(Self {
            phrase,
            state: GateState::Idle,
            speech: Vec::new(),
            silence: 0,
        })
    }

    /// Feed captured samples; returns true when a speech segment is
    /// complete and ready for transcription
    pub fn feed(&mut self, samples: &[f32]) -> bool {
        let speaking = rms_energy(samples) > ENERGY_THRESHOLD;

        match self.state {
            GateState::Idle => {
                if speaking {
                    self.state = GateState::Listening;
                    self.speech.clear();
                    self.speech.extend_from_slice(samples);
                    self.silence = 0;
                }
            }
            GateState::Listening | GateState::Triggered => {
                self.speech.extend_from_slice(samples);

                if speaking {
                    self.silence = 0;
                } else {
                    self.silence += samples.len();
                }

                if self.state == GateState::Listening {
                    if self.silence > SILENCE_SAMPLES && self.speech.len() > MIN_SPEECH_SAMPLES {
                        tracing::debug!(samples = self.speech.len(), "speech segment complete");
                        return true;
                    }

                    // Noise without enough speech behind it
                    if self.silence > SILENCE_SAMPLES * 2 {
                        self.reset();
                    }
                }
            }
        }

        false
    }

    /// Confirm the wake phrase against a transcript of the last segment
    ///
    /// On confirmation the gate moves to `Triggered` and starts capturing
    /// the command utterance; otherwise it resets to idle.
    pub fn confirm(&mut self, transcript: &str) -> bool {
        if transcript.to_lowercase().contains(&self.phrase) {
            tracing::info!(phrase = %self.phrase, transcript, "wake phrase confirmed");
            self.state = GateState::Triggered;
            self.silence = 0;
            return true;
        }

        self.reset();
        false
    }

    /// Whether the triggered command utterance has ended (silence after
    /// enough speech)
    #[must_use]
    pub fn utterance_complete(&self) -> bool {
        self.state == GateState::Triggered
            && self.silence > SILENCE_SAMPLES
            && self.speech.len() > MIN_SPEECH_SAMPLES
    }

    /// Take the accumulated speech segment, clearing it
    pub fn take_speech(&mut self) -> Vec<f32> {
        std::mem::take(&mut self.speech)
    }

    /// Whether the wake phrase has been confirmed
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.state == GateState::Triggered
    }

    /// Current gate state
    #[must_use]
    pub const fn state(&self) -> GateState {
        self.state
    }

    /// The normalized wake phrase
    #[must_use]
    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    /// Return to idle, discarding buffered speech
    pub fn reset(&mut self) {
        self.state = GateState::Idle;
        self.speech.clear();
        self.silence = 0;
    }
}

/// Remove the wake phrase (and trailing punctuation) from a transcript,
/// leaving the command text
#[must_use]
pub fn strip_wake_phrase(transcript: &str, phrase: &str) -> String {
    let lower = transcript.to_lowercase();
    let phrase = phrase.trim().to_lowercase();

    lower.find(&phrase).map_or_else(
        || transcript.trim().to_string(),
        |pos| {
            transcript[pos + phrase.len()..]
                .trim_start_matches(|c: char| c.is_whitespace() || c == ',' || c == '.')
                .trim_end()
                .to_string()
        },
    )
}

/// RMS energy of a sample window
#[allow(clippy::cast_precision_loss)]
fn rms_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn energy_distinguishes_silence_from_speech() {
        assert!(rms_energy(&vec![0.0; 160]) < 0.001);
        assert!(rms_energy(&vec![0.5; 160]) > 0.4);
        assert!((rms_energy(&[])).abs() < f32::EPSILON);
    }

    #[test]
    fn empty_phrase_is_rejected() {
        assert!(WakeGate::new("  ").is_err());
    }

    #[test]
    fn confirm_is_case_insensitive() {
        let mut gate = WakeGate::new("Hey Parley").unwrap();

        assert!(!gate.confirm("hello world"));
        assert_eq!(gate.state(), GateState::Idle);

        assert!(gate.confirm("HEY PARLEY, what time is it?"));
        assert!(gate.is_triggered());
    }

    #[test]
    fn segment_completes_after_speech_then_silence() {
        let mut gate = WakeGate::new("parley").unwrap();

        // Silence alone never starts a segment
        assert!(!gate.feed(&vec![0.0; 1600]));
        assert_eq!(gate.state(), GateState::Idle);

        // Speech starts listening
        gate.feed(&vec![0.3; 8000]);
        assert_eq!(gate.state(), GateState::Listening);

        // Trailing silence completes the segment
        assert!(gate.feed(&vec![0.0; 9000]));
    }

    #[test]
    fn triggered_gate_accumulates_until_silence() {
        let mut gate = WakeGate::new("parley").unwrap();
        gate.confirm("parley");

        gate.feed(&vec![0.3; 8000]);
        assert!(!gate.utterance_complete());

        gate.feed(&vec![0.0; 9000]);
        assert!(gate.utterance_complete());
        assert_eq!(gate.take_speech().len(), 17000);
    }

    #[test]
    fn reset_returns_to_idle() {
        let mut gate = WakeGate::new("parley").unwrap();
        gate.confirm("parley time");
        gate.feed(&vec![0.3; 8000]);

        gate.reset();
        assert_eq!(gate.state(), GateState::Idle);
        assert!(gate.take_speech().is_empty());
    }

    #[test]
    fn strip_removes_phrase_and_punctuation() {
        assert_eq!(
            strip_wake_phrase("Hey Parley, what's the weather?", "hey parley"),
            "what's the weather?"
        );
        assert_eq!(strip_wake_phrase("Hey Parley", "hey parley"), "");
        assert_eq!(strip_wake_phrase("no phrase here", "hey parley"), "no phrase here");
    }
}
