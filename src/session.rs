//! The outer listen/speak/exit loop
//!
//! Wires the turn processor to its collaborators and runs until an exit
//! phrase, end of input, or ctrl-c. Turn-level failures are reported and
//! the session continues; loop-level failures end it gracefully.

use std::io::Write as _;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncBufReadExt;

use crate::commands::CommandSet;
use crate::config::{Config, data_dir};
use crate::language::LanguageBridge;
use crate::providers::{ChatCompletionsBackend, LibreTranslateBackend};
use crate::transcript::{Role, TranscriptWriter};
use crate::turn::TurnProcessor;
use crate::voice::{
    Microphone, SAMPLE_RATE, Speaker, Synthesizer, Transcriber, WakeGate, samples_to_wav,
    strip_wake_phrase,
};
use crate::Result;

/// Spoken/printed when the generation backend fails a turn
const GENERATION_APOLOGY: &str = "I couldn't generate a response.";

/// One interactive assistant session
pub struct Session {
    processor: TurnProcessor,
    transcript: Option<TranscriptWriter>,
    config: Config,
    language_override: Option<String>,
}

impl Session {
    /// Assemble a session from configuration
    ///
    /// `language_override` forces every utterance's input language,
    /// skipping detection and input translation.
    ///
    /// # Errors
    ///
    /// Returns error if configuration is unusable
    pub fn new(config: Config, language_override: Option<String>) -> Result<Self> {
        let commands = CommandSet::from_config(&config.commands);

        let translation = Arc::new(LibreTranslateBackend::new(
            config.translation.url.clone(),
            config.api_keys.libretranslate.clone(),
        ));
        let bridge = LanguageBridge::new(translation, config.language.default.clone());

        let backend = Arc::new(ChatCompletionsBackend::new(
            &config.model,
            config.api_keys.openai.clone(),
        ));

        let processor = TurnProcessor::new(
            commands,
            bridge,
            backend,
            &config.language,
            config.model.max_history,
        );

        let transcript = if config.transcript.enabled {
            let dir = config
                .transcript
                .dir
                .clone()
                .unwrap_or_else(|| data_dir().join("transcripts"));
            match TranscriptWriter::create(&dir) {
                Ok(writer) => {
                    tracing::info!(path = %writer.path().display(), "transcript enabled");
                    Some(writer)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "transcript unavailable, continuing without");
                    None
                }
            }
        } else {
            None
        };

        Ok(Self {
            processor,
            transcript,
            config,
            language_override,
        })
    }

    /// Run until exit
    ///
    /// # Errors
    ///
    /// Returns error if the session cannot start (audio hardware, missing
    /// keys); turn-level errors are handled inside the loop.
    pub async fn run(mut self) -> Result<()> {
        if self.config.voice.enabled {
            self.run_voice().await
        } else {
            self.run_text().await
        }
    }

    /// Text mode: read utterances from stdin
    async fn run_text(&mut self) -> Result<()> {
        let exit_hint = self
            .config
            .commands
            .exit_phrases
            .first()
            .cloned()
            .unwrap_or_else(|| "exit".to_string());
        println!("Parley ready. Say \"{exit_hint}\" to quit.");

        let language = self.language_override.clone();
        let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();

        loop {
            print!("You: ");
            std::io::stdout().flush()?;

            let line = tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    println!();
                    tracing::info!("interrupted");
                    break;
                }
                line = lines.next_line() => line?,
            };

            let Some(line) = line else {
                // EOF
                break;
            };

            let input = line.trim();
            if input.is_empty() {
                continue;
            }

            let (reply, exit) = self.process(input, language.as_deref()).await;
            println!("Bot: {reply}");

            if exit {
                break;
            }
        }

        tracing::info!("session ended");
        Ok(())
    }

    /// Voice mode: wake-phrase-gated microphone loop
    async fn run_voice(&mut self) -> Result<()> {
        let mut gate = WakeGate::new(&self.config.wake.phrase)?;
        let mut mic = Microphone::open()?;
        let speaker = Speaker::open()?;

        let forced_language = (!self.config.language.auto_detect)
            .then(|| self.config.language.default.clone());
        let transcriber = Transcriber::new(
            self.config.api_keys.openai.clone(),
            self.config.voice.stt_model.clone(),
            forced_language,
            self.config.language.default.clone(),
        )?;
        let synthesizer = Synthesizer::new(
            &self.config.voice,
            self.config.api_keys.openai.clone(),
            self.config.api_keys.elevenlabs.clone(),
        )?;

        mic.start()?;
        println!("Parley ready. Say \"{}\" to start talking.", gate.phrase());
        tracing::info!(phrase = %gate.phrase(), "listening for wake phrase");

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("shutdown requested");
                    break;
                }
                () = tokio::time::sleep(Duration::from_millis(100)) => {
                    match self
                        .voice_tick(&mic, &speaker, &mut gate, &transcriber, &synthesizer)
                        .await
                    {
                        Ok(true) => break,
                        Ok(false) => {}
                        Err(e) => tracing::error!(error = %e, "voice processing error"),
                    }
                }
            }
        }

        mic.stop();
        tracing::info!("session ended");
        Ok(())
    }

    /// Process buffered audio; returns true when the session should end
    async fn voice_tick(
        &mut self,
        mic: &Microphone,
        speaker: &Speaker,
        gate: &mut WakeGate,
        transcriber: &Transcriber,
        synthesizer: &Synthesizer,
    ) -> Result<bool> {
        let samples = mic.drain();
        if samples.is_empty() {
            return Ok(false);
        }

        let segment_ready = gate.feed(&samples);

        if segment_ready {
            // A speech segment before the wake phrase: check for it
            let speech = gate.take_speech();
            mic.discard();

            let wav = samples_to_wav(&speech, SAMPLE_RATE)?;
            match transcriber.transcribe(&wav).await {
                Ok(heard) => {
                    if gate.confirm(&heard.text) {
                        let command = strip_wake_phrase(&heard.text, gate.phrase());
                        if command.is_empty() {
                            // Bare wake phrase: acknowledge and keep capturing
                            let ack = self.config.wake.acknowledgment.clone();
                            speak(speaker, synthesizer, &ack).await;
                        } else {
                            let ended = self
                                .respond(speaker, synthesizer, &command, Some(&heard.language))
                                .await;
                            gate.reset();
                            return Ok(ended);
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "wake check transcription failed");
                    gate.reset();
                }
            }
        } else if gate.is_triggered() && gate.utterance_complete() {
            let speech = gate.take_speech();
            mic.discard();

            let wav = samples_to_wav(&speech, SAMPLE_RATE)?;
            match transcriber.transcribe(&wav).await {
                Ok(heard) => {
                    gate.reset();
                    if heard.text.trim().is_empty() {
                        return Ok(false);
                    }
                    let ended = self
                        .respond(speaker, synthesizer, heard.text.trim(), Some(&heard.language))
                        .await;
                    return Ok(ended);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "transcription failed");
                    speak(speaker, synthesizer, "Sorry, I didn't catch that").await;
                    gate.reset();
                }
            }
        }

        Ok(false)
    }

    /// Run one turn and deliver the reply over print + speech
    async fn respond(
        &mut self,
        speaker: &Speaker,
        synthesizer: &Synthesizer,
        input: &str,
        language: Option<&str>,
    ) -> bool {
        println!("You: {input}");

        let language = self
            .language_override
            .clone()
            .or_else(|| language.map(ToString::to_string));
        let (reply, exit) = self.process(input, language.as_deref()).await;

        println!("Bot: {reply}");
        speak(speaker, synthesizer, &reply).await;
        exit
    }

    /// Process one utterance, recording it in the transcript
    ///
    /// Generation failure yields the apology text instead of a reply; the
    /// session continues.
    async fn process(&mut self, input: &str, language: Option<&str>) -> (String, bool) {
        if let Some(transcript) = &mut self.transcript {
            transcript.record(Role::User, input);
        }

        let (text, exit) = match self.processor.handle_turn(input, language).await {
            Ok(reply) => (reply.text, reply.exit),
            Err(e) => {
                tracing::error!(error = %e, "turn failed");
                (GENERATION_APOLOGY.to_string(), false)
            }
        };

        if let Some(transcript) = &mut self.transcript {
            transcript.record(Role::Bot, &text);
        }

        (text, exit)
    }
}

/// Best-effort speech output; synthesis or playback failure is logged and
/// the printed reply stands on its own
async fn speak(speaker: &Speaker, synthesizer: &Synthesizer, text: &str) {
    match synthesizer.synthesize(text).await {
        Ok(audio) => {
            if let Err(e) = speaker.play_mp3(&audio) {
                tracing::warn!(error = %e, "playback failed");
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "speech synthesis failed");
        }
    }
}
