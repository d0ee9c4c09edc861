//! Command phrase matching and dispatch
//!
//! Short-circuits utterances that are commands before they reach the
//! generation pipeline. Matching is two-tiered: exit phrases match by exact
//! lowercase equality, command triggers match as case-insensitive substrings
//! in configuration order (first matching type wins).

use std::collections::HashMap;

use rand::Rng;

use crate::config::CommandsConfig;
use crate::{Error, Result};

/// What the matcher decided about an utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Not a command; process as dialogue
    NotMatched,
    /// A command handled locally; carries the handler's response
    Command(String),
    /// An exit phrase; carries the farewell text
    Exit(String),
}

/// A command handler maps the raw (original-case) utterance to a response
pub type CommandHandler = Box<dyn Fn(&str) -> String + Send + Sync>;

/// Matches utterances against the configured phrase table
pub struct CommandSet {
    exit_phrases: Vec<String>,
    farewell: String,
    table: Vec<(String, Vec<String>)>,
    handlers: HashMap<String, CommandHandler>,
}

impl CommandSet {
    /// Build a command set from configuration, installing the built-in
    /// handlers for any `time`, `date`, `weather`, and `help` entries
    #[must_use]
    pub fn from_config(config: &CommandsConfig) -> Self {
        let exit_phrases = config
            .exit_phrases
            .iter()
            .map(|p| p.to_lowercase())
            .collect();

        let table: Vec<(String, Vec<String>)> = config
            .custom
            .iter()
            .map(|entry| {
                (
                    entry.label.clone(),
                    entry.phrases.iter().map(|p| p.to_lowercase()).collect(),
                )
            })
            .collect();

        let mut handlers: HashMap<String, CommandHandler> = HashMap::new();
        for (label, _) in &table {
            let handler = match label.as_str() {
                "time" => Some(time_handler()),
                "date" => Some(date_handler()),
                "weather" => Some(weather_handler()),
                "help" => Some(help_handler(config)),
                _ => None,
            };
            if let Some(handler) = handler {
                handlers.insert(label.clone(), handler);
            }
        }

        tracing::debug!(
            command_types = table.len(),
            exit_phrases = config.exit_phrases.len(),
            "command set initialized"
        );

        Self {
            exit_phrases,
            farewell: config.farewell.clone(),
            table,
            handlers,
        }
    }

    /// Match an utterance against the phrase table
    ///
    /// Exit phrases are checked first and take precedence over command
    /// triggers. Command types are tried in configuration order; the first
    /// type with a matching trigger phrase wins and its handler receives the
    /// original-case utterance. A matching type without a registered handler
    /// is a configuration mismatch and falls through to the next type.
    #[must_use]
    pub fn match_utterance(&self, utterance: &str) -> CommandOutcome {
        if utterance.is_empty() {
            return CommandOutcome::NotMatched;
        }

        let lowered = utterance.to_lowercase();

        if self.exit_phrases.iter().any(|p| *p == lowered) {
            tracing::info!("exit phrase matched");
            return CommandOutcome::Exit(self.farewell.clone());
        }

        for (label, phrases) in &self.table {
            if phrases.iter().any(|p| lowered.contains(p.as_str())) {
                if let Some(handler) = self.handlers.get(label) {
                    tracing::info!(command = %label, "command matched");
                    return CommandOutcome::Command(handler(utterance));
                }
                tracing::warn!(
                    command = %label,
                    "trigger phrase matched but no handler is registered"
                );
            }
        }

        CommandOutcome::NotMatched
    }

    /// Register or override the handler for an existing command type
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if `label` is not in the configured table;
    /// new command types come from configuration, not handler registration.
    pub fn register_handler(&mut self, label: &str, handler: CommandHandler) -> Result<()> {
        if !self.table.iter().any(|(l, _)| l == label) {
            return Err(Error::Config(format!(
                "unknown command type: {label} (not in the configured phrase table)"
            )));
        }

        self.handlers.insert(label.to_string(), handler);
        tracing::info!(command = %label, "handler registered");
        Ok(())
    }

    /// Command type labels in dispatch order
    #[must_use]
    pub fn labels(&self) -> Vec<&str> {
        self.table.iter().map(|(l, _)| l.as_str()).collect()
    }
}

fn time_handler() -> CommandHandler {
    Box::new(|_| {
        let now = chrono::Local::now();
        format!("The current time is {}.", now.format("%I:%M %p"))
    })
}

fn date_handler() -> CommandHandler {
    Box::new(|_| {
        let today = chrono::Local::now();
        format!("Today is {}.", today.format("%A, %B %d, %Y"))
    })
}

/// Placeholder weather handler; real deployments register a handler backed
/// by an actual weather source via [`CommandSet::register_handler`]
fn weather_handler() -> CommandHandler {
    const CONDITIONS: &[&str] = &[
        "sunny", "partly cloudy", "cloudy", "rainy", "stormy", "windy", "snowy", "foggy",
        "humid", "clear",
    ];

    let location_re = regex::Regex::new(r"(?:in|at|for)\s+([a-zA-Z\s]+?)\??$")
        .expect("location regex must compile");

    Box::new(move |utterance| {
        let location = location_re
            .captures(utterance)
            .and_then(|c| c.get(1))
            .map_or_else(|| "your location".to_string(), |m| m.as_str().trim().to_string());

        let mut rng = rand::thread_rng();
        let condition = CONDITIONS[rng.gen_range(0..CONDITIONS.len())];
        let temperature = rng.gen_range(0..40);

        format!(
            "The weather in {location} is currently {condition} with a temperature of \
             {temperature}°C. Note: this is a placeholder; register a weather handler \
             backed by a real data source."
        )
    })
}

fn help_handler(config: &CommandsConfig) -> CommandHandler {
    let mut help = String::from("Here are the commands I understand:\n");
    for entry in &config.custom {
        help.push_str(&format!(
            "- {}: {}\n",
            entry.label,
            entry.phrases.join(", ")
        ));
    }
    help.push_str(&format!("- exit: {}\n", config.exit_phrases.join(", ")));

    Box::new(move |_| help.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CommandPhrases;

    fn test_config() -> CommandsConfig {
        CommandsConfig {
            exit_phrases: vec!["bye".to_string(), "goodbye".to_string()],
            farewell: "Goodbye!".to_string(),
            custom: vec![
                CommandPhrases {
                    label: "time".to_string(),
                    phrases: vec!["what time is it".to_string(), "the time".to_string()],
                },
                CommandPhrases {
                    label: "date".to_string(),
                    phrases: vec!["what day is it".to_string()],
                },
                CommandPhrases {
                    label: "help".to_string(),
                    phrases: vec!["help me".to_string()],
                },
            ],
        }
    }

    #[test]
    fn exit_phrase_matches_exactly() {
        let set = CommandSet::from_config(&test_config());

        assert_eq!(
            set.match_utterance("Goodbye"),
            CommandOutcome::Exit("Goodbye!".to_string())
        );
        // Substring containment is not enough for exit
        assert!(!matches!(
            set.match_utterance("goodbye my friend"),
            CommandOutcome::Exit(_)
        ));
    }

    #[test]
    fn exit_takes_precedence_over_commands() {
        let mut config = test_config();
        config.exit_phrases.push("the time".to_string());
        let set = CommandSet::from_config(&config);

        assert_eq!(
            set.match_utterance("the time"),
            CommandOutcome::Exit("Goodbye!".to_string())
        );
    }

    #[test]
    fn trigger_matches_as_substring() {
        let set = CommandSet::from_config(&test_config());

        match set.match_utterance("Hey, WHAT TIME IS IT right now?") {
            CommandOutcome::Command(text) => assert!(text.contains("current time")),
            other => panic!("expected command, got {other:?}"),
        }
    }

    #[test]
    fn first_matching_type_wins() {
        let mut config = test_config();
        // Both types now trigger on the same phrase; "time" is declared first
        config.custom[1].phrases.push("the time".to_string());
        let set = CommandSet::from_config(&config);

        match set.match_utterance("tell me the time please") {
            CommandOutcome::Command(text) => assert!(text.contains("current time")),
            other => panic!("expected time command, got {other:?}"),
        }
    }

    #[test]
    fn unhandled_label_falls_through() {
        let mut config = test_config();
        config.custom.insert(
            0,
            CommandPhrases {
                label: "music".to_string(),
                phrases: vec!["the time".to_string()],
            },
        );
        let set = CommandSet::from_config(&config);

        // "music" matches first but has no handler; "time" handles it
        match set.match_utterance("the time") {
            CommandOutcome::Command(text) => assert!(text.contains("current time")),
            other => panic!("expected fall-through to time, got {other:?}"),
        }
    }

    #[test]
    fn no_match_returns_not_matched() {
        let set = CommandSet::from_config(&test_config());
        assert_eq!(
            set.match_utterance("tell me about rust"),
            CommandOutcome::NotMatched
        );
        assert_eq!(set.match_utterance(""), CommandOutcome::NotMatched);
    }

    #[test]
    fn register_handler_overrides_known_label() {
        let mut set = CommandSet::from_config(&test_config());
        set.register_handler("time", Box::new(|_| "mock time".to_string()))
            .unwrap();

        assert_eq!(
            set.match_utterance("what time is it"),
            CommandOutcome::Command("mock time".to_string())
        );
    }

    #[test]
    fn register_handler_rejects_unknown_label() {
        let mut set = CommandSet::from_config(&test_config());
        let result = set.register_handler("joke", Box::new(|_| "ha".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn registered_handler_enables_unhandled_label() {
        let mut config = test_config();
        config.custom.push(CommandPhrases {
            label: "joke".to_string(),
            phrases: vec!["tell me a joke".to_string()],
        });
        let mut set = CommandSet::from_config(&config);

        // No handler yet: falls through to dialogue
        assert_eq!(
            set.match_utterance("tell me a joke"),
            CommandOutcome::NotMatched
        );

        set.register_handler("joke", Box::new(|_| "X".to_string()))
            .unwrap();
        assert_eq!(
            set.match_utterance("Please tell me a joke now"),
            CommandOutcome::Command("X".to_string())
        );
    }

    #[test]
    fn help_lists_configured_phrases() {
        let set = CommandSet::from_config(&test_config());

        match set.match_utterance("help me") {
            CommandOutcome::Command(text) => {
                assert!(text.contains("what time is it"));
                assert!(text.contains("bye, goodbye"));
            }
            other => panic!("expected help text, got {other:?}"),
        }
    }

    #[test]
    fn handler_receives_original_case() {
        let mut set = CommandSet::from_config(&test_config());
        set.register_handler("time", Box::new(|u| u.to_string()))
            .unwrap();

        assert_eq!(
            set.match_utterance("The Time, PLEASE"),
            CommandOutcome::Command("The Time, PLEASE".to_string())
        );
    }
}
