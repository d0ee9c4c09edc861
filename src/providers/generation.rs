//! OpenAI-compatible chat completions backend
//!
//! The opaque carry-over for this backend is the serialized running message
//! list (both roles), capped at a configured length so the request body
//! cannot grow without bound.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ModelConfig;
use crate::conversation::GenerationContext;
use crate::generation::{GenerationBackend, GenerationOutcome};
use crate::{Error, Result};

/// One dialogue message in the chat completions wire format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    role: String,
    content: String,
}

impl ChatMessage {
    fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }

    fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Generation backend over an OpenAI-compatible chat completions API
pub struct ChatCompletionsBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    max_context_messages: usize,
    system_prompt: Option<String>,
}

impl ChatCompletionsBackend {
    /// Create a backend from model configuration
    #[must_use]
    pub fn new(config: &ModelConfig, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.name.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
            max_context_messages: config.max_context_messages,
            system_prompt: config.system_prompt.clone(),
        }
    }
}

#[async_trait]
impl GenerationBackend for ChatCompletionsBackend {
    async fn generate(
        &self,
        history: &[String],
        prior: Option<&GenerationContext>,
    ) -> Result<GenerationOutcome> {
        let mut messages = assemble_messages(history, prior);
        if messages.is_empty() {
            return Err(Error::Generation(
                "nothing to generate from: empty history and no carry-over".to_string(),
            ));
        }

        let mut request_messages = Vec::with_capacity(messages.len() + 1);
        if let Some(ref prompt) = self.system_prompt {
            request_messages.push(ChatMessage::system(prompt));
        }
        request_messages.extend(messages.iter().cloned());

        let request = ChatRequest {
            model: &self.model,
            messages: request_messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            top_p: self.top_p,
        };

        let url = format!("{}/chat/completions", self.base_url);
        tracing::debug!(url = %url, messages = messages.len(), "requesting completion");

        let mut builder = self.client.post(&url).json(&request);
        if let Some(ref key) = self.api_key {
            builder = builder.header("Authorization", format!("Bearer {key}"));
        }

        let response = builder.send().await.map_err(|e| {
            tracing::error!(error = %e, "completion request failed");
            Error::Generation(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "completion API error");
            return Err(Error::Generation(format!("API error {status}: {body}")));
        }

        let result: ChatResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse completion response");
            Error::Generation(e.to_string())
        })?;

        let reply = result
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::Generation("response contained no text".to_string()))?
            .to_string();

        tracing::debug!(reply_len = reply.len(), "completion received");

        messages.push(ChatMessage::assistant(&reply));
        let context = carry_context(messages, self.max_context_messages)?;

        Ok(GenerationOutcome { reply, context })
    }
}

/// Build the request message list from history and the prior carry-over
///
/// With a usable carry-over, its stored dialogue continues with the newest
/// history entry as this turn's user message. Without one (first turn, or an
/// unreadable payload from a different backend), the whole retained history
/// seeds the dialogue as user turns, oldest first.
fn assemble_messages(history: &[String], prior: Option<&GenerationContext>) -> Vec<ChatMessage> {
    if let Some(prior) = prior {
        match serde_json::from_value::<Vec<ChatMessage>>(prior.payload().clone()) {
            Ok(mut messages) => {
                if let Some(current) = history.last() {
                    messages.push(ChatMessage::user(current));
                }
                return messages;
            }
            Err(e) => {
                tracing::warn!(error = %e, "unreadable carry-over, rebuilding from history");
            }
        }
    }

    history.iter().map(ChatMessage::user).collect()
}

/// Serialize the running dialogue into a carry-over, keeping the newest
/// `cap` messages
fn carry_context(mut messages: Vec<ChatMessage>, cap: usize) -> Result<GenerationContext> {
    if messages.len() > cap {
        messages.drain(..messages.len() - cap);
    }
    Ok(GenerationContext::new(serde_json::to_value(messages)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_turn_seeds_from_history() {
        let history = vec!["hello".to_string(), "how are you".to_string()];
        let messages = assemble_messages(&history, None);

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "user");
        assert_eq!(messages[0].content, "hello");
        assert_eq!(messages[1].content, "how are you");
    }

    #[test]
    fn carry_over_continues_the_dialogue() {
        let prior_messages = vec![
            ChatMessage::user("hello"),
            ChatMessage::assistant("hi there"),
        ];
        let prior = carry_context(prior_messages, 20).unwrap();

        let history = vec!["hello".to_string(), "what's new".to_string()];
        let messages = assemble_messages(&history, Some(&prior));

        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].role, "assistant");
        assert_eq!(messages[2].role, "user");
        assert_eq!(messages[2].content, "what's new");
    }

    #[test]
    fn unreadable_carry_over_rebuilds_from_history() {
        let bogus = GenerationContext::new(serde_json::json!({"tokens": [1, 2, 3]}));
        let history = vec!["hello".to_string()];
        let messages = assemble_messages(&history, Some(&bogus));

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "hello");
    }

    #[test]
    fn carry_context_caps_message_count() {
        let messages: Vec<ChatMessage> = (0..10)
            .map(|i| ChatMessage::user(format!("turn {i}")))
            .collect();
        let context = carry_context(messages, 4).unwrap();

        let stored: Vec<ChatMessage> =
            serde_json::from_value(context.payload().clone()).unwrap();
        assert_eq!(stored.len(), 4);
        assert_eq!(stored[0].content, "turn 6");
        assert_eq!(stored[3].content, "turn 9");
    }
}
