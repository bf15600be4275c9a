//! An agent: one conversation history bound to one model gateway.

use crate::engine::message::{AgentRole, Message};
use crate::provider::ModelGateway;
use std::sync::Arc;

const PROMPT_PREVIEW_CHARS: usize = 100;

/// What an agent is asked to respond to: a fresh user prompt appended to
/// its running history, or a full replacement history (used by debate to
/// hand an agent a view of the other agents' arguments).
pub enum AgentInput {
    Prompt(String),
    History(Vec<Message>),
}

impl From<String> for AgentInput {
    fn from(prompt: String) -> Self {
        Self::Prompt(prompt)
    }
}

impl From<&str> for AgentInput {
    fn from(prompt: &str) -> Self {
        Self::Prompt(prompt.to_string())
    }
}

impl From<Vec<Message>> for AgentInput {
    fn from(history: Vec<Message>) -> Self {
        Self::History(history)
    }
}

/// One line of an agent's token accounting, kept per call for cost
/// inspection after a run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TokenLogEntry {
    pub agent: String,
    pub model: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u64,
    pub prompt_preview: String,
}

/// A deliberation participant. Owns an append-only history and a
/// cumulative token counter fed only by backend-reported usage.
pub struct Agent {
    name: String,
    role: AgentRole,
    gateway: Arc<dyn ModelGateway>,
    history: Vec<Message>,
    total_tokens: u64,
    token_log: Vec<TokenLogEntry>,
}

impl Agent {
    pub fn new(name: impl Into<String>, role: AgentRole, gateway: Arc<dyn ModelGateway>) -> Self {
        Self {
            name: name.into(),
            role,
            gateway,
            history: Vec::new(),
            total_tokens: 0,
            token_log: Vec::new(),
        }
    }

    /// Run one exchange: send the input and append the assistant reply.
    /// Returns a clone of the reply. History length is even afterwards
    /// whenever every input added exactly one user message.
    pub async fn run(&mut self, input: impl Into<AgentInput>) -> Message {
        match input.into() {
            AgentInput::Prompt(prompt) => self.history.push(Message::user(prompt)),
            AgentInput::History(history) => self.history = history,
        }

        let completion = self.gateway.generate(&self.history).await;
        if let Some(usage) = completion.usage {
            self.total_tokens += usage.total();
            self.token_log.push(TokenLogEntry {
                agent: self.name.clone(),
                model: self.gateway.model().to_string(),
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
                total_tokens: usage.total(),
                prompt_preview: preview(&self.last_user_content()),
            });
        }

        tracing::debug!(
            agent = %self.name,
            role = %self.role,
            tokens = self.total_tokens,
            "exchange complete"
        );

        self.history.push(completion.message.clone());
        completion.message
    }

    fn last_user_content(&self) -> String {
        self.history
            .iter()
            .rev()
            .find(|m| !m.is_assistant())
            .map(|m| m.content.clone())
            .unwrap_or_default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> AgentRole {
        self.role
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn into_history(self) -> Vec<Message> {
        self.history
    }

    pub fn total_tokens(&self) -> u64 {
        self.total_tokens
    }

    pub fn token_log(&self) -> &[TokenLogEntry] {
        &self.token_log
    }

    /// Content of the most recent assistant message, if any.
    pub fn last_response(&self) -> Option<&str> {
        self.history
            .iter()
            .rev()
            .find(|m| m.is_assistant())
            .map(|m| m.content.as_str())
    }
}

/// First 100 characters, respecting char boundaries.
fn preview(text: &str) -> String {
    text.chars().take(PROMPT_PREVIEW_CHARS).collect()
}
