//! The model gateway contract: one method over any text-generation backend.

use crate::engine::message::Message;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Prefix of the message substituted when a backend call fails. The
/// deliberation protocols stay total: downstream extraction turns this
/// into an abstention rather than an error.
pub const MODEL_ERROR_SENTINEL: &str = "[Model error]";

/// Token usage reported by a backend for one completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u64 {
        u64::from(self.prompt_tokens) + u64::from(self.completion_tokens)
    }
}

/// Outcome of one gateway call. Always carries an assistant message;
/// `usage` is present exactly when the backend reported token counts
/// (counts are never fabricated locally).
#[derive(Debug, Clone)]
pub struct Completion {
    pub message: Message,
    pub usage: Option<TokenUsage>,
}

impl Completion {
    /// Fold a backend failure into the sentinel assistant message.
    pub fn error(cause: impl fmt::Display) -> Self {
        Self {
            message: Message::assistant(format!("{MODEL_ERROR_SENTINEL} {cause}")),
            usage: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.message.content.starts_with(MODEL_ERROR_SENTINEL)
    }
}

/// Uniform contract to a text-generation backend.
///
/// `history` must be non-empty and end with a non-assistant message; that
/// is the caller's obligation (the `Agent` guarantees it). The method is
/// total: backend failures come back as a sentinel completion, never as
/// an error or a panic.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    async fn generate(&self, history: &[Message]) -> Completion;

    /// Model identifier, used for logging and per-agent token logs.
    fn model(&self) -> &str;
}

/// Builds gateways per model id, so the protocols stay backend-agnostic
/// and tests can substitute scripted backends.
pub trait GatewayFactory: Send + Sync {
    fn gateway(&self, model: &str) -> Arc<dyn ModelGateway>;
}
