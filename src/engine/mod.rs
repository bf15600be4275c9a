//! Deliberation engine: agents, protocols, extraction and consensus.

pub mod agent;
pub mod consensus;
pub mod extract;
pub mod message;
pub mod prompts;
pub mod record;
mod debate;
mod reflection;
mod review;
#[cfg(test)]
pub mod test_helpers;

pub use agent::{Agent, AgentInput, TokenLogEntry};
pub use extract::{Answer, AnswerKind, Decision, TaskSpec};
pub use message::{AgentRole, Message, Role};
pub use prompts::PromptBuilder;
pub use record::{
    DebateRecord, DeliberationRecord, ReflectionRecord, ReviewRecord, ScoredRecord,
};

use crate::config::EngineConfig;
use crate::provider::{GatewayFactory, HttpGatewayFactory};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// A protocol was asked to run with parameters that cannot work;
    /// rejected before any backend call.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Orchestrates deliberation protocols over a model roster.
pub struct Engine {
    config: EngineConfig,
    builder: PromptBuilder,
    factory: Arc<dyn GatewayFactory>,
}

impl Engine {
    pub fn new(config: EngineConfig, task: TaskSpec) -> Self {
        let factory = Arc::new(HttpGatewayFactory::from_config(&config));
        Self::with_factory(config, task, factory)
    }

    /// Engine over an arbitrary gateway factory; tests use scripted ones.
    pub fn with_factory(
        config: EngineConfig,
        task: TaskSpec,
        factory: Arc<dyn GatewayFactory>,
    ) -> Self {
        Self {
            config,
            builder: PromptBuilder::new(task),
            factory,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn prompts(&self) -> &PromptBuilder {
        &self.builder
    }

    pub fn task(&self) -> &TaskSpec {
        self.builder.task()
    }

    pub(crate) fn author(&self) -> Agent {
        Agent::new(
            "author",
            AgentRole::Author,
            self.factory.gateway(&self.config.models.author),
        )
    }

    pub(crate) fn meta_reviewer(&self) -> Agent {
        Agent::new(
            "meta_reviewer",
            AgentRole::MetaReviewer,
            self.factory.gateway(&self.config.models.meta),
        )
    }

    /// Reviewer for one slot, its model picked by the selection strategy.
    pub(crate) fn reviewer(&self, slot: usize) -> Result<Agent, EngineError> {
        let model = self
            .config
            .selection
            .select(&self.config.models.reviewers, slot)
            .ok_or_else(|| EngineError::InvalidConfig("reviewer model pool is empty".into()))?;
        Ok(Agent::new(
            format!("reviewer_{}", slot + 1),
            AgentRole::Reviewer,
            self.factory.gateway(model),
        ))
    }

    /// Debate participant; slot maps onto the reviewer pool so mixed
    /// rosters debate each other.
    pub(crate) fn debater(&self, slot: usize) -> Result<Agent, EngineError> {
        let model = self
            .config
            .selection
            .select(&self.config.models.reviewers, slot)
            .ok_or_else(|| EngineError::InvalidConfig("debater model pool is empty".into()))?;
        Ok(Agent::new(
            format!("agent_{slot}"),
            AgentRole::Reviewer,
            self.factory.gateway(model),
        ))
    }
}
