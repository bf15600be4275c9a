//! Self-reflection: one agent answers, then re-examines its own answer
//! within the same conversation.

use crate::engine::record::ReflectionRecord;
use crate::engine::{Engine, EngineError};

impl Engine {
    /// Run the two-turn self-reflection protocol over `question`.
    pub async fn run_self_reflection(
        &self,
        question: &str,
    ) -> Result<ReflectionRecord, EngineError> {
        let mut agent = self.author();

        let response = agent.run(self.prompts().initial_prompt(question)).await;
        let reflection = agent
            .run(self.prompts().reflection_prompt(question, &response.content))
            .await;

        tracing::info!(tokens = agent.total_tokens(), "self-reflection complete");

        Ok(ReflectionRecord {
            response: response.content,
            reflection: reflection.content,
            total_tokens: agent.total_tokens(),
        })
    }
}
