//! Multi-agent debate: independent first answers, then rounds where each
//! agent sees every other agent's previous argument.

use crate::engine::record::DebateRecord;
use crate::engine::{Engine, EngineError};
use futures::future::join_all;

impl Engine {
    /// Run a debate over `question` with `n_agents` participants for
    /// `n_rounds` rounds.
    ///
    /// Round 0 is answered independently. In round r, each agent is shown
    /// the round r-1 replies of every other agent, snapshotted before the
    /// round starts so all agents within a round argue against the same
    /// state. A full round completes before the next begins.
    pub async fn run_debate(
        &self,
        question: &str,
        n_agents: usize,
        n_rounds: usize,
    ) -> Result<DebateRecord, EngineError> {
        if n_agents < 2 {
            return Err(EngineError::InvalidConfig(
                "debate needs at least two agents".into(),
            ));
        }
        if n_rounds == 0 {
            return Err(EngineError::InvalidConfig(
                "debate needs at least one round".into(),
            ));
        }
        let mut agents: Vec<_> = (0..n_agents)
            .map(|slot| self.debater(slot))
            .collect::<Result<_, _>>()?;

        let opening = self.prompts().debate_prompt(question, &[]);
        join_all(
            agents
                .iter_mut()
                .map(|agent| agent.run(opening.clone())),
        )
        .await;

        for round in 1..n_rounds {
            // reply to the previous round, frozen before anyone answers
            let previous: Vec<String> = agents
                .iter()
                .map(|agent| agent.history()[2 * round - 1].content.clone())
                .collect();

            let prompts: Vec<String> = (0..n_agents)
                .map(|i| {
                    let others: Vec<&str> = previous
                        .iter()
                        .enumerate()
                        .filter(|(j, _)| *j != i)
                        .map(|(_, text)| text.as_str())
                        .collect();
                    self.prompts().debate_prompt(question, &others)
                })
                .collect();

            join_all(
                agents
                    .iter_mut()
                    .zip(prompts)
                    .map(|(agent, prompt)| agent.run(prompt)),
            )
            .await;
            tracing::debug!(round, "debate round complete");
        }

        let total_tokens = agents.iter().map(|agent| agent.total_tokens()).sum();

        Ok(DebateRecord {
            agent_histories: agents.into_iter().map(|a| a.into_history()).collect(),
            total_tokens,
        })
    }
}
