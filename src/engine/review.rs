//! The review cycle: author, concurrent reviewers, meta-reviewer, and a
//! rebuttal when the meta-reviewer judges the answer wrong.

use crate::engine::extract::{self, Decision};
use crate::engine::record::ReviewRecord;
use crate::engine::{Engine, EngineError};
use futures::future::join_all;

impl Engine {
    /// Run one full review cycle over `question` with `n_reviewers`
    /// independent reviewers.
    ///
    /// The author answers first; reviewers critique concurrently; the
    /// meta-reviewer weighs the critiques; the author rebuts exactly when
    /// the meta-review extracts to `wrong`. An absent or unreadable
    /// meta-decision counts as acceptance.
    pub async fn run_review_cycle(
        &self,
        question: &str,
        n_reviewers: usize,
    ) -> Result<ReviewRecord, EngineError> {
        if n_reviewers == 0 {
            return Err(EngineError::InvalidConfig(
                "review cycle needs at least one reviewer".into(),
            ));
        }
        let reviewers: Vec<_> = (0..n_reviewers)
            .map(|slot| self.reviewer(slot))
            .collect::<Result<_, _>>()?;

        let mut author = self.author();
        let author_response = author.run(self.prompts().author_prompt(question)).await;
        tracing::info!(reviewers = n_reviewers, "author responded, fanning out reviews");

        // concurrent, slot order preserved by join_all
        let review_futures = reviewers.into_iter().map(|mut reviewer| {
            let prompt = self
                .prompts()
                .reviewer_prompt(question, &author_response.content);
            async move {
                let reply = reviewer.run(prompt).await;
                (reply.content, reviewer.total_tokens())
            }
        });
        let reviewed = join_all(review_futures).await;
        let reviewer_tokens: u64 = reviewed.iter().map(|(_, tokens)| tokens).sum();
        let reviews: Vec<String> = reviewed.into_iter().map(|(text, _)| text).collect();

        let combined = reviews
            .iter()
            .enumerate()
            .map(|(i, review)| format!("Reviewer_{}:\n{}", i + 1, review))
            .collect::<Vec<_>>()
            .join("\n\n");

        let mut meta = self.meta_reviewer();
        let meta_review = meta
            .run(
                self.prompts()
                    .meta_prompt(question, &author_response.content, &combined),
            )
            .await;

        let author_rebuttal =
            if extract::extract_decision(&meta_review.content) == Some(Decision::Wrong) {
                tracing::info!("meta-reviewer rejected the answer, requesting rebuttal");
                let rebuttal = author
                    .run(self.prompts().feedback_prompt(
                        question,
                        &author_response.content,
                        &meta_review.content,
                    ))
                    .await;
                Some(rebuttal.content)
            } else {
                None
            };

        let total_tokens = author.total_tokens() + reviewer_tokens + meta.total_tokens();

        Ok(ReviewRecord {
            author_response: author_response.content,
            reviews,
            meta_review: meta_review.content,
            author_rebuttal,
            total_tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::engine::TaskSpec;
    use crate::engine::test_helpers::helpers::ScriptedFactory;
    use std::sync::Arc;

    fn engine(factory: ScriptedFactory) -> Engine {
        let mut config = EngineConfig::default();
        config.models.author = "author-model".into();
        config.models.reviewers = vec!["reviewer-model".into()];
        config.models.meta = "meta-model".into();
        Engine::with_factory(config, TaskSpec::gsm(), Arc::new(factory))
    }

    #[tokio::test]
    async fn test_accepted_answer_has_no_rebuttal() {
        let factory = ScriptedFactory::new()
            .with("author-model", &["Thoughts: six times seven.\nAnswer: 42"])
            .with(
                "reviewer-model",
                &["Decision: right\nJustification: checks out"],
            )
            .with("meta-model", &["Decision: right\nJustification: agreed"]);

        let record = engine(factory).run_review_cycle("6*7?", 1).await.unwrap();
        assert!(record.author_rebuttal.is_none());
        assert_eq!(record.final_response(), record.author_response);
        // author + reviewer + meta, 10 tokens each
        assert_eq!(record.total_tokens, 30);
    }

    #[tokio::test]
    async fn test_rejected_answer_triggers_rebuttal() {
        let factory = ScriptedFactory::new()
            .with("author-model", &["Answer: 20", "Thoughts: redone.\nAnswer: 14"])
            .with("reviewer-model", &["Decision: wrong\nJustification: misread"])
            .with("meta-model", &["Decision: wrong\nSuggestions: redo it"]);

        let record = engine(factory)
            .run_review_cycle("2+3*4?", 1)
            .await
            .unwrap();
        assert_eq!(record.author_rebuttal.as_deref(), Some("Thoughts: redone.\nAnswer: 14"));
        assert_eq!(record.final_response(), "Thoughts: redone.\nAnswer: 14");
        // author called twice
        assert_eq!(record.total_tokens, 40);
    }

    #[tokio::test]
    async fn test_unreadable_meta_decision_counts_as_acceptance() {
        let factory = ScriptedFactory::new()
            .with("author-model", &["Answer: 42"])
            .with("reviewer-model", &["Decision: right"])
            .with("meta-model", &["I have no strong opinion either way."]);

        let record = engine(factory).run_review_cycle("6*7?", 1).await.unwrap();
        assert!(record.author_rebuttal.is_none());
    }

    #[tokio::test]
    async fn test_reviews_keep_slot_order() {
        let mut config = EngineConfig::default();
        config.models.author = "author-model".into();
        config.models.reviewers = vec!["r1".into(), "r2".into()];
        config.models.meta = "meta-model".into();

        let factory = ScriptedFactory::new()
            .with("author-model", &["Answer: 1"])
            .with("r1", &["first reviewer speaking. Decision: right"])
            .with("r2", &["second reviewer speaking. Decision: right"])
            .with("meta-model", &["Decision: right"]);

        let engine = Engine::with_factory(config, TaskSpec::gsm(), Arc::new(factory));
        let record = engine.run_review_cycle("q", 2).await.unwrap();
        assert!(record.reviews[0].starts_with("first"));
        assert!(record.reviews[1].starts_with("second"));
    }

    #[tokio::test]
    async fn test_zero_reviewers_rejected_eagerly() {
        let factory = ScriptedFactory::new();
        let err = engine(factory).run_review_cycle("q", 0).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn test_backend_outage_still_produces_record() {
        let factory = ScriptedFactory::new()
            .with_failing("author-model")
            .with("reviewer-model", &["Decision: wrong, unreadable answer"])
            .with("meta-model", &["Decision: right"]);

        let record = engine(factory).run_review_cycle("q", 1).await.unwrap();
        assert!(record.author_response.starts_with("[Model error]"));
        assert!(record.author_rebuttal.is_none());
    }
}
