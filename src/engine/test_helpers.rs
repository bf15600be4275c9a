//! Scripted gateways for protocol tests: deterministic replies, no I/O.

#[cfg(test)]
pub mod helpers {
    use crate::engine::message::Message;
    use crate::provider::{Completion, GatewayFactory, ModelGateway, TokenUsage};
    use async_trait::async_trait;
    use std::collections::{HashMap, VecDeque};
    use std::sync::{Arc, Mutex};

    const SCRIPTED_USAGE: TokenUsage = TokenUsage {
        prompt_tokens: 8,
        completion_tokens: 2,
    };

    /// Replays a fixed script of completions, then repeats the fallback.
    pub struct ScriptedGateway {
        model: String,
        script: Mutex<VecDeque<Completion>>,
        fallback: Completion,
    }

    impl ScriptedGateway {
        /// Script of plain replies, each reporting a 10-token usage.
        pub fn replies(model: &str, replies: &[&str]) -> Self {
            let script = replies
                .iter()
                .map(|text| Completion {
                    message: Message::assistant(*text),
                    usage: Some(SCRIPTED_USAGE),
                })
                .collect();
            Self {
                model: model.to_string(),
                script: Mutex::new(script),
                fallback: Completion {
                    message: Message::assistant("out of script"),
                    usage: Some(SCRIPTED_USAGE),
                },
            }
        }

        /// Every call fails at the backend.
        pub fn always_failing(model: &str) -> Self {
            Self {
                model: model.to_string(),
                script: Mutex::new(VecDeque::new()),
                fallback: Completion::error("scripted outage"),
            }
        }
    }

    #[async_trait]
    impl ModelGateway for ScriptedGateway {
        async fn generate(&self, _history: &[Message]) -> Completion {
            self.script
                .lock()
                .expect("script lock")
                .pop_front()
                .unwrap_or_else(|| self.fallback.clone())
        }

        fn model(&self) -> &str {
            &self.model
        }
    }

    /// Hands out scripted gateways keyed by model id.
    #[derive(Default)]
    pub struct ScriptedFactory {
        gateways: HashMap<String, Arc<ScriptedGateway>>,
    }

    impl ScriptedFactory {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with(mut self, model: &str, replies: &[&str]) -> Self {
            self.gateways.insert(
                model.to_string(),
                Arc::new(ScriptedGateway::replies(model, replies)),
            );
            self
        }

        pub fn with_failing(mut self, model: &str) -> Self {
            self.gateways.insert(
                model.to_string(),
                Arc::new(ScriptedGateway::always_failing(model)),
            );
            self
        }
    }

    impl GatewayFactory for ScriptedFactory {
        fn gateway(&self, model: &str) -> Arc<dyn ModelGateway> {
            self.gateways
                .get(model)
                .cloned()
                .map(|g| g as Arc<dyn ModelGateway>)
                .unwrap_or_else(|| Arc::new(ScriptedGateway::replies(model, &[])))
        }
    }
}
