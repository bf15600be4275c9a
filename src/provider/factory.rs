//! Gateway factory: config-driven construction of HTTP backends.

use super::gateway::{GatewayFactory, ModelGateway};
use super::openai_compatible::OpenAiCompatibleGateway;
use crate::config::EngineConfig;
use std::sync::Arc;
use std::time::Duration;

/// Builds one `OpenAiCompatibleGateway` per requested model, sharing the
/// endpoint, credentials and limits from the engine configuration.
pub struct HttpGatewayFactory {
    api_key: Option<String>,
    base_url: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    call_budget: Option<Duration>,
}

impl HttpGatewayFactory {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            api_key: config.provider.api_key.clone(),
            base_url: config.provider.base_url.clone(),
            temperature: config.limits.temperature,
            max_tokens: config.limits.max_tokens,
            call_budget: config.limits.call_budget_secs.map(Duration::from_secs),
        }
    }
}

impl GatewayFactory for HttpGatewayFactory {
    fn gateway(&self, model: &str) -> Arc<dyn ModelGateway> {
        let gateway = match &self.api_key {
            Some(key) => OpenAiCompatibleGateway::new(key.clone(), model.to_string())
                .with_base_url(self.base_url.clone()),
            None => {
                tracing::debug!(%model, base_url = %self.base_url, "no API key, keyless gateway");
                OpenAiCompatibleGateway::local(self.base_url.clone(), model.to_string())
            }
        };
        Arc::new(
            gateway
                .with_sampling(self.temperature, self.max_tokens)
                .with_call_budget(self.call_budget),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    #[test]
    fn test_factory_builds_gateway_for_model() {
        let config = EngineConfig::default();
        let factory = HttpGatewayFactory::from_config(&config);
        let gateway = factory.gateway("gpt-4o-mini");
        assert_eq!(gateway.model(), "gpt-4o-mini");
    }
}
