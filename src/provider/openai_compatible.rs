//! OpenAI-compatible chat-completions backend.
//!
//! Covers the official OpenAI API and any endpoint speaking the same
//! protocol (NVIDIA NIM, OpenRouter, LM Studio, Ollama, vLLM).

use super::error::{ProviderError, Result};
use super::gateway::{Completion, ModelGateway, TokenUsage};
use super::retry::{RetryConfig, retry_with_backoff};
use crate::engine::message::Message;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Gateway to an OpenAI-compatible chat-completions endpoint.
#[derive(Clone)]
pub struct OpenAiCompatibleGateway {
    api_key: Option<String>,
    base_url: String,
    model: String,
    client: Client,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    call_budget: Option<Duration>,
    retry: RetryConfig,
}

impl OpenAiCompatibleGateway {
    /// Gateway to the official OpenAI API.
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key: Some(api_key),
            base_url: DEFAULT_API_URL.to_string(),
            model,
            client: build_client(),
            temperature: None,
            max_tokens: None,
            call_budget: None,
            retry: RetryConfig::default(),
        }
    }

    /// Gateway to a local or keyless server (LM Studio, Ollama, vLLM).
    pub fn local(base_url: String, model: String) -> Self {
        Self {
            api_key: None,
            base_url,
            model,
            client: build_client(),
            temperature: None,
            max_tokens: None,
            call_budget: None,
            retry: RetryConfig::default(),
        }
    }

    /// Override the endpoint (OpenRouter, NVIDIA NIM, proxies).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_sampling(mut self, temperature: Option<f32>, max_tokens: Option<u32>) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    /// Wall-clock budget for one call; expiry yields the sentinel message
    /// without affecting sibling calls in flight.
    pub fn with_call_budget(mut self, budget: Option<Duration>) -> Self {
        self.call_budget = budget;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    fn headers(&self) -> Result<reqwest::header::HeaderMap> {
        let mut headers = reqwest::header::HeaderMap::new();

        if let Some(ref key) = self.api_key {
            // Trim whitespace/newlines that may have leaked from key files
            let clean_key = key.trim();
            let header_value: reqwest::header::HeaderValue = format!("Bearer {}", clean_key)
                .parse()
                .map_err(|_| {
                    tracing::error!(
                        "API key contains invalid characters (length={})",
                        clean_key.len()
                    );
                    ProviderError::InvalidApiKey
                })?;
            headers.insert(reqwest::header::AUTHORIZATION, header_value);
        }

        headers.insert(
            reqwest::header::CONTENT_TYPE,
            "application/json".parse().expect("valid content-type"),
        );

        Ok(headers)
    }

    fn to_request<'a>(&'a self, history: &'a [Message]) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: history,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: false,
        }
    }

    async fn complete(&self, history: &[Message]) -> Result<(String, Option<TokenUsage>)> {
        let response = self
            .client
            .post(&self.base_url)
            .headers(self.headers()?)
            .json(&self.to_request(history))
            .send()
            .await?;

        let status = response.status();
        tracing::debug!(model = %self.model, %status, "chat-completions response");

        if !status.is_success() {
            return Err(self.handle_error(response).await);
        }

        let body: ChatResponse = response.json().await?;
        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Malformed("response has no choices".into()))?;
        let content = choice
            .message
            .content
            .ok_or_else(|| ProviderError::Malformed("assistant message has no content".into()))?
            .trim()
            .to_string();

        let usage = body.usage.map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens.unwrap_or(0),
            completion_tokens: u.completion_tokens.unwrap_or(0),
        });

        Ok((content, usage))
    }

    async fn handle_error(&self, response: reqwest::Response) -> ProviderError {
        let status = response.status().as_u16();

        // Retry-After can be seconds or an HTTP date; only seconds are used
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok().and_then(|s| s.parse::<u64>().ok()));

        let message = match response.json::<ApiErrorResponse>().await {
            Ok(body) => body.error.message,
            Err(_) => "unknown error".to_string(),
        };

        if status == 429 {
            let message = match retry_after {
                Some(secs) => format!("{message} (retry after {secs} seconds)"),
                None => message,
            };
            ProviderError::RateLimited(message)
        } else {
            ProviderError::Api { status, message }
        }
    }
}

#[async_trait]
impl ModelGateway for OpenAiCompatibleGateway {
    async fn generate(&self, history: &[Message]) -> Completion {
        debug_assert!(!history.is_empty(), "history must be non-empty");
        debug_assert!(
            !history.last().is_some_and(Message::is_assistant),
            "history must end with a non-assistant message"
        );

        let call = retry_with_backoff(|| self.complete(history), &self.retry);
        let result = match self.call_budget {
            Some(budget) => match tokio::time::timeout(budget, call).await {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout(budget)),
            },
            None => call.await,
        };

        match result {
            Ok((content, usage)) => {
                if let Some(u) = usage {
                    tracing::debug!(
                        model = %self.model,
                        prompt_tokens = u.prompt_tokens,
                        completion_tokens = u.completion_tokens,
                        "completion received"
                    );
                } else {
                    tracing::debug!(model = %self.model, "completion received, no usage reported");
                }
                Completion {
                    message: Message::assistant(content),
                    usage,
                }
            }
            Err(e) => {
                tracing::warn!(model = %self.model, error = %e, "backend call failed, substituting sentinel");
                Completion::error(e)
            }
        }
    }

    fn model(&self) -> &str {
        &self.model
    }
}

fn build_client() -> Client {
    Client::builder()
        .timeout(DEFAULT_TIMEOUT)
        .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
        .build()
        .expect("Failed to create HTTP client")
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_retry() -> RetryConfig {
        RetryConfig {
            max_retries: 1,
            initial_backoff: Duration::from_millis(1),
            multiplier: 1.0,
        }
    }

    #[test]
    fn test_gateway_creation() {
        let gateway = OpenAiCompatibleGateway::new("test-key".into(), "gpt-4o-mini".into());
        assert_eq!(gateway.model(), "gpt-4o-mini");
        assert_eq!(gateway.base_url, DEFAULT_API_URL);

        let local =
            OpenAiCompatibleGateway::local("http://localhost:1234/v1/chat/completions".into(), "m".into());
        assert!(local.api_key.is_none());
    }

    #[tokio::test]
    async fn test_generate_accounts_reported_usage() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"id":"c1","model":"m","choices":[{"index":0,"message":{"role":"assistant","content":"  Answer: 4  "},"finish_reason":"stop"}],"usage":{"prompt_tokens":12,"completion_tokens":3}}"#,
            )
            .create_async()
            .await;

        let gateway = OpenAiCompatibleGateway::local(
            format!("{}/v1/chat/completions", server.url()),
            "m".into(),
        );
        let completion = gateway.generate(&[Message::user("2+2?")]).await;

        assert!(!completion.is_error());
        assert_eq!(completion.message.content, "Answer: 4");
        assert_eq!(completion.usage.map(|u| u.total()), Some(15));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_without_usage_leaves_counter_unset() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"4"}}]}"#,
            )
            .create_async()
            .await;

        let gateway = OpenAiCompatibleGateway::local(
            format!("{}/v1/chat/completions", server.url()),
            "m".into(),
        );
        let completion = gateway.generate(&[Message::user("2+2?")]).await;
        assert_eq!(completion.message.content, "4");
        assert!(completion.usage.is_none());
    }

    #[tokio::test]
    async fn test_server_error_retried_then_sentinel() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(500)
            .with_body(r#"{"error":{"message":"backend exploded"}}"#)
            .expect(2)
            .create_async()
            .await;

        let gateway = OpenAiCompatibleGateway::local(
            format!("{}/v1/chat/completions", server.url()),
            "m".into(),
        )
        .with_retry(fast_retry());
        let completion = gateway.generate(&[Message::user("2+2?")]).await;

        assert!(completion.is_error());
        assert!(completion.message.content.contains("backend exploded"));
        assert!(completion.usage.is_none());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rate_limit_becomes_sentinel_after_retry() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(429)
            .with_header("retry-after", "7")
            .with_body(r#"{"error":{"message":"slow down"}}"#)
            .expect(2)
            .create_async()
            .await;

        let gateway = OpenAiCompatibleGateway::local(
            format!("{}/v1/chat/completions", server.url()),
            "m".into(),
        )
        .with_retry(fast_retry());
        let completion = gateway.generate(&[Message::user("2+2?")]).await;

        assert!(completion.is_error());
        assert!(completion.message.content.contains("retry after 7 seconds"));
    }

    #[tokio::test]
    async fn test_call_budget_expiry_yields_sentinel() {
        use std::io::Write;

        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_chunked_body(|w| {
                std::thread::sleep(Duration::from_millis(500));
                w.write_all(
                    br#"{"choices":[{"index":0,"message":{"role":"assistant","content":"late"}}]}"#,
                )
            })
            .create_async()
            .await;

        let gateway = OpenAiCompatibleGateway::local(
            format!("{}/v1/chat/completions", server.url()),
            "m".into(),
        )
        .with_call_budget(Some(Duration::from_millis(50)));
        let completion = gateway.generate(&[Message::user("2+2?")]).await;

        assert!(completion.is_error());
        assert!(completion.message.content.contains("time budget"));
        assert!(completion.usage.is_none());
    }

    #[tokio::test]
    async fn test_malformed_body_becomes_sentinel() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let gateway = OpenAiCompatibleGateway::local(
            format!("{}/v1/chat/completions", server.url()),
            "m".into(),
        );
        let completion = gateway.generate(&[Message::user("2+2?")]).await;
        assert!(completion.is_error());
        assert!(completion.message.content.contains("no choices"));
    }
}
