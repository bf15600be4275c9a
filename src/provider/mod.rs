//! Model backends.
//!
//! A [`ModelGateway`] turns a conversation history into one assistant
//! message. The call is total: transport failures, rate limits and
//! malformed bodies all fold into a sentinel completion so protocols
//! never have to branch on backend health mid-exchange.

pub mod error;
pub mod factory;
mod gateway;
pub mod openai_compatible;
pub mod retry;

pub use error::{ProviderError, Result};
pub use factory::HttpGatewayFactory;
pub use gateway::{Completion, GatewayFactory, MODEL_ERROR_SENTINEL, ModelGateway, TokenUsage};
pub use openai_compatible::OpenAiCompatibleGateway;
pub use retry::{RetryConfig, retry_with_backoff};
