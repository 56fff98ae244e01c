//! LLM client configuration and the provider factory.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use valet_contracts::error::{ValetError, ValetResult};

use crate::{anthropic::AnthropicClient, client::LlmClient, openai::OpenAiClient};

fn default_max_tokens() -> u32 {
    1024
}

fn default_timeout_secs() -> u64 {
    60
}

/// Configuration for constructing an [`LlmClient`].
///
/// Usually deserialized from the application's config file; `base_url`
/// overrides the provider default for proxies and compatible gateways.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// `"anthropic"` or `"openai"`.
    pub provider: String,

    pub api_key: String,

    pub model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Build the client named by `config.provider`.
///
/// Returns `ValetError::Config` for an unrecognized provider or when the
/// underlying HTTP client cannot be constructed.
pub fn create_client(config: &LlmConfig) -> ValetResult<Arc<dyn LlmClient>> {
    match config.provider.as_str() {
        "anthropic" => Ok(Arc::new(AnthropicClient::new(config)?)),
        "openai" => Ok(Arc::new(OpenAiClient::new(config)?)),
        other => Err(ValetError::Config {
            reason: format!("unknown LLM provider '{}'", other),
        }),
    }
}
