//! Endpoint provider implementations.

pub mod openai;

use std::sync::Arc;

use crate::config::{LlmConfig, LlmProvider};
use crate::errors::EngineError;
use crate::llm::ChatEndpoint;

pub use openai::OpenAIEndpoint;

/// Build a chat endpoint from configuration.
pub fn create_endpoint(config: &LlmConfig) -> Result<Arc<dyn ChatEndpoint>, EngineError> {
    let api_key = config.resolve_api_key()?;

    let mut endpoint = OpenAIEndpoint::new(api_key, config.model.clone());
    if let LlmProvider::Custom { base_url } = &config.provider {
        endpoint = endpoint.with_api_base(base_url.clone());
    }
    if let Some(temperature) = config.temperature {
        endpoint = endpoint.with_temperature(temperature);
    }
    if let Some(max_tokens) = config.max_tokens {
        endpoint = endpoint.with_max_tokens(max_tokens);
    }

    Ok(Arc::new(endpoint))
}
