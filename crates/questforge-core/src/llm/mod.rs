//! Chat-completion endpoint abstractions.
//!
//! Defines the `ChatEndpoint` trait the orchestrator drives and the tool
//! schema advertised alongside each completion request. Tool execution is
//! never delegated to the provider: the endpoint only reports which calls
//! the model requested, and the orchestrator performs dispatch itself.

pub use crate::core_types::{CompletionResponse, Turn};
use crate::errors::EngineError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod providers;

pub use providers::openai::OpenAIEndpoint;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

#[async_trait]
pub trait ChatEndpoint: Send + Sync {
    /// Send the ordered conversation plus the advertised tool set and
    /// return the single assistant turn the model produced.
    async fn complete(
        &self,
        turns: Vec<Turn>,
        tools: Vec<ToolSchema>,
    ) -> Result<CompletionResponse, EngineError>;
}
