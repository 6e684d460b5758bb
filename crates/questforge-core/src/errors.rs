//! Error types for failure handling across the game-master engine
//!
//! A single taxonomy covers every failure mode the engine distinguishes.
//! Tool failures are recovered inside the orchestration loop and surfaced
//! to the model; endpoint failures propagate to the chat-service boundary
//! where they are rewritten into user-safe messages. Content-moderation
//! rejections are a dedicated variant so no layer above the endpoint
//! provider has to match on provider error text.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum EngineError {
    #[error("chat endpoint failure: {0}")]
    Endpoint(String),
    #[error("chat endpoint rejected the content: {0}")]
    ContentModeration(String),
    #[error("tool '{tool_name}' failed: {message}")]
    Tool { tool_name: String, message: String },
    #[error("{0} used before initialize")]
    NotInitialized(&'static str),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("tool loop exceeded {rounds} rounds without a final reply")]
    ToolLoopExceeded { rounds: usize },
    #[error("request payload missing or mismatched for agent '{agent}'")]
    PayloadMismatch { agent: String },
    #[error("storage failure: {0}")]
    Storage(String),
    #[error("parsing error: {0}")]
    Parsing(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("request cancelled")]
    Cancelled,
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::Storage(err.to_string())
    }
}

impl From<reqwest::Error> for EngineError {
    fn from(err: reqwest::Error) -> Self {
        EngineError::Endpoint(err.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Parsing(err.to_string())
    }
}
