//! Shared mocks for unit tests.

use crate::core_types::{CompletionResponse, ToolCall, Turn};
use crate::errors::EngineError;
use crate::llm::{ChatEndpoint, ToolSchema};
use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Endpoint that replays a script of responses and records every request
/// it receives.
pub struct ScriptedEndpoint {
    script: Mutex<VecDeque<Result<CompletionResponse, EngineError>>>,
    requests: Mutex<Vec<Vec<Turn>>>,
}

impl ScriptedEndpoint {
    pub fn new(script: Vec<Result<CompletionResponse, EngineError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn request(&self, idx: usize) -> Vec<Turn> {
        self.requests.lock().unwrap()[idx].clone()
    }
}

#[async_trait]
impl ChatEndpoint for ScriptedEndpoint {
    async fn complete(
        &self,
        turns: Vec<Turn>,
        _tools: Vec<ToolSchema>,
    ) -> Result<CompletionResponse, EngineError> {
        self.requests.lock().unwrap().push(turns);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(EngineError::Internal("script exhausted".to_string())))
    }
}

pub fn text(content: &str) -> Result<CompletionResponse, EngineError> {
    Ok(CompletionResponse {
        content: Some(content.to_string()),
        tool_calls: Vec::new(),
    })
}

pub fn calls(tool_calls: Vec<ToolCall>) -> Result<CompletionResponse, EngineError> {
    Ok(CompletionResponse {
        content: None,
        tool_calls,
    })
}

pub fn call(id: &str, name: &str) -> ToolCall {
    ToolCall {
        id: id.to_string(),
        name: name.to_string(),
        arguments: json!({"notation": "d20"}),
    }
}

pub fn call_with_args(id: &str, name: &str, arguments: serde_json::Value) -> ToolCall {
    ToolCall {
        id: id.to_string(),
        name: name.to_string(),
        arguments,
    }
}
