use crate::core_types::{CompletionResponse, Role, ToolCall, Turn};
use crate::errors::EngineError;
use crate::llm::{ChatEndpoint, ToolSchema};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

/// Client for OpenAI-compatible `/chat/completions` endpoints.
///
/// Tool auto-invocation stays disabled on the provider side: requested
/// calls come back in the response and the orchestrator resolves them.
#[derive(Debug, Clone)]
pub struct OpenAIEndpoint {
    client: Client,
    api_key: String,
    api_base: String,
    model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl OpenAIEndpoint {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            api_base: "https://api.openai.com/v1".to_string(),
            model,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_api_base(mut self, api_base: String) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    fn build_request_body(&self, turns: &[Turn], tools: &[ToolSchema]) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": self.format_turns(turns),
        });

        if let Some(temp) = self.temperature {
            body["temperature"] = temp.into();
        }

        if let Some(max_tokens) = self.max_tokens {
            body["max_tokens"] = max_tokens.into();
        }

        if !tools.is_empty() {
            let formatted_tools: Vec<Value> = tools
                .iter()
                .map(|tool| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": tool.name,
                            "description": tool.description,
                            "parameters": tool.input_schema
                        }
                    })
                })
                .collect();
            body["tools"] = formatted_tools.into();
            body["tool_choice"] = "auto".into();
        }

        body
    }

    fn format_turns(&self, turns: &[Turn]) -> Vec<Value> {
        turns
            .iter()
            .map(|turn| {
                let mut message = json!({
                    "role": self.format_role(&turn.role),
                    "content": turn.content.clone().unwrap_or_default()
                });

                if let Role::Tool = turn.role {
                    if let Some(call_id) = &turn.tool_call_id {
                        message["tool_call_id"] = json!(call_id);
                    }
                }

                if turn.role == Role::Assistant && !turn.tool_calls.is_empty() {
                    let formatted_calls: Vec<Value> = turn
                        .tool_calls
                        .iter()
                        .map(|tc| {
                            json!({
                                "id": tc.id,
                                "type": "function",
                                "function": {
                                    "name": tc.name,
                                    "arguments": tc.arguments.to_string()
                                }
                            })
                        })
                        .collect();
                    message["tool_calls"] = json!(formatted_calls);
                }

                message
            })
            .collect()
    }

    fn format_role(&self, role: &Role) -> &'static str {
        match role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }

    /// Map a non-success provider response to the engine taxonomy.
    ///
    /// Content-filter rejections become `ContentModeration` here so nothing
    /// above the provider has to match on error text.
    fn classify_error(status: reqwest::StatusCode, body: &str) -> EngineError {
        let code = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| {
                v["error"]["code"]
                    .as_str()
                    .map(|s| s.to_string())
            })
            .unwrap_or_default();

        let lowered = body.to_lowercase();
        if code == "content_filter"
            || code == "content_policy_violation"
            || lowered.contains("content management policy")
        {
            EngineError::ContentModeration(format!(
                "endpoint refused the request with status {}",
                status
            ))
        } else {
            EngineError::Endpoint(format!(
                "API request failed with status {}: {}",
                status, body
            ))
        }
    }

    fn parse_response(&self, response: Value) -> Result<CompletionResponse, EngineError> {
        let choices = response["choices"]
            .as_array()
            .ok_or_else(|| EngineError::Parsing("no choices in response".to_string()))?;

        let choice = choices
            .first()
            .ok_or_else(|| EngineError::Parsing("empty choices array".to_string()))?;
        let message = &choice["message"];

        let content = message["content"].as_str().map(|s| s.to_string());

        let mut tool_calls = Vec::new();
        if let Some(calls) = message["tool_calls"].as_array() {
            for call in calls {
                if let (Some(id), Some(function)) =
                    (call["id"].as_str(), call["function"].as_object())
                {
                    if let (Some(name), Some(arguments_str)) = (
                        function["name"].as_str(),
                        function["arguments"].as_str(),
                    ) {
                        let arguments: Value =
                            serde_json::from_str(arguments_str).map_err(|e| {
                                EngineError::Parsing(format!(
                                    "invalid tool call arguments JSON: {}",
                                    e
                                ))
                            })?;

                        tool_calls.push(ToolCall {
                            id: id.to_string(),
                            name: name.to_string(),
                            arguments,
                        });
                    }
                }
            }
        }

        if content.is_none() && tool_calls.is_empty() {
            return Err(EngineError::Parsing(
                "response has neither content nor tool calls".to_string(),
            ));
        }

        Ok(CompletionResponse {
            content,
            tool_calls,
        })
    }
}

#[async_trait]
impl ChatEndpoint for OpenAIEndpoint {
    async fn complete(
        &self,
        turns: Vec<Turn>,
        tools: Vec<ToolSchema>,
    ) -> Result<CompletionResponse, EngineError> {
        let url = format!("{}/chat/completions", self.api_base);
        let body = self.build_request_body(&turns, &tools);

        log::debug!(
            "chat endpoint request to {} with {} turns, {} tools",
            url,
            turns.len(),
            tools.len()
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::Endpoint(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| EngineError::Endpoint(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(Self::classify_error(status, &response_text));
        }

        let response_json: Value = serde_json::from_str(&response_text)
            .map_err(|e| EngineError::Parsing(format!("invalid JSON response: {}", e)))?;

        self.parse_response(response_json)
    }
}
