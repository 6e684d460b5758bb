//! The conversation orchestration loop.
//!
//! Drives one user turn to a final reply: append the user turn, request a
//! completion, resolve every tool call the model issued, resubmit, and
//! repeat until the model answers with plain text. Tool use is a
//! conversational side-channel, not a terminal action, so the loop keeps
//! resubmitting, but never past `max_rounds`; an adversarial or stuck
//! model fails closed with `ToolLoopExceeded` instead of looping forever.
//!
//! Tool failures are recovered locally: the failure text becomes the
//! tool-result turn and the model decides whether to retry or explain.
//! Endpoint failures are not retried here; they propagate to the chat
//! service carrying the tools already invoked.

use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::context::SessionContext;
use crate::core_types::{CompletionResponse, DisplayBlock, Turn};
use crate::errors::EngineError;
use crate::history::ConversationHistory;
use crate::llm::ChatEndpoint;
use crate::tools::ToolRegistry;

/// Reply used when the model returns a turn with neither text nor calls
/// left to make.
const FALLBACK_REPLY: &str = "I'm afraid I can't respond to that right now.";

#[derive(Debug)]
pub struct ChatOutcome {
    pub reply: String,
    /// `group:name` identifiers in invocation order, across all rounds.
    pub tools_invoked: Vec<String>,
}

/// A failed conversation attempt. The tools invoked before the failure are
/// preserved so the boundary can still report them.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct ConverseError {
    pub source: EngineError,
    pub tools_invoked: Vec<String>,
}

impl ConverseError {
    pub fn bare(source: EngineError) -> Self {
        Self {
            source,
            tools_invoked: Vec::new(),
        }
    }
}

pub struct Orchestrator {
    endpoint: Arc<dyn ChatEndpoint>,
    max_rounds: usize,
}

impl Orchestrator {
    pub fn new(endpoint: Arc<dyn ChatEndpoint>, max_rounds: usize) -> Self {
        Self {
            endpoint,
            max_rounds,
        }
    }

    /// Run the completion/tool loop for one user message.
    ///
    /// On cancellation before the first assistant turn arrives, the user
    /// turn is rolled back; afterwards every tool call of the current
    /// assistant turn is resolved before returning, so the history never
    /// holds an unresolved call.
    pub async fn converse(
        &self,
        history: &mut ConversationHistory,
        registry: &ToolRegistry,
        context: &mut SessionContext,
        user_message: &str,
        clear_blocks: bool,
        cancel: &CancellationToken,
    ) -> Result<ChatOutcome, ConverseError> {
        let checkpoint = history.len();
        history.push_user(user_message);
        context.begin_new_request(user_message, clear_blocks);

        let mut tools_invoked: Vec<String> = Vec::new();
        let schemas = registry.schemas();

        for round in 0..self.max_rounds {
            log::debug!("conversation round {} of {}", round + 1, self.max_rounds);

            let response = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    if round == 0 {
                        history.truncate_to(checkpoint);
                    }
                    return Err(ConverseError {
                        source: EngineError::Cancelled,
                        tools_invoked,
                    });
                }
                result = self.endpoint.complete(history.turns().to_vec(), schemas.clone()) => {
                    result.map_err(|source| ConverseError {
                        source,
                        tools_invoked: tools_invoked.clone(),
                    })?
                }
            };

            let CompletionResponse {
                content,
                tool_calls,
            } = response;

            history
                .push_assistant(Turn::assistant(content.clone(), tool_calls.clone()))
                .map_err(|source| ConverseError {
                    source,
                    tools_invoked: tools_invoked.clone(),
                })?;

            if tool_calls.is_empty() {
                let reply = content
                    .filter(|c| !c.trim().is_empty())
                    .unwrap_or_else(|| FALLBACK_REPLY.to_string());
                context.add_block(DisplayBlock::Message {
                    is_user_message: false,
                    message: reply.clone(),
                });
                return Ok(ChatOutcome {
                    reply,
                    tools_invoked,
                });
            }

            // Resolve every call of this turn, in the order the model
            // requested them, before the next completion request.
            for call in &tool_calls {
                tools_invoked.push(registry.qualified_name(&call.name));
                context.log_tool_call(&call.name, Some(call.arguments.to_string()));

                let result_text = match registry.get_tool(&call.name) {
                    Some(tool) => match tool.execute(call.arguments.clone()).await {
                        Ok(text) => text,
                        Err(e) => {
                            log::warn!("tool '{}' failed: {}", call.name, e);
                            format!("Tool call failed: {}", e)
                        }
                    },
                    None => {
                        log::warn!("model requested unknown tool '{}'", call.name);
                        format!("Unknown tool: {}", call.name)
                    }
                };

                history
                    .push_tool_result(&call.id, result_text)
                    .map_err(|source| ConverseError {
                        source,
                        tools_invoked: tools_invoked.clone(),
                    })?;
            }
        }

        log::warn!(
            "conversation exceeded {} tool rounds without a final reply",
            self.max_rounds
        );
        Err(ConverseError {
            source: EngineError::ToolLoopExceeded {
                rounds: self.max_rounds,
            },
            tools_invoked,
        })
    }
}
