//! Core type definitions for the game-master conversation protocol
//!
//! This module defines the data structures shared between the orchestration
//! loop, the agents, and the chat-service boundary: the model-facing turn
//! log, tool invocation requests, the UI-facing display blocks, and the
//! request/result envelopes exchanged with clients. The turn types follow
//! the OpenAI function-calling message format so any compatible endpoint
//! can consume them directly.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// One entry in a session's model-facing conversation log.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Turn {
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Turn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn assistant(content: Option<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content,
            tool_calls,
            tool_call_id: None,
        }
    }

    pub fn tool_result(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: Some(call_id.into()),
        }
    }
}

/// A model-issued request to invoke a named tool with JSON arguments.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// The assistant turn returned by the chat endpoint: text, tool call
/// requests, or both.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CompletionResponse {
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

/// A UI/log-facing transcript entry, parallel to the model-facing turn log.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DisplayBlock {
    Message {
        is_user_message: bool,
        message: String,
    },
    Diagnostic {
        header: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        metadata: Option<String>,
    },
}

/// The structured setting payload the World Builder assembles turn by turn
/// and the Game Master reads back as the adventure's story setting.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct GameSetting {
    pub player_character_name: String,
    pub player_description: String,
    pub player_character_class: String,
    pub game_setting_description: String,
    pub campaign_name: String,
    pub campaign_objective: String,
    pub first_session_objective: String,
    pub desired_gameplay_style: String,
}

impl GameSetting {
    /// A setting is complete once every field the Game Master prompt relies
    /// on has been filled in.
    pub fn is_complete(&self) -> bool {
        !self.player_character_name.is_empty()
            && !self.player_character_class.is_empty()
            && !self.game_setting_description.is_empty()
            && !self.campaign_name.is_empty()
            && !self.campaign_objective.is_empty()
            && !self.first_session_objective.is_empty()
            && !self.desired_gameplay_style.is_empty()
    }
}

/// Structured payload attached to a chat request, resolved by the agent
/// variant it is addressed to.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "agent", rename_all = "snake_case")]
pub enum RequestPayload {
    WorldBuilder(GameSetting),
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatRequest {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub user: String,
    #[serde(default)]
    pub recipient_name: Option<String>,
    pub message: String,
    /// Prior turns held by the client; replayed into the agent's history.
    #[serde(default)]
    pub history: Vec<Turn>,
    #[serde(default)]
    pub payload: Option<RequestPayload>,
    /// Set on the first request of a new adventure so accumulated display
    /// blocks from an earlier session are cleared.
    #[serde(default)]
    pub start_of_session: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatMessage {
    pub author: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatResult {
    pub id: Uuid,
    /// The final reply text, or a user-safe failure message.
    pub message: String,
    pub replies: Vec<ChatMessage>,
    /// `group:name` identifiers of every tool invoked during this request,
    /// in invocation order.
    pub tools_invoked: Vec<String>,
    pub blocks: Vec<DisplayBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<GameSetting>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum AdventureStatus {
    New,
    InProgress,
}

/// A persisted game session's identity, supplied by the storage layer and
/// treated as read-only input here.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AdventureInfo {
    pub id: String,
    pub name: String,
    pub status: AdventureStatus,
    /// Storage container key under which this adventure's artifacts live.
    pub container: String,
    pub ruleset: String,
}
