//! Core library for the QuestForge game-master backend.
//!
//! QuestForge turns player chat turns into tool-augmented responses from a
//! hosted chat-completion endpoint, maintaining per-session conversational
//! state and exposing two agents with distinct personas and callable
//! capabilities: the Game Master narrates play, the World Builder co-creates
//! a new campaign setting.
//!
//! # Architecture Overview
//!
//! - **Conversation orchestration**: the bounded completion/tool loop that
//!   owns each session's turn log
//! - **Agents**: personas bound to a prompt and a tool set, built fresh per
//!   incoming request
//! - **Prompt assembly**: adventure context loaded from persisted artifacts
//! - **Tool ecosystem**: dice rolls, setting recall, and the world-builder
//!   setting tracker
//! - **Chat-service boundary**: agent selection, first-turn seeding, and
//!   translation of endpoint failures into user-safe replies

pub mod agents;
pub mod chat_service;
pub mod config;
pub mod context;
pub mod core_types;
pub mod errors;
pub mod history;
pub mod llm;
pub mod orchestrator;
pub mod prompt;
pub mod storage;
pub mod tools;
pub mod users;

pub use agents::{AgentConfig, ChatAgent, GameMasterAgent, WorldBuilderAgent};
pub use chat_service::ChatService;
pub use config::QuestForgeConfig;
pub use context::SessionContext;
pub use errors::EngineError;
pub use history::ConversationHistory;
pub use llm::ChatEndpoint;
pub use orchestrator::{ChatOutcome, ConverseError, Orchestrator};
pub use prompt::PromptAssembler;
pub use storage::{FileStorage, LocalStorage};
pub use users::UserService;

#[cfg(test)]
pub mod test_utils;
