//! Chat agents: named personas bound to a prompt and a tool set.
//!
//! Agents are constructed fresh for every incoming request. `initialize`
//! must run exactly once before the first `chat`; re-initializing resets
//! the agent instead of duplicating its system prompt or tools, and any
//! method used before `initialize` fails with `NotInitialized` rather than
//! silently returning default state.

use crate::context::SessionContext;
use crate::core_types::{ChatRequest, ChatResult};
use crate::errors::EngineError;
use crate::orchestrator::ConverseError;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

pub mod game_master;
pub mod world_builder;

pub use game_master::GameMasterAgent;
pub use world_builder::WorldBuilderAgent;

/// Immutable configuration handed to an agent's `initialize`.
#[derive(Debug, Clone, Default)]
pub struct AgentConfig {
    /// Fixed persona text for the agent's system prompt.
    pub persona: String,
    /// Seed message for the first turn of a brand-new campaign.
    pub new_campaign_prompt: Option<String>,
    /// Seed message for the first turn when resuming a campaign.
    pub resume_campaign_prompt: Option<String>,
    /// Adventure-specific context assembled per request.
    pub additional_prompt: String,
}

impl AgentConfig {
    /// The complete system prompt: persona plus the assembled context.
    pub fn full_prompt(&self) -> String {
        if self.additional_prompt.trim().is_empty() {
            self.persona.clone()
        } else {
            format!("{}\n\n{}", self.persona, self.additional_prompt)
        }
    }
}

#[async_trait]
pub trait ChatAgent: Send {
    fn name(&self) -> &str;

    fn initialize(&mut self, config: AgentConfig) -> Result<(), EngineError>;

    async fn chat(
        &mut self,
        request: ChatRequest,
        username: &str,
        context: &mut SessionContext,
        cancel: &CancellationToken,
    ) -> Result<ChatResult, ConverseError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_prompt_concatenates_context() {
        let config = AgentConfig {
            persona: "You run the table.".to_string(),
            additional_prompt: "The adventure description is a drowned keep.".to_string(),
            ..AgentConfig::default()
        };
        assert_eq!(
            config.full_prompt(),
            "You run the table.\n\nThe adventure description is a drowned keep."
        );
    }

    #[test]
    fn full_prompt_skips_empty_context() {
        let config = AgentConfig {
            persona: "You run the table.".to_string(),
            ..AgentConfig::default()
        };
        assert_eq!(config.full_prompt(), "You run the table.");
    }
}
