//! The narration agent: runs play for an adventure in progress.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::agents::{AgentConfig, ChatAgent};
use crate::context::SessionContext;
use crate::core_types::{ChatMessage, ChatRequest, ChatResult};
use crate::errors::EngineError;
use crate::history::ConversationHistory;
use crate::llm::ChatEndpoint;
use crate::orchestrator::{ConverseError, Orchestrator};
use crate::storage::FileStorage;
use crate::tools::{DiceRollTool, SettingRecallTool, ToolRegistry};

pub const GAME_MASTER_NAME: &str = "Game Master";

struct AgentState {
    history: ConversationHistory,
    registry: ToolRegistry,
}

/// Stateless beyond its conversation history: every `chat` delegates
/// straight to the orchestrator with the narration persona and the
/// dice/world tool set.
pub struct GameMasterAgent {
    endpoint: Arc<dyn ChatEndpoint>,
    storage: Arc<dyn FileStorage>,
    adventure_container: String,
    max_tool_rounds: usize,
    state: Option<AgentState>,
}

impl GameMasterAgent {
    pub fn new(
        endpoint: Arc<dyn ChatEndpoint>,
        storage: Arc<dyn FileStorage>,
        adventure_container: impl Into<String>,
        max_tool_rounds: usize,
    ) -> Self {
        Self {
            endpoint,
            storage,
            adventure_container: adventure_container.into(),
            max_tool_rounds,
            state: None,
        }
    }

    pub fn tool_count(&self) -> Result<usize, EngineError> {
        self.state
            .as_ref()
            .map(|s| s.registry.tool_count())
            .ok_or(EngineError::NotInitialized(GAME_MASTER_NAME))
    }
}

#[async_trait]
impl ChatAgent for GameMasterAgent {
    fn name(&self) -> &str {
        GAME_MASTER_NAME
    }

    fn initialize(&mut self, config: AgentConfig) -> Result<(), EngineError> {
        let mut registry = ToolRegistry::new();
        registry.register_tool(Arc::new(DiceRollTool::new()));
        registry.register_tool(Arc::new(SettingRecallTool::new(
            self.storage.clone(),
            self.adventure_container.clone(),
        )));

        // Re-initialization replaces the state wholesale, so neither the
        // system prompt nor the tool set can be duplicated.
        self.state = Some(AgentState {
            history: ConversationHistory::new(config.full_prompt()),
            registry,
        });
        Ok(())
    }

    async fn chat(
        &mut self,
        request: ChatRequest,
        username: &str,
        context: &mut SessionContext,
        cancel: &CancellationToken,
    ) -> Result<ChatResult, ConverseError> {
        let state = self
            .state
            .as_mut()
            .ok_or_else(|| ConverseError::bare(EngineError::NotInitialized(GAME_MASTER_NAME)))?;

        log::info!("{} to {}: {}", username, GAME_MASTER_NAME, request.message);
        state.history.extend_with(&request.history);

        let orchestrator = Orchestrator::new(self.endpoint.clone(), self.max_tool_rounds);
        let outcome = orchestrator
            .converse(
                &mut state.history,
                &state.registry,
                context,
                &request.message,
                request.start_of_session,
                cancel,
            )
            .await?;

        Ok(ChatResult {
            id: request.id.unwrap_or_else(Uuid::new_v4),
            message: outcome.reply.clone(),
            replies: vec![ChatMessage {
                author: GAME_MASTER_NAME.to_string(),
                message: outcome.reply,
            }],
            tools_invoked: outcome.tools_invoked,
            blocks: context.blocks().to_vec(),
            payload: None,
        })
    }
}
