//! The setting-creation agent: co-creates a new game world with the
//! player, tracking a structured setting draft turn by turn.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::agents::{AgentConfig, ChatAgent};
use crate::context::SessionContext;
use crate::core_types::{ChatMessage, ChatRequest, ChatResult, RequestPayload};
use crate::errors::EngineError;
use crate::history::ConversationHistory;
use crate::llm::ChatEndpoint;
use crate::orchestrator::{ConverseError, Orchestrator};
use crate::tools::{FinalizeSettingTool, SettingTracker, ToolRegistry, UpdateSettingTool};

pub const WORLD_BUILDER_NAME: &str = "World Builder";

struct AgentState {
    history: ConversationHistory,
    registry: ToolRegistry,
    tracker: SettingTracker,
}

/// Carries the setting-in-progress tracker: seeded from the request's
/// payload before each turn and read back into the result afterwards.
pub struct WorldBuilderAgent {
    endpoint: Arc<dyn ChatEndpoint>,
    max_tool_rounds: usize,
    state: Option<AgentState>,
}

impl WorldBuilderAgent {
    pub fn new(endpoint: Arc<dyn ChatEndpoint>, max_tool_rounds: usize) -> Self {
        Self {
            endpoint,
            max_tool_rounds,
            state: None,
        }
    }

    /// Whether the model has finalized the setting draft.
    pub fn has_created_world(&self) -> Result<bool, EngineError> {
        self.state
            .as_ref()
            .map(|s| s.tracker.is_finalized())
            .ok_or(EngineError::NotInitialized(WORLD_BUILDER_NAME))
    }
}

#[async_trait]
impl ChatAgent for WorldBuilderAgent {
    fn name(&self) -> &str {
        WORLD_BUILDER_NAME
    }

    fn initialize(&mut self, config: AgentConfig) -> Result<(), EngineError> {
        let tracker = SettingTracker::new();
        let mut registry = ToolRegistry::new();
        registry.register_tool(Arc::new(UpdateSettingTool::new(tracker.clone())));
        registry.register_tool(Arc::new(FinalizeSettingTool::new(tracker.clone())));

        self.state = Some(AgentState {
            history: ConversationHistory::new(config.full_prompt()),
            registry,
            tracker,
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
            .ok_or_else(|| ConverseError::bare(EngineError::NotInitialized(WORLD_BUILDER_NAME)))?;

        // The setting draft travels with the request; anything else
        // addressed to this agent is a caller bug, reported as a typed
        // error instead of a cast failure.
        match request.payload {
            Some(RequestPayload::WorldBuilder(setting)) => state.tracker.seed(setting),
            None => {
                return Err(ConverseError::bare(EngineError::PayloadMismatch {
                    agent: WORLD_BUILDER_NAME.to_string(),
                }))
            }
        }

        log::info!("{} to {}: {}", username, WORLD_BUILDER_NAME, request.message);
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
                author: WORLD_BUILDER_NAME.to_string(),
                message: outcome.reply,
            }],
            tools_invoked: outcome.tools_invoked,
            blocks: context.blocks().to_vec(),
            payload: Some(state.tracker.draft()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::GameSetting;
    use crate::test_utils::{call_with_args, calls, text, ScriptedEndpoint};
    use serde_json::json;

    fn request(message: &str, payload: Option<RequestPayload>) -> ChatRequest {
        ChatRequest {
            id: None,
            user: "aria".to_string(),
            recipient_name: Some(WORLD_BUILDER_NAME.to_string()),
            message: message.to_string(),
            history: Vec::new(),
            payload,
            start_of_session: false,
        }
    }

    #[tokio::test]
    async fn missing_payload_is_a_typed_error() {
        let endpoint = Arc::new(ScriptedEndpoint::new(vec![text("hi")]));
        let mut agent = WorldBuilderAgent::new(endpoint, 4);
        agent.initialize(AgentConfig::default()).unwrap();
        let mut context = SessionContext::new();

        let err = agent
            .chat(
                request("let's build a world", None),
                "aria",
                &mut context,
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err.source, EngineError::PayloadMismatch { .. }));
    }

    #[tokio::test]
    async fn accessor_before_initialize_fails() {
        let endpoint = Arc::new(ScriptedEndpoint::new(vec![]));
        let agent = WorldBuilderAgent::new(endpoint, 4);
        assert!(matches!(
            agent.has_created_world(),
            Err(EngineError::NotInitialized(_))
        ));
    }

    #[tokio::test]
    async fn tracks_setting_updates_into_result_payload() {
        let endpoint = Arc::new(ScriptedEndpoint::new(vec![
            calls(vec![call_with_args(
                "call_1",
                "update_setting",
                json!({"campaign_name": "The Sunken Keep"}),
            )]),
            text("Noted. What kind of hero will you play?"),
        ]));
        let mut agent = WorldBuilderAgent::new(endpoint, 4);
        agent.initialize(AgentConfig::default()).unwrap();
        let mut context = SessionContext::new();

        let result = agent
            .chat(
                request(
                    "Call the campaign 'The Sunken Keep'",
                    Some(RequestPayload::WorldBuilder(GameSetting::default())),
                ),
                "aria",
                &mut context,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(result.tools_invoked, ["setting:update_setting"]);
        let payload = result.payload.unwrap();
        assert_eq!(payload.campaign_name, "The Sunken Keep");
        assert!(!agent.has_created_world().unwrap());
    }

    #[tokio::test]
    async fn payload_seeds_the_tracker_each_turn() {
        let endpoint = Arc::new(ScriptedEndpoint::new(vec![text("Sounds good.")]));
        let mut agent = WorldBuilderAgent::new(endpoint, 4);
        agent.initialize(AgentConfig::default()).unwrap();
        let mut context = SessionContext::new();

        let seeded = GameSetting {
            campaign_name: "Ashfall".to_string(),
            ..GameSetting::default()
        };
        let result = agent
            .chat(
                request("continue", Some(RequestPayload::WorldBuilder(seeded))),
                "aria",
                &mut context,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(result.payload.unwrap().campaign_name, "Ashfall");
    }
}
