//! The chat-service boundary: agent selection, prompt context loading,
//! first-turn seeding, and error translation.
//!
//! This is the single place where endpoint failures become user-safe
//! messages. Moderation rejections get a fixed refusal; every other
//! endpoint-side failure is rewritten to a generic message. Either way the
//! display blocks and the tools invoked before the failure still come
//! back, so the session transcript stays consistent. Programming and
//! configuration errors stay fatal to the request.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::agents::{ChatAgent, GameMasterAgent, WorldBuilderAgent};
use crate::agents::world_builder::WORLD_BUILDER_NAME;
use crate::config::{AgentCatalog, AgentPromptSettings};
use crate::context::SessionContext;
use crate::core_types::{
    AdventureInfo, AdventureStatus, ChatMessage, ChatRequest, ChatResult, GameSetting,
    RequestPayload,
};
use crate::errors::EngineError;
use crate::llm::ChatEndpoint;
use crate::orchestrator::ConverseError;
use crate::prompt::PromptAssembler;
use crate::storage::FileStorage;

const MODERATION_REFUSAL: &str = "I'm afraid that message is a bit too spicy for me to \
process. Could you try something else?";

pub struct ChatService {
    storage: Arc<dyn FileStorage>,
    endpoint: Arc<dyn ChatEndpoint>,
    agents: AgentCatalog,
    max_tool_rounds: usize,
}

impl ChatService {
    pub fn new(
        storage: Arc<dyn FileStorage>,
        endpoint: Arc<dyn ChatEndpoint>,
        agents: AgentCatalog,
        max_tool_rounds: usize,
    ) -> Self {
        Self {
            storage,
            endpoint,
            agents,
            max_tool_rounds,
        }
    }

    /// Handle one chat turn addressed to the agent named in the request
    /// (the Game Master when unspecified).
    pub async fn chat(
        &self,
        adventure: &AdventureInfo,
        request: ChatRequest,
        context: &mut SessionContext,
        cancel: &CancellationToken,
    ) -> Result<ChatResult, EngineError> {
        context.set_user(request.user.clone());
        context.set_adventure(adventure.clone());

        log::info!(
            "{} to {}: {}",
            request.user,
            request.recipient_name.as_deref().unwrap_or("Game Master"),
            request.message
        );
        if request.history.is_empty() {
            log::warn!("no history was provided in the request");
        }

        let username = request.user.clone();
        if request.recipient_name.as_deref() == Some(WORLD_BUILDER_NAME) {
            let mut agent = self.world_builder_agent()?;
            self.send_chat(&mut agent, request, &username, context, cancel)
                .await
        } else {
            let mut agent = self.game_master_agent(adventure).await?;
            self.send_chat(&mut agent, request, &username, context, cancel)
                .await
        }
    }

    /// Open a session with the Game Master, seeding the first user turn
    /// from the template matching the adventure's status.
    pub async fn start_chat(
        &self,
        adventure: &AdventureInfo,
        username: &str,
        context: &mut SessionContext,
        cancel: &CancellationToken,
    ) -> Result<ChatResult, EngineError> {
        context.set_user(username.to_string());
        context.set_adventure(adventure.clone());

        let chat_id = Uuid::new_v4();
        log::info!(
            "chat {} started with {} in adventure {}",
            chat_id,
            username,
            adventure.name
        );

        let settings = self.agents.game_master_prompts();
        let mut agent = self.game_master_agent(adventure).await?;
        let request = ChatRequest {
            id: Some(chat_id),
            user: username.to_string(),
            recipient_name: Some(agent.name().to_string()),
            message: seed_message(&settings, adventure.status)?,
            history: Vec::new(),
            payload: None,
            start_of_session: true,
        };

        self.send_chat(&mut agent, request, username, context, cancel)
            .await
    }

    /// Open a world-building session for a new adventure.
    pub async fn start_world_builder_chat(
        &self,
        adventure: &AdventureInfo,
        username: &str,
        context: &mut SessionContext,
        cancel: &CancellationToken,
    ) -> Result<ChatResult, EngineError> {
        context.set_user(username.to_string());
        context.set_adventure(adventure.clone());

        let chat_id = Uuid::new_v4();
        log::info!(
            "world builder chat {} started with {} in adventure {}",
            chat_id,
            username,
            adventure.name
        );

        let settings = self.agents.world_builder_prompts();
        let mut agent = self.world_builder_agent()?;
        let request = ChatRequest {
            id: Some(chat_id),
            user: username.to_string(),
            recipient_name: Some(agent.name().to_string()),
            message: seed_message(&settings, adventure.status)?,
            history: Vec::new(),
            payload: Some(RequestPayload::WorldBuilder(GameSetting::default())),
            start_of_session: true,
        };

        self.send_chat(&mut agent, request, username, context, cancel)
            .await
    }

    async fn game_master_agent(
        &self,
        adventure: &AdventureInfo,
    ) -> Result<GameMasterAgent, EngineError> {
        let assembler = PromptAssembler::new(self.storage.clone());
        let additional_prompt = assembler.game_master_context(adventure).await?;

        let mut agent = GameMasterAgent::new(
            self.endpoint.clone(),
            self.storage.clone(),
            adventure.container.clone(),
            self.max_tool_rounds,
        );
        agent.initialize(
            self.agents
                .game_master_prompts()
                .to_agent_config(additional_prompt),
        )?;
        Ok(agent)
    }

    fn world_builder_agent(&self) -> Result<WorldBuilderAgent, EngineError> {
        let mut agent = WorldBuilderAgent::new(self.endpoint.clone(), self.max_tool_rounds);
        agent.initialize(self.agents.world_builder_prompts().to_agent_config(String::new()))?;
        Ok(agent)
    }

    async fn send_chat<A: ChatAgent>(
        &self,
        agent: &mut A,
        request: ChatRequest,
        username: &str,
        context: &mut SessionContext,
        cancel: &CancellationToken,
    ) -> Result<ChatResult, EngineError> {
        let agent_name = agent.name().to_string();
        match agent.chat(request, username, context, cancel).await {
            Ok(result) => {
                log::info!("{} to {}: {}", agent_name, username, result.message);
                Ok(result)
            }
            Err(failure) => self.translate_failure(&agent_name, failure, context),
        }
    }

    fn translate_failure(
        &self,
        agent_name: &str,
        failure: ConverseError,
        context: &SessionContext,
    ) -> Result<ChatResult, EngineError> {
        let ConverseError {
            source,
            tools_invoked,
        } = failure;

        let message = match &source {
            EngineError::ContentModeration(detail) => {
                log::warn!("content moderation rejection: {}", detail);
                MODERATION_REFUSAL.to_string()
            }
            EngineError::Endpoint(_)
            | EngineError::Parsing(_)
            | EngineError::ToolLoopExceeded { .. } => {
                log::error!("chat request failed: {}", source);
                format!("Could not handle your request: {}", source)
            }
            // Everything else is a programming or configuration error and
            // stays fatal to the request.
            _ => return Err(source),
        };

        Ok(ChatResult {
            id: Uuid::new_v4(),
            message: message.clone(),
            replies: vec![ChatMessage {
                author: agent_name.to_string(),
                message,
            }],
            tools_invoked,
            blocks: context.blocks().to_vec(),
            payload: None,
        })
    }
}

fn seed_message(
    settings: &AgentPromptSettings,
    status: AdventureStatus,
) -> Result<String, EngineError> {
    let (template, which) = match status {
        AdventureStatus::New => (&settings.new_campaign_prompt, "new campaign"),
        AdventureStatus::InProgress => (&settings.resume_campaign_prompt, "resume campaign"),
    };
    template
        .clone()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| EngineError::Config(format!("no {} prompt configured", which)))
}
