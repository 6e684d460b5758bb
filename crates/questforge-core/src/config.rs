//! Configuration types for the QuestForge backend.
//!
//! A single YAML file configures the endpoint provider, the orchestration
//! bounds, storage, and the agent personas. Every section is optional;
//! serde defaults carry the built-in personas and prompts so a minimal
//! config only needs endpoint credentials.

use serde::{Deserialize, Serialize};

use crate::agents::AgentConfig;
use crate::errors::EngineError;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct QuestForgeConfig {
    pub server: ServerSettings,
    pub llm: LlmConfig,
    pub engine: EngineSettings,
    pub storage: StorageSettings,
    pub agents: AgentCatalog,
}

impl QuestForgeConfig {
    pub async fn load(path: &str) -> Result<Self, EngineError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| EngineError::Config(format!("failed to read {}: {}", path, e)))?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self, EngineError> {
        serde_yaml::from_str(text)
            .map_err(|e| EngineError::Config(format!("invalid configuration: {}", e)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3001".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub model: String,
    pub api_key: Option<String>,
    pub api_key_env: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::OpenAI,
            model: "gpt-4.1-mini".to_string(),
            api_key: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            temperature: None,
            max_tokens: None,
        }
    }
}

impl LlmConfig {
    /// Resolve the API key from the config or the configured env var.
    pub fn resolve_api_key(&self) -> Result<String, EngineError> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .ok_or_else(|| {
                EngineError::Config(format!(
                    "no API key configured; set llm.api_key or the {} environment variable",
                    self.api_key_env
                ))
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    OpenAI,
    Custom { base_url: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Maximum completion rounds per user turn before the tool loop fails
    /// closed.
    pub max_tool_rounds: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self { max_tool_rounds: 8 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub root: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            root: "./data".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AgentCatalog {
    pub game_master: AgentPromptSettings,
    pub world_builder: AgentPromptSettings,
}

impl AgentCatalog {
    /// Game Master prompt settings with the built-in defaults filled in.
    pub fn game_master_prompts(&self) -> AgentPromptSettings {
        let mut settings = self.game_master.clone();
        settings.fill_defaults(
            defaults::GAME_MASTER_PERSONA,
            defaults::GAME_MASTER_NEW_CAMPAIGN,
            defaults::GAME_MASTER_RESUME_CAMPAIGN,
        );
        settings
    }

    /// World Builder prompt settings with the built-in defaults filled in.
    pub fn world_builder_prompts(&self) -> AgentPromptSettings {
        let mut settings = self.world_builder.clone();
        settings.fill_defaults(
            defaults::WORLD_BUILDER_PERSONA,
            defaults::WORLD_BUILDER_NEW_CAMPAIGN,
            defaults::WORLD_BUILDER_RESUME_CAMPAIGN,
        );
        settings
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AgentPromptSettings {
    pub persona: Option<String>,
    pub new_campaign_prompt: Option<String>,
    pub resume_campaign_prompt: Option<String>,
}

impl AgentPromptSettings {
    fn fill_defaults(&mut self, persona: &str, new_campaign: &str, resume_campaign: &str) {
        self.persona.get_or_insert_with(|| persona.to_string());
        self.new_campaign_prompt
            .get_or_insert_with(|| new_campaign.to_string());
        self.resume_campaign_prompt
            .get_or_insert_with(|| resume_campaign.to_string());
    }

    pub fn to_agent_config(&self, additional_prompt: String) -> AgentConfig {
        AgentConfig {
            persona: self.persona.clone().unwrap_or_default(),
            new_campaign_prompt: self.new_campaign_prompt.clone(),
            resume_campaign_prompt: self.resume_campaign_prompt.clone(),
            additional_prompt,
        }
    }
}

pub mod defaults {
    pub const GAME_MASTER_PERSONA: &str = "\
You are the game master running a tabletop adventure for a single player. \
Let the player make their own decisions, call for skill checks and saving \
rolls when they are warranted, and use your tools to resolve them. Feel \
free to use markdown in your responses, but avoid lists. Ask the player \
what they'd like to do, without railroading them or nudging them too much.";

    pub const GAME_MASTER_NEW_CAMPAIGN: &str = "\
Greet the player, set the opening scene of the campaign, and ask them what \
they would like to do.";

    pub const GAME_MASTER_RESUME_CAMPAIGN: &str = "\
Welcome the player back, briefly remind them where the story left off, and \
continue the session.";

    pub const WORLD_BUILDER_PERSONA: &str = "\
You are a collaborative world builder helping a player design the setting \
for a new tabletop campaign. Ask about one or two details at a time, store \
every agreed detail with the update_setting tool, and call finalize_setting \
only after the player has confirmed the complete setting.";

    pub const WORLD_BUILDER_NEW_CAMPAIGN: &str = "\
Introduce yourself and start gathering the player's ideas for the world of \
their new campaign.";

    pub const WORLD_BUILDER_RESUME_CAMPAIGN: &str = "\
Pick up the world-building conversation where it left off and keep filling \
in the missing details of the setting.";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_complete() {
        let config = QuestForgeConfig::default();
        assert_eq!(config.engine.max_tool_rounds, 8);
        assert_eq!(config.server.bind_addr, "127.0.0.1:3001");

        let gm = config.agents.game_master_prompts();
        assert!(gm.persona.unwrap().contains("game master"));
        assert!(gm.new_campaign_prompt.is_some());
        assert!(gm.resume_campaign_prompt.is_some());
    }

    #[test]
    fn parses_partial_yaml() {
        let config = QuestForgeConfig::from_yaml(
            r#"
llm:
  model: gpt-4.1
  api_key_env: QF_API_KEY
engine:
  max_tool_rounds: 3
"#,
        )
        .unwrap();

        assert_eq!(config.llm.model, "gpt-4.1");
        assert_eq!(config.llm.api_key_env, "QF_API_KEY");
        assert_eq!(config.engine.max_tool_rounds, 3);
        assert_eq!(config.storage.root, "./data");
    }

    #[test]
    fn parses_custom_provider() {
        let config = QuestForgeConfig::from_yaml(
            r#"
llm:
  provider:
    custom:
      base_url: http://localhost:11434/v1
"#,
        )
        .unwrap();

        assert_eq!(
            config.llm.provider,
            LlmProvider::Custom {
                base_url: "http://localhost:11434/v1".to_string()
            }
        );
    }

    #[test]
    fn overridden_persona_wins() {
        let config = QuestForgeConfig::from_yaml(
            r#"
agents:
  game_master:
    persona: A stern referee.
"#,
        )
        .unwrap();

        let gm = config.agents.game_master_prompts();
        assert_eq!(gm.persona.as_deref(), Some("A stern referee."));
        // Unset prompts still fall back to the defaults.
        assert!(gm.new_campaign_prompt.is_some());
    }

    #[test]
    fn rejects_malformed_yaml() {
        assert!(matches!(
            QuestForgeConfig::from_yaml("llm: ["),
            Err(EngineError::Config(_))
        ));
    }
}
