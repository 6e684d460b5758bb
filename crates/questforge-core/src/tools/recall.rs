//! Story-setting recall for the Game Master.
//!
//! Lets the model re-read the adventure's stored setting mid-session
//! instead of relying on whatever made it into the system prompt.

use crate::core_types::GameSetting;
use crate::errors::EngineError;
use crate::llm::ToolSchema;
use crate::storage::FileStorage;
use crate::tools::Tool;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

pub struct SettingRecallTool {
    storage: Arc<dyn FileStorage>,
    container: String,
}

impl SettingRecallTool {
    pub fn new(storage: Arc<dyn FileStorage>, adventure_container: impl Into<String>) -> Self {
        Self {
            storage,
            container: adventure_container.into(),
        }
    }
}

#[async_trait]
impl Tool for SettingRecallTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "recall_setting".to_string(),
            description: "Looks up the stored setting of the current adventure: world description, characters, objectives and gameplay style".to_string(),
            input_schema: json!({"type": "object", "properties": {}}),
        }
    }

    fn group(&self) -> &'static str {
        "world"
    }

    async fn execute(&self, _arguments: Value) -> Result<String, EngineError> {
        let path = format!("{}/StorySetting.json", self.container);
        let json_text = self
            .storage
            .load_text_or_default("adventures", &path)
            .await?
            .ok_or_else(|| EngineError::Tool {
                tool_name: "recall_setting".to_string(),
                message: format!("no stored setting found for this adventure at {}", path),
            })?;

        let setting: GameSetting =
            serde_json::from_str(&json_text).map_err(|e| EngineError::Tool {
                tool_name: "recall_setting".to_string(),
                message: format!("stored setting is not valid JSON: {}", e),
            })?;

        Ok(format!(
            "Campaign '{}' set in: {}\nMain character: {}, a {}. {}\nCampaign objective: {}\nGameplay style: {}",
            setting.campaign_name,
            setting.game_setting_description,
            setting.player_character_name,
            setting.player_character_class,
            setting.player_description,
            setting.campaign_objective,
            setting.desired_gameplay_style,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStorage;

    #[tokio::test]
    async fn recalls_stored_setting() {
        let setting = GameSetting {
            player_character_name: "Aria".to_string(),
            player_character_class: "Ranger".to_string(),
            game_setting_description: "A drowned coastal kingdom".to_string(),
            campaign_name: "The Sunken Keep".to_string(),
            ..GameSetting::default()
        };
        let storage = Arc::new(MemoryStorage::new().with_entry(
            "adventures",
            "keep/StorySetting.json",
            &serde_json::to_string(&setting).unwrap(),
        ));

        let tool = SettingRecallTool::new(storage, "keep");
        let result = tool.execute(json!({})).await.unwrap();
        assert!(result.contains("The Sunken Keep"));
        assert!(result.contains("Aria, a Ranger"));
    }

    #[tokio::test]
    async fn missing_setting_is_a_tool_error() {
        let storage = Arc::new(MemoryStorage::new());
        let tool = SettingRecallTool::new(storage, "keep");
        let result = tool.execute(json!({})).await;
        assert!(matches!(result, Err(EngineError::Tool { .. })));
    }
}
