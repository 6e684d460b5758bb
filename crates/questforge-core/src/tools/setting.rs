//! Setting-in-progress tracker for the World Builder.
//!
//! The tracker is a shared handle: the World Builder seeds it from the
//! request payload before each turn, the update/finalize tools mutate it
//! as the model calls them, and the agent reads it back into the result
//! payload after the orchestrator returns. Finalizing requires a complete
//! draft so a half-built world can never be marked done.

use crate::core_types::GameSetting;
use crate::errors::EngineError;
use crate::llm::ToolSchema;
use crate::tools::Tool;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct SettingState {
    draft: GameSetting,
    finalized: bool,
}

#[derive(Clone, Default)]
pub struct SettingTracker {
    state: Arc<Mutex<SettingState>>,
}

impl SettingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the draft, e.g. with the payload carried by the request.
    /// Re-seeding clears a stale finalized flag from a previous turn.
    pub fn seed(&self, draft: GameSetting) {
        let mut state = self.state.lock().unwrap();
        state.finalized = draft.is_complete() && state.finalized;
        state.draft = draft;
    }

    pub fn draft(&self) -> GameSetting {
        self.state.lock().unwrap().draft.clone()
    }

    pub fn is_finalized(&self) -> bool {
        self.state.lock().unwrap().finalized
    }

    fn apply_update(&self, arguments: &Value) -> GameSetting {
        let mut state = self.state.lock().unwrap();
        let draft = &mut state.draft;
        merge_field(arguments, "player_character_name", &mut draft.player_character_name);
        merge_field(arguments, "player_description", &mut draft.player_description);
        merge_field(arguments, "player_character_class", &mut draft.player_character_class);
        merge_field(arguments, "game_setting_description", &mut draft.game_setting_description);
        merge_field(arguments, "campaign_name", &mut draft.campaign_name);
        merge_field(arguments, "campaign_objective", &mut draft.campaign_objective);
        merge_field(arguments, "first_session_objective", &mut draft.first_session_objective);
        merge_field(arguments, "desired_gameplay_style", &mut draft.desired_gameplay_style);
        state.draft.clone()
    }

    fn finalize(&self) -> Result<GameSetting, String> {
        let mut state = self.state.lock().unwrap();
        if !state.draft.is_complete() {
            return Err(
                "the setting is not complete yet; fill in every field before finalizing"
                    .to_string(),
            );
        }
        state.finalized = true;
        Ok(state.draft.clone())
    }
}

/// Overwrite `slot` only when the argument carries a non-blank value.
fn merge_field(arguments: &Value, key: &str, slot: &mut String) {
    if let Some(value) = arguments.get(key).and_then(|v| v.as_str()) {
        if !value.trim().is_empty() {
            *slot = value.trim().to_string();
        }
    }
}

fn setting_field_properties() -> Value {
    json!({
        "player_character_name": {"type": "string", "description": "Name of the player character"},
        "player_description": {"type": "string", "description": "Appearance and personality of the player character"},
        "player_character_class": {"type": "string", "description": "Class or archetype of the player character"},
        "game_setting_description": {"type": "string", "description": "Description of the world the campaign takes place in"},
        "campaign_name": {"type": "string", "description": "Name of the campaign"},
        "campaign_objective": {"type": "string", "description": "Overall objective of the campaign"},
        "first_session_objective": {"type": "string", "description": "Objective of the first play session"},
        "desired_gameplay_style": {"type": "string", "description": "Desired gameplay style, e.g. combat-heavy or roleplay-focused"}
    })
}

/// Merges the provided fields into the setting draft.
pub struct UpdateSettingTool {
    tracker: SettingTracker,
}

impl UpdateSettingTool {
    pub fn new(tracker: SettingTracker) -> Self {
        Self { tracker }
    }
}

#[async_trait]
impl Tool for UpdateSettingTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "update_setting".to_string(),
            description: "Stores agreed-upon details of the new game setting. Only pass fields the player has settled on; existing values are kept when a field is omitted".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": setting_field_properties(),
            }),
        }
    }

    fn group(&self) -> &'static str {
        "setting"
    }

    async fn execute(&self, arguments: Value) -> Result<String, EngineError> {
        let draft = self.tracker.apply_update(&arguments);
        let missing: Vec<&str> = [
            ("player_character_name", draft.player_character_name.is_empty()),
            ("player_character_class", draft.player_character_class.is_empty()),
            ("game_setting_description", draft.game_setting_description.is_empty()),
            ("campaign_name", draft.campaign_name.is_empty()),
            ("campaign_objective", draft.campaign_objective.is_empty()),
            ("first_session_objective", draft.first_session_objective.is_empty()),
            ("desired_gameplay_style", draft.desired_gameplay_style.is_empty()),
        ]
        .iter()
        .filter(|(_, empty)| *empty)
        .map(|(name, _)| *name)
        .collect();

        if missing.is_empty() {
            Ok("Setting updated. All required fields are filled in; call finalize_setting once the player confirms.".to_string())
        } else {
            Ok(format!(
                "Setting updated. Still missing: {}",
                missing.join(", ")
            ))
        }
    }
}

/// Marks the setting as complete once every field is filled in.
pub struct FinalizeSettingTool {
    tracker: SettingTracker,
}

impl FinalizeSettingTool {
    pub fn new(tracker: SettingTracker) -> Self {
        Self { tracker }
    }
}

#[async_trait]
impl Tool for FinalizeSettingTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "finalize_setting".to_string(),
            description: "Finalizes the game setting once the player has confirmed every detail. Fails if any field is still missing".to_string(),
            input_schema: json!({"type": "object", "properties": {}}),
        }
    }

    fn group(&self) -> &'static str {
        "setting"
    }

    async fn execute(&self, _arguments: Value) -> Result<String, EngineError> {
        match self.tracker.finalize() {
            Ok(draft) => Ok(format!(
                "The setting for '{}' is finalized. The adventure can begin.",
                draft.campaign_name
            )),
            Err(message) => Err(EngineError::Tool {
                tool_name: "finalize_setting".to_string(),
                message,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_setting() -> GameSetting {
        GameSetting {
            player_character_name: "Aria".to_string(),
            player_description: "A wiry scout with a crooked grin".to_string(),
            player_character_class: "Ranger".to_string(),
            game_setting_description: "A drowned coastal kingdom".to_string(),
            campaign_name: "The Sunken Keep".to_string(),
            campaign_objective: "Lift the curse on the tide".to_string(),
            first_session_objective: "Reach the keep before nightfall".to_string(),
            desired_gameplay_style: "Exploration with light combat".to_string(),
        }
    }

    #[tokio::test]
    async fn update_merges_only_provided_fields() {
        let tracker = SettingTracker::new();
        tracker.seed(complete_setting());
        let tool = UpdateSettingTool::new(tracker.clone());

        tool.execute(json!({"campaign_name": "The Sunken Keep, Revisited", "player_description": "  "}))
            .await
            .unwrap();

        let draft = tracker.draft();
        assert_eq!(draft.campaign_name, "The Sunken Keep, Revisited");
        // Blank values never clobber existing ones.
        assert_eq!(draft.player_description, "A wiry scout with a crooked grin");
        assert_eq!(draft.player_character_name, "Aria");
    }

    #[tokio::test]
    async fn update_reports_missing_fields() {
        let tracker = SettingTracker::new();
        let tool = UpdateSettingTool::new(tracker.clone());
        let result = tool
            .execute(json!({"player_character_name": "Aria"}))
            .await
            .unwrap();
        assert!(result.contains("Still missing"));
        assert!(result.contains("campaign_name"));
    }

    #[tokio::test]
    async fn finalize_refuses_incomplete_draft() {
        let tracker = SettingTracker::new();
        let tool = FinalizeSettingTool::new(tracker.clone());
        let result = tool.execute(json!({})).await;
        assert!(matches!(result, Err(EngineError::Tool { .. })));
        assert!(!tracker.is_finalized());
    }

    #[tokio::test]
    async fn finalize_marks_complete_draft() {
        let tracker = SettingTracker::new();
        tracker.seed(complete_setting());
        let tool = FinalizeSettingTool::new(tracker.clone());
        let result = tool.execute(json!({})).await.unwrap();
        assert!(result.contains("The Sunken Keep"));
        assert!(tracker.is_finalized());
    }

    #[test]
    fn seeding_incomplete_draft_clears_finalized_flag() {
        let tracker = SettingTracker::new();
        tracker.seed(complete_setting());
        tracker.finalize().unwrap();
        assert!(tracker.is_finalized());

        tracker.seed(GameSetting::default());
        assert!(!tracker.is_finalized());
    }
}
