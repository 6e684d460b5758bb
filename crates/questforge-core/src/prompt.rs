//! Contextual prompt assembly for the Game Master.
//!
//! Pulls the adventure's stored setting and, for sessions in progress, the
//! prior-session recap, and renders them into prompt text appended to the
//! persona. Missing artifacts are logged and skipped; the prompt simply
//! proceeds without that section.

use std::fmt::Write as _;
use std::sync::Arc;

use crate::core_types::{AdventureInfo, AdventureStatus, GameSetting};
use crate::errors::EngineError;
use crate::storage::FileStorage;

const ADVENTURES_CONTAINER: &str = "adventures";

pub struct PromptAssembler {
    storage: Arc<dyn FileStorage>,
}

impl PromptAssembler {
    pub fn new(storage: Arc<dyn FileStorage>) -> Self {
        Self { storage }
    }

    /// Assemble the adventure-specific context for a Game Master session.
    pub async fn game_master_context(
        &self,
        adventure: &AdventureInfo,
    ) -> Result<String, EngineError> {
        let mut prompt = String::new();
        self.add_story_details(adventure, &mut prompt).await?;
        if adventure.status == AdventureStatus::InProgress {
            self.add_recap(adventure, &mut prompt).await?;
        }
        Ok(prompt)
    }

    /// The World Builder needs no stored context; the setting is created
    /// during the conversation itself.
    pub fn world_builder_context(&self, _adventure: &AdventureInfo) -> String {
        String::new()
    }

    async fn add_story_details(
        &self,
        adventure: &AdventureInfo,
        prompt: &mut String,
    ) -> Result<(), EngineError> {
        let settings_path = format!("{}/StorySetting.json", adventure.container);
        let json = self
            .storage
            .load_text_or_default(ADVENTURES_CONTAINER, &settings_path)
            .await?;

        let Some(json) = json.filter(|j| !j.trim().is_empty()) else {
            log::warn!(
                "no settings found for adventure {} at {}",
                adventure.name,
                settings_path
            );
            return Ok(());
        };

        log::debug!(
            "settings found for adventure {} at {}",
            adventure.name,
            settings_path
        );

        let setting: GameSetting = serde_json::from_str(&json).map_err(|e| {
            EngineError::Parsing(format!(
                "stored setting for adventure {} is invalid: {}",
                adventure.name, e
            ))
        })?;

        let _ = writeln!(
            prompt,
            "The adventure description is {}",
            setting.game_setting_description
        );
        let _ = writeln!(
            prompt,
            "The desired gameplay style is {}",
            setting.desired_gameplay_style
        );
        let _ = writeln!(
            prompt,
            "The main character is {}, a {}. {}",
            setting.player_character_name,
            setting.player_character_class,
            setting.player_description
        );
        let _ = writeln!(
            prompt,
            "The campaign objective is {}",
            setting.campaign_objective
        );
        if adventure.status == AdventureStatus::New {
            let _ = writeln!(
                prompt,
                "The first session objective is {}",
                setting.first_session_objective
            );
        }
        Ok(())
    }

    async fn add_recap(
        &self,
        adventure: &AdventureInfo,
        prompt: &mut String,
    ) -> Result<(), EngineError> {
        let recap_path = format!("{}/Recap.md", adventure.container);
        let recap = self
            .storage
            .load_text_or_default(ADVENTURES_CONTAINER, &recap_path)
            .await?;

        match recap.filter(|r| !r.trim().is_empty()) {
            Some(recap) => {
                log::debug!("session recap loaded for adventure {}", adventure.name);
                let _ = writeln!(prompt, "Here's a recap of the last session:");
                let _ = writeln!(prompt, "{}", recap);
            }
            None => {
                log::warn!(
                    "no recap was found for the last session of adventure {}",
                    adventure.name
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStorage;

    fn adventure(status: AdventureStatus) -> AdventureInfo {
        AdventureInfo {
            id: "adv-1".to_string(),
            name: "The Sunken Keep".to_string(),
            status,
            container: "sunken-keep".to_string(),
            ruleset: "5e".to_string(),
        }
    }

    fn setting_json() -> String {
        serde_json::to_string(&GameSetting {
            player_character_name: "Aria".to_string(),
            player_description: "A wiry scout.".to_string(),
            player_character_class: "Ranger".to_string(),
            game_setting_description: "a drowned coastal kingdom".to_string(),
            campaign_name: "The Sunken Keep".to_string(),
            campaign_objective: "lift the curse on the tide".to_string(),
            first_session_objective: "reach the keep before nightfall".to_string(),
            desired_gameplay_style: "exploration-heavy".to_string(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn new_adventure_includes_first_session_objective() {
        let storage = Arc::new(MemoryStorage::new().with_entry(
            "adventures",
            "sunken-keep/StorySetting.json",
            &setting_json(),
        ));
        let assembler = PromptAssembler::new(storage);

        let prompt = assembler
            .game_master_context(&adventure(AdventureStatus::New))
            .await
            .unwrap();

        assert!(prompt.contains("The adventure description is a drowned coastal kingdom"));
        assert!(prompt.contains("The main character is Aria, a Ranger. A wiry scout."));
        assert!(prompt.contains("The first session objective is reach the keep before nightfall"));
        // A new adventure has no recap section.
        assert!(!prompt.contains("recap of the last session"));
    }

    #[tokio::test]
    async fn in_progress_adventure_appends_recap() {
        let storage = Arc::new(
            MemoryStorage::new()
                .with_entry(
                    "adventures",
                    "sunken-keep/StorySetting.json",
                    &setting_json(),
                )
                .with_entry(
                    "adventures",
                    "sunken-keep/Recap.md",
                    "The party fled the keep at dawn.",
                ),
        );
        let assembler = PromptAssembler::new(storage);

        let prompt = assembler
            .game_master_context(&adventure(AdventureStatus::InProgress))
            .await
            .unwrap();

        assert!(prompt.contains("Here's a recap of the last session:"));
        assert!(prompt.contains("The party fled the keep at dawn."));
        assert!(!prompt.contains("first session objective"));
    }

    #[tokio::test]
    async fn missing_recap_is_not_an_error() {
        let storage = Arc::new(MemoryStorage::new().with_entry(
            "adventures",
            "sunken-keep/StorySetting.json",
            &setting_json(),
        ));
        let assembler = PromptAssembler::new(storage);

        let prompt = assembler
            .game_master_context(&adventure(AdventureStatus::InProgress))
            .await
            .unwrap();

        assert!(prompt.contains("The campaign objective is"));
        assert!(!prompt.contains("recap"));
    }

    #[tokio::test]
    async fn missing_settings_yield_empty_context() {
        let assembler = PromptAssembler::new(Arc::new(MemoryStorage::new()));
        let prompt = assembler
            .game_master_context(&adventure(AdventureStatus::New))
            .await
            .unwrap();
        assert!(prompt.is_empty());
    }
}
