//! Per-session request context: identity, active adventure, and the
//! display-block transcript.
//!
//! One `SessionContext` exists per active session/request scope and is
//! passed by mutable reference into the chat service and orchestrator.
//! The block log is append-only during a conversation; it is cleared only
//! at session boundaries (a new adventure), never mid-conversation.
//! Deliberately not shared across sessions.

use crate::core_types::{AdventureInfo, DisplayBlock};

#[derive(Debug, Default)]
pub struct SessionContext {
    blocks: Vec<DisplayBlock>,
    current_user: Option<String>,
    current_adventure: Option<AdventureInfo>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blocks(&self) -> &[DisplayBlock] {
        &self.blocks
    }

    pub fn current_user(&self) -> Option<&str> {
        self.current_user.as_deref()
    }

    pub fn current_adventure(&self) -> Option<&AdventureInfo> {
        self.current_adventure.as_ref()
    }

    pub fn current_ruleset(&self) -> Option<&str> {
        self.current_adventure.as_ref().map(|a| a.ruleset.as_str())
    }

    pub fn set_user(&mut self, username: impl Into<String>) {
        self.current_user = Some(username.into());
    }

    pub fn set_adventure(&mut self, adventure: AdventureInfo) {
        self.current_adventure = Some(adventure);
    }

    /// Start tracking a new user request: optionally clear blocks carried
    /// over from an earlier adventure, then record the user message.
    pub fn begin_new_request(&mut self, message: &str, clear_previous: bool) {
        if clear_previous {
            self.clear_blocks();
        }
        self.blocks.push(DisplayBlock::Message {
            is_user_message: true,
            message: message.to_string(),
        });
    }

    pub fn add_block(&mut self, block: DisplayBlock) {
        self.blocks.push(block);
    }

    pub fn log_tool_call(&mut self, tool: &str, metadata: Option<String>) {
        self.blocks.push(DisplayBlock::Diagnostic {
            header: format!("{} tool called", tool),
            metadata,
        });
    }

    pub fn clear_blocks(&mut self) {
        self.blocks.clear();
    }

    /// Drop the identity/adventure association. The block log is kept; the
    /// caller decides its retention.
    pub fn logout(&mut self) {
        self.current_user = None;
        self.current_adventure = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::AdventureStatus;

    fn adventure() -> AdventureInfo {
        AdventureInfo {
            id: "adv-1".to_string(),
            name: "The Sunken Keep".to_string(),
            status: AdventureStatus::New,
            container: "sunken-keep".to_string(),
            ruleset: "5e".to_string(),
        }
    }

    #[test]
    fn begin_new_request_records_user_block() {
        let mut context = SessionContext::new();
        context.begin_new_request("I open the chest", false);
        assert_eq!(
            context.blocks(),
            [DisplayBlock::Message {
                is_user_message: true,
                message: "I open the chest".to_string(),
            }]
        );
    }

    #[test]
    fn begin_new_request_can_clear_prior_blocks() {
        let mut context = SessionContext::new();
        context.begin_new_request("old adventure", false);
        context.log_tool_call("roll_dice", None);
        context.begin_new_request("fresh start", true);
        assert_eq!(context.blocks().len(), 1);
    }

    #[test]
    fn logout_keeps_block_log() {
        let mut context = SessionContext::new();
        context.set_user("aria");
        context.set_adventure(adventure());
        context.begin_new_request("hello", false);
        context.logout();
        assert!(context.current_user().is_none());
        assert!(context.current_adventure().is_none());
        assert_eq!(context.blocks().len(), 1);
    }
}
