//! Append-only conversation history backing a single session.
//!
//! The history is owned by one agent instance and mutated only by the
//! orchestrator. Turns are never rewritten; the single exception is the
//! cancellation rollback, which truncates back to a checkpoint taken
//! before the user turn was appended. Tool-result bookkeeping enforces
//! that every model-issued call is resolved exactly once before the next
//! completion request goes out.

use crate::core_types::{Role, Turn};
use crate::errors::EngineError;

#[derive(Debug)]
pub struct ConversationHistory {
    turns: Vec<Turn>,
    /// Call ids from the most recent assistant turn that still await a
    /// tool-result turn.
    outstanding: Vec<String>,
}

impl ConversationHistory {
    /// Create a history seeded with the agent's system prompt.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn::system(system_prompt)],
            outstanding: Vec::new(),
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn outstanding_calls(&self) -> &[String] {
        &self.outstanding
    }

    /// Replay prior turns supplied by the client after the system turn.
    /// Only plain user/assistant text survives the round trip; stale tool
    /// bookkeeping from an earlier process is not reconstructed.
    pub fn extend_with(&mut self, prior: &[Turn]) {
        for turn in prior {
            match turn.role {
                Role::User | Role::Assistant => {
                    if turn.content.is_some() && turn.tool_calls.is_empty() {
                        self.turns.push(turn.clone());
                    }
                }
                Role::System | Role::Tool => {}
            }
        }
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.turns.push(Turn::user(content));
    }

    pub fn push_assistant(&mut self, turn: Turn) -> Result<(), EngineError> {
        if !self.outstanding.is_empty() {
            return Err(EngineError::Internal(format!(
                "assistant turn appended with {} unresolved tool calls",
                self.outstanding.len()
            )));
        }
        self.outstanding = turn.tool_calls.iter().map(|c| c.id.clone()).collect();
        self.turns.push(turn);
        Ok(())
    }

    /// Append a tool-result turn for `call_id`. The id must belong to the
    /// latest assistant turn and must not have been resolved already.
    pub fn push_tool_result(
        &mut self,
        call_id: &str,
        content: impl Into<String>,
    ) -> Result<(), EngineError> {
        let position = self
            .outstanding
            .iter()
            .position(|id| id == call_id)
            .ok_or_else(|| {
                EngineError::Internal(format!(
                    "tool result for unknown or already-resolved call id '{}'",
                    call_id
                ))
            })?;
        self.outstanding.remove(position);
        self.turns.push(Turn::tool_result(call_id, content));
        Ok(())
    }

    /// Roll back to a checkpoint taken with `len()`. Used only when a
    /// request is cancelled before any assistant turn was produced.
    pub fn truncate_to(&mut self, checkpoint: usize) {
        self.turns.truncate(checkpoint);
        self.outstanding.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::ToolCall;
    use serde_json::json;

    fn call(id: &str) -> ToolCall {
        ToolCall {
            id: id.to_string(),
            name: "roll_dice".to_string(),
            arguments: json!({"notation": "d20"}),
        }
    }

    #[test]
    fn starts_with_system_turn() {
        let history = ConversationHistory::new("You run the table.");
        assert_eq!(history.len(), 1);
        assert_eq!(history.turns()[0].role, Role::System);
    }

    #[test]
    fn resolves_calls_exactly_once() {
        let mut history = ConversationHistory::new("prompt");
        history.push_user("I open the chest");
        history
            .push_assistant(Turn::assistant(None, vec![call("a"), call("b")]))
            .unwrap();
        assert_eq!(history.outstanding_calls(), ["a", "b"]);

        history.push_tool_result("a", "14").unwrap();
        assert_eq!(history.outstanding_calls(), ["b"]);

        // Second resolution of the same id is rejected.
        assert!(history.push_tool_result("a", "14").is_err());
        // Unknown ids are rejected.
        assert!(history.push_tool_result("zzz", "?").is_err());

        history.push_tool_result("b", "3").unwrap();
        assert!(history.outstanding_calls().is_empty());
    }

    #[test]
    fn rejects_assistant_turn_over_unresolved_calls() {
        let mut history = ConversationHistory::new("prompt");
        history
            .push_assistant(Turn::assistant(None, vec![call("a")]))
            .unwrap();
        let result = history.push_assistant(Turn::assistant(Some("hi".into()), Vec::new()));
        assert!(result.is_err());
    }

    #[test]
    fn replays_only_plain_text_turns() {
        let mut history = ConversationHistory::new("prompt");
        let prior = vec![
            Turn::user("hello"),
            Turn::assistant(Some("well met".into()), Vec::new()),
            Turn::assistant(None, vec![call("x")]),
            Turn::tool_result("x", "4"),
            Turn::system("should not be duplicated"),
        ];
        history.extend_with(&prior);
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn rollback_clears_bookkeeping() {
        let mut history = ConversationHistory::new("prompt");
        let checkpoint = history.len();
        history.push_user("hello");
        history
            .push_assistant(Turn::assistant(None, vec![call("a")]))
            .unwrap();
        history.truncate_to(checkpoint);
        assert_eq!(history.len(), 1);
        assert!(history.outstanding_calls().is_empty());
    }
}
