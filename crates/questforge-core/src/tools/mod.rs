//! Callable tools advertised to the model and dispatched by the
//! orchestrator.
//!
//! Tools are registered per agent; the registry maps the model-facing name
//! to an implementation and produces the schema list sent with every
//! completion request. A tool's `group` namespaces its reported
//! identifier (`dice:roll_dice`) in chat results.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::EngineError;
use crate::llm::ToolSchema;

pub mod dice;
pub mod recall;
pub mod setting;

pub use dice::DiceRollTool;
pub use recall::SettingRecallTool;
pub use setting::{FinalizeSettingTool, SettingTracker, UpdateSettingTool};

#[async_trait]
pub trait Tool: Send + Sync {
    fn schema(&self) -> ToolSchema;

    /// Namespace for the reported `group:name` identifier.
    fn group(&self) -> &'static str {
        "tools"
    }

    async fn execute(&self, arguments: Value) -> Result<String, EngineError>;
}

pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register_tool(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.schema().name.clone();
        self.tools.insert(name, tool);
    }

    pub fn get_tool(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools.values().map(|tool| tool.schema()).collect()
    }

    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }

    /// The `group:name` identifier reported for an invoked tool. Unknown
    /// names fall back to the bare name so failed lookups still show up in
    /// the invocation list.
    pub fn qualified_name(&self, name: &str) -> String {
        match self.tools.get(name) {
            Some(tool) => format!("{}:{}", tool.group(), name),
            None => name.to_string(),
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_registers_and_resolves() {
        let mut registry = ToolRegistry::new();
        registry.register_tool(Arc::new(DiceRollTool::new()));

        assert_eq!(registry.tool_count(), 1);
        assert!(registry.get_tool("roll_dice").is_some());
        assert!(registry.get_tool("missing").is_none());
        assert_eq!(registry.qualified_name("roll_dice"), "dice:roll_dice");
        assert_eq!(registry.qualified_name("missing"), "missing");
    }

    #[test]
    fn schemas_cover_registered_tools() {
        let mut registry = ToolRegistry::new();
        registry.register_tool(Arc::new(DiceRollTool::new()));
        let schemas = registry.schemas();
        assert_eq!(schemas.len(), 1);
        assert_eq!(schemas[0].name, "roll_dice");
    }
}
