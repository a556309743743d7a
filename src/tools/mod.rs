//! Tools the agent can call from an `Action:` line.
//!
//! The registry is built once at startup and shared read-only between
//! requests. Lookup is an exact, case-sensitive match on the tool name.

mod web;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::SearchConfig;

pub use web::WebSearch;

/// Reserved action that ends the loop. Never a registered tool.
pub const FINAL_ANSWER: &str = "Final Answer";

/// Whether an action names the `Final Answer` sentinel (case-insensitive, exact).
pub fn is_final_answer(action: &str) -> bool {
    action.trim().eq_ignore_ascii_case(FINAL_ANSWER)
}

/// A tool the model can invoke with a single text input.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the model writes after `Action:`.
    fn name(&self) -> &str;

    /// Description included in the ReAct prompt.
    fn description(&self) -> &str;

    /// Run the tool. Errors are reported back to the model as observation text.
    async fn execute(&self, input: &str) -> anyhow::Result<String>;
}

/// Name and description of a registered tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
}

/// Fixed set of tools available to the agent.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in web search tool.
    pub fn with_defaults(search: &SearchConfig) -> Self {
        let web_search: Arc<dyn Tool> = Arc::new(WebSearch::new(search.clone()));
        Self {
            tools: vec![web_search],
        }
    }

    /// Register a tool.
    ///
    /// Fails if the name is empty, duplicates an existing tool, or collides
    /// with the `Final Answer` sentinel.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> anyhow::Result<()> {
        let name = tool.name();
        if name.trim().is_empty() || name.trim() != name {
            anyhow::bail!("Invalid tool name: {:?}", name);
        }
        if is_final_answer(name) {
            anyhow::bail!("'{}' is reserved and cannot be registered as a tool", FINAL_ANSWER);
        }
        if self.contains(name) {
            anyhow::bail!("Tool already registered: {}", name);
        }
        self.tools.push(tool);
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, tool: Arc<dyn Tool>) -> anyhow::Result<Self> {
        self.register(tool)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Registered tool names, in registration order.
    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name().to_string()).collect()
    }

    pub fn list_tools(&self) -> Vec<ToolInfo> {
        self.tools
            .iter()
            .map(|t| ToolInfo {
                name: t.name().to_string(),
                description: t.description().to_string(),
            })
            .collect()
    }

    /// Execute a tool by name.
    ///
    /// Returns `None` when no tool has that name. Tool errors are folded into
    /// the returned text so the model can react to them.
    pub async fn execute(&self, name: &str, input: &str) -> Option<String> {
        let tool = self.get(name)?;
        let output = match tool.execute(input).await {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "Tool execution failed");
                format!("Error: {}", e)
            }
        };
        Some(output)
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::StubTool;
    use super::*;

    #[test]
    fn final_answer_matches_case_insensitively() {
        assert!(is_final_answer("Final Answer"));
        assert!(is_final_answer("final answer"));
        assert!(is_final_answer("  FINAL ANSWER "));
        assert!(!is_final_answer("Final Answer: Maybe"));
        assert!(!is_final_answer("I will give the final answer now"));
        assert!(!is_final_answer(""));
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let registry = ToolRegistry::new()
            .with(Arc::new(StubTool::ok("WebSearch", "")))
            .expect("register");
        assert!(registry.contains("WebSearch"));
        assert!(!registry.contains("websearch"));
        assert!(!registry.contains("Calculator"));
    }

    #[test]
    fn sentinel_and_duplicates_are_rejected() {
        let mut registry = ToolRegistry::new();
        assert!(registry
            .register(Arc::new(StubTool::ok("final answer", "")))
            .is_err());
        registry
            .register(Arc::new(StubTool::ok("WebSearch", "")))
            .expect("first registration");
        assert!(registry
            .register(Arc::new(StubTool::ok("WebSearch", "")))
            .is_err());
        assert!(registry.register(Arc::new(StubTool::ok(" ", ""))).is_err());
        assert_eq!(registry.names(), vec!["WebSearch".to_string()]);
    }

    #[tokio::test]
    async fn tool_errors_become_observation_text() {
        let registry = ToolRegistry::new()
            .with(Arc::new(StubTool::failing("WebSearch", "connection reset")))
            .expect("register");

        let output = registry.execute("WebSearch", "rust").await;
        assert_eq!(output.as_deref(), Some("Error: connection reset"));
        assert_eq!(registry.execute("Calculator", "1+1").await, None);
    }

    #[test]
    fn defaults_register_web_search() {
        let registry = ToolRegistry::with_defaults(&SearchConfig::new("key", "cx"));
        assert_eq!(registry.names(), vec!["WebSearch".to_string()]);
        let info = &registry.list_tools()[0];
        assert!(info.description.contains("Searches the internet"));
    }
}
