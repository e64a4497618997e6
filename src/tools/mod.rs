pub mod builtin;

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{info, warn};

pub use builtin::{DrawChartTool, OpenUrlTool, ReadTableTool, RenderChartTool};

pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters(&self) -> Value;
    fn execute(&self, args: Value) -> Result<Value>;
}

/// Uniform result of every tool call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResponse {
    pub fn ok(result: Value) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .values()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters(),
            })
            .collect()
    }

    /// Run a tool by name. Errors of any kind come back as a failure response.
    pub fn call(&self, name: &str, args: Value) -> ToolResponse {
        let Some(tool) = self.tools.get(name) else {
            warn!(tool = name, "unknown tool");
            return ToolResponse::failure(format!("Tool {} not found", name));
        };

        info!(tool = name, "tool call");
        match tool.execute(args) {
            Ok(result) => ToolResponse::ok(result),
            Err(e) => {
                warn!(tool = name, error = %format!("{:#}", e), "tool call failed");
                ToolResponse::failure(format!("{:#}", e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use serde_json::json;

    struct Echo;
    impl Tool for Echo {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echo the arguments"
        }
        fn parameters(&self) -> Value {
            json!({"type": "object"})
        }
        fn execute(&self, args: Value) -> Result<Value> {
            if args.get("fail").is_some() {
                bail!("asked to fail");
            }
            Ok(args)
        }
    }

    #[test]
    fn test_call_success_and_failure() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(Echo));

        let ok = registry.call("echo", json!({"a": 1}));
        assert!(ok.success);
        assert_eq!(ok.result, Some(json!({"a": 1})));

        let failed = registry.call("echo", json!({"fail": true}));
        assert!(!failed.success);
        assert_eq!(failed.error.as_deref(), Some("asked to fail"));
    }

    #[test]
    fn test_unknown_tool_is_failure() {
        let registry = ToolRegistry::new();
        let response = registry.call("nope", Value::Null);
        assert!(!response.success);
        assert!(response.error.unwrap().contains("nope"));
    }

    #[test]
    fn test_response_serialization_skips_empty_fields() {
        let value = serde_json::to_value(ToolResponse::failure("boom")).unwrap();
        assert_eq!(value, json!({"success": false, "error": "boom"}));
    }
}
