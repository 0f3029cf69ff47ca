use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::errors::ToolError;
use crate::mcp::catalog::ToolDef;
use crate::mcp::interceptor::{StripUnknownFields, ToolSchemaLookup};
use crate::services::logger::Logger;
use crate::utils::suggest::suggest;

/// What a tool hands back to the protocol layer. `is_error` marks results
/// that describe a failure but are still ordinary tool output.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub payload: Value,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn ok(payload: Value) -> Self {
        Self {
            payload,
            is_error: false,
        }
    }

    pub fn error(payload: Value) -> Self {
        Self {
            payload,
            is_error: true,
        }
    }
}

#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn handle(&self, args: Map<String, Value>) -> Result<ToolOutput, ToolError>;
}

#[derive(Clone)]
pub struct RegisteredTool {
    pub def: ToolDef,
    pub handler: Arc<dyn ToolHandler>,
}

/// Tool definitions and handlers, in registration order.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    order: Vec<String>,
    tools: HashMap<String, RegisteredTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, def: ToolDef, handler: Arc<dyn ToolHandler>) -> Result<(), ToolError> {
        if self.tools.contains_key(&def.name) {
            return Err(ToolError::internal(format!("Duplicate tool name: {}", def.name))
                .with_hint("This is a server wiring bug: every tool name must be registered once."));
        }
        self.order.push(def.name.clone());
        self.tools
            .insert(def.name.clone(), RegisteredTool { def, handler });
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredTool> {
        self.tools.get(name)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.order.clone()
    }

    pub fn definitions(&self) -> Vec<ToolDef> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.def.clone())
            .collect()
    }
}

impl ToolSchemaLookup for ToolRegistry {
    fn parameter_names(&self, tool: &str) -> Result<HashSet<String>, ToolError> {
        self.tools
            .get(tool)
            .ok_or_else(|| ToolError::not_found(format!("Unknown tool: {}", tool)))?
            .def
            .parameter_names()
    }
}

#[derive(Clone)]
pub struct ToolExecutor {
    logger: Logger,
    registry: Arc<ToolRegistry>,
    interceptor: StripUnknownFields,
}

impl ToolExecutor {
    pub fn new(logger: Logger, registry: ToolRegistry) -> Self {
        let logger = logger.child("executor");
        Self {
            interceptor: StripUnknownFields::new(logger.clone()),
            logger,
            registry: Arc::new(registry),
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    fn unknown_tool(&self, tool: &str) -> ToolError {
        let suggestions = suggest(tool, &self.registry.names(), 5);
        let hint = if suggestions.is_empty() {
            "Call tools/list to see the available tools".to_string()
        } else {
            format!("Did you mean: {}", suggestions.join(", "))
        };
        ToolError::invalid_params(format!("Unknown tool: {}", tool))
            .with_hint(hint)
            .with_details(json!({ "suggestions": suggestions }))
    }

    pub async fn execute(&self, tool: &str, args: Value) -> Result<ToolOutput, ToolError> {
        let Some(registered) = self.registry.get(tool) else {
            return Err(self.unknown_tool(tool));
        };
        let args = match args {
            Value::Null => Map::new(),
            Value::Object(map) => map,
            other => {
                return Err(ToolError::invalid_params(format!(
                    "arguments must be an object, got {}",
                    value_type_name(&other)
                )))
            }
        };

        self.logger.debug(&format!("Calling tool {}", tool), None);
        self.interceptor
            .intercept(
                tool,
                args,
                self.registry.as_ref(),
                registered.handler.as_ref(),
            )
            .await
    }
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::catalog::{object_schema, string_param};

    struct Echo;

    #[async_trait]
    impl ToolHandler for Echo {
        async fn handle(&self, args: Map<String, Value>) -> Result<ToolOutput, ToolError> {
            Ok(ToolOutput::ok(Value::Object(args)))
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry
            .register(
                ToolDef::new(
                    "getDenylist",
                    "List denylist entries",
                    object_schema(vec![("profile_id", string_param("Profile"))], &["profile_id"]),
                ),
                Arc::new(Echo),
            )
            .unwrap();
        registry
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = registry();
        let err = registry
            .register(
                ToolDef::new("getDenylist", "", object_schema(vec![], &[])),
                Arc::new(Echo),
            )
            .unwrap_err();
        assert!(err.message.contains("Duplicate tool name"));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn unknown_tool_carries_suggestion() {
        let executor = ToolExecutor::new(Logger::new("test"), registry());
        let err = executor.execute("getDenylst", json!({})).await.unwrap_err();
        assert_eq!(err.kind, crate::errors::ToolErrorKind::InvalidParams);
        assert_eq!(err.details, Some(json!({"suggestions": ["getDenylist"]})));
        assert!(err.hint.unwrap_or_default().contains("getDenylist"));
    }

    #[tokio::test]
    async fn execute_strips_undeclared_arguments() {
        let executor = ToolExecutor::new(Logger::new("test"), registry());
        let out = executor
            .execute("getDenylist", json!({"profile_id": "abc", "junk": 1}))
            .await
            .unwrap();
        assert_eq!(out.payload, json!({"profile_id": "abc"}));
    }

    #[tokio::test]
    async fn null_arguments_become_empty_object() {
        let executor = ToolExecutor::new(Logger::new("test"), registry());
        let out = executor.execute("getDenylist", Value::Null).await.unwrap();
        assert_eq!(out.payload, json!({}));
        assert!(executor.execute("getDenylist", json!([1])).await.is_err());
    }
}
