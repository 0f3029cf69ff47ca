use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::errors::ToolError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDef {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl ToolDef {
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }

    /// Names declared under `inputSchema.properties`.
    pub fn parameter_names(&self) -> Result<HashSet<String>, ToolError> {
        let Some(schema) = self.input_schema.as_object() else {
            return Err(ToolError::internal(format!(
                "Tool '{}' has no object input schema",
                self.name
            )));
        };
        Ok(schema
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| props.keys().cloned().collect())
            .unwrap_or_default())
    }
}

/// Builds an object schema from `(name, schema)` pairs.
pub fn object_schema(properties: Vec<(&str, Value)>, required: &[&str]) -> Value {
    let props: Map<String, Value> = properties
        .into_iter()
        .map(|(name, schema)| (name.to_string(), schema))
        .collect();
    let mut schema = serde_json::json!({
        "type": "object",
        "properties": props,
    });
    if !required.is_empty() {
        schema["required"] = serde_json::json!(required);
    }
    schema
}

pub fn string_param(description: &str) -> Value {
    serde_json::json!({"type": "string", "description": description})
}
