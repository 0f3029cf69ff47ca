use serde_json::{json, Map, Value};
use std::collections::HashSet;

use crate::errors::ToolError;
use crate::services::logger::Logger;
use crate::services::tool_executor::{ToolHandler, ToolOutput};
use crate::utils::field_filter::retain_known_fields;

/// Resolves the declared parameter names of a tool.
pub trait ToolSchemaLookup: Send + Sync {
    fn parameter_names(&self, tool: &str) -> Result<HashSet<String>, ToolError>;
}

/// Pre-call hook that drops arguments a tool does not declare. A failed
/// schema lookup is logged and the call proceeds with the arguments as given.
#[derive(Clone)]
pub struct StripUnknownFields {
    logger: Logger,
}

impl StripUnknownFields {
    pub fn new(logger: Logger) -> Self {
        Self {
            logger: logger.child("interceptor"),
        }
    }

    pub fn filter(
        &self,
        tool: &str,
        args: Map<String, Value>,
        lookup: &dyn ToolSchemaLookup,
    ) -> Map<String, Value> {
        if args.is_empty() {
            return args;
        }
        let known = match lookup.parameter_names(tool) {
            Ok(known) => known,
            Err(err) => {
                self.logger.warn(
                    &format!("Could not resolve parameters for tool {}, passing arguments through", tool),
                    Some(&json!({"error": err.message})),
                );
                return args;
            }
        };
        let (kept, removed) = retain_known_fields(args, &known);
        if !removed.is_empty() {
            self.logger.debug(
                &format!("Stripped unknown arguments from {}", tool),
                Some(&json!({"removed": removed})),
            );
        }
        kept
    }

    pub async fn intercept(
        &self,
        tool: &str,
        args: Map<String, Value>,
        lookup: &dyn ToolSchemaLookup,
        next: &dyn ToolHandler,
    ) -> Result<ToolOutput, ToolError> {
        let args = self.filter(tool, args, lookup);
        next.handle(args).await
    }
}
