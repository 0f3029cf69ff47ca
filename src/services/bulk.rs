use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::errors::{ToolError, TransportError};
use crate::mcp::catalog::{object_schema, string_param, ToolDef};
use crate::services::logger::Logger;
use crate::services::tool_executor::{ToolHandler, ToolOutput};
use crate::services::transport::{ApiRequest, HttpTransport};
use crate::utils::args::{path_segment, required_string};

/// A list endpoint replaced wholesale by a `PUT` with an array body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkListSpec {
    pub tool_name: &'static str,
    pub endpoint: &'static str,
    pub field: &'static str,
    pub description: &'static str,
    pub example: &'static str,
}

impl BulkListSpec {
    pub fn path_for(&self, profile_id: &str) -> String {
        self.endpoint.replace("{profile_id}", profile_id)
    }

    pub fn tool_def(&self) -> ToolDef {
        ToolDef::new(
            self.tool_name,
            self.description,
            object_schema(
                vec![
                    (
                        "profile_id",
                        string_param("The profile ID (6-character alphanumeric)"),
                    ),
                    (
                        self.field,
                        string_param(&format!(
                            "JSON array string replacing the whole list, e.g. '{}'",
                            self.example
                        )),
                    ),
                ],
                &["profile_id", self.field],
            ),
        )
    }
}

pub const BULK_LISTS: [BulkListSpec; 7] = [
    BulkListSpec {
        tool_name: "updateDenylist",
        endpoint: "/profiles/{profile_id}/denylist",
        field: "entries",
        description: "Replace the entire denylist of a profile with the given domains. Entries may be plain domains or wildcard subdomains (*.example.com).",
        example: r#"["ads.example.com", "tracker.net"]"#,
    },
    BulkListSpec {
        tool_name: "updateAllowlist",
        endpoint: "/profiles/{profile_id}/allowlist",
        field: "entries",
        description: "Replace the entire allowlist of a profile with the given domains. Entries may be plain domains or wildcard subdomains (*.example.com).",
        example: r#"["safe.com", "trusted.org"]"#,
    },
    BulkListSpec {
        tool_name: "updateParentalControlServices",
        endpoint: "/profiles/{profile_id}/parentalControl/services",
        field: "services",
        description: "Replace the list of blocked services (tiktok, fortnite, roblox, ...) of a profile.",
        example: r#"["tiktok", "fortnite"]"#,
    },
    BulkListSpec {
        tool_name: "updateParentalControlCategories",
        endpoint: "/profiles/{profile_id}/parentalControl/categories",
        field: "categories",
        description: "Replace the list of blocked website categories (gambling, dating, piracy, ...) of a profile.",
        example: r#"["gambling", "dating"]"#,
    },
    BulkListSpec {
        tool_name: "updateSecurityTlds",
        endpoint: "/profiles/{profile_id}/security/tlds",
        field: "tlds",
        description: "Replace the list of blocked top-level domains of a profile. TLDs are given without the dot.",
        example: r#"["zip", "mov"]"#,
    },
    BulkListSpec {
        tool_name: "updatePrivacyBlocklists",
        endpoint: "/profiles/{profile_id}/privacy/blocklists",
        field: "blocklists",
        description: "Replace the list of enabled privacy blocklists (nextdns-recommended, oisd, ...) of a profile.",
        example: r#"["nextdns-recommended", "oisd"]"#,
    },
    BulkListSpec {
        tool_name: "updatePrivacyNatives",
        endpoint: "/profiles/{profile_id}/privacy/natives",
        field: "natives",
        description: "Replace the list of native tracking protections (apple, windows, alexa, ...) of a profile.",
        example: r#"["apple", "windows"]"#,
    },
];

fn error_result(message: String) -> Value {
    json!({ "error": message })
}

/// Parses `payload` as a JSON array and `PUT`s it to the list endpoint.
///
/// Malformed input and HTTP failures come back as `{"error": ...}` values;
/// only a request that cannot be built is returned as `Err`.
pub async fn bulk_replace(
    transport: &dyn HttpTransport,
    logger: &Logger,
    spec: &BulkListSpec,
    profile_id: &str,
    payload: &str,
) -> Result<Value, TransportError> {
    logger.info(
        &format!("Bulk update: {} for profile {}", spec.field, profile_id),
        None,
    );

    let items = match serde_json::from_str::<Value>(payload) {
        Ok(Value::Array(items)) => items,
        Ok(other) => {
            logger.warn(
                &format!(
                    "Invalid {} format: expected array, got {}",
                    spec.field,
                    json_kind(&other)
                ),
                None,
            );
            return Ok(error_result(format!(
                "{} must be a JSON array string",
                spec.field
            )));
        }
        Err(err) => {
            logger.warn(
                &format!("JSON decode error for {}: {}", spec.field, err),
                None,
            );
            return Ok(error_result(format!("Invalid JSON: {}", err)));
        }
    };
    logger.debug(&format!("Parsed {} {} items", items.len(), spec.field), None);

    let path = spec.path_for(profile_id);
    let response = match transport
        .send(ApiRequest::put(path.clone(), Value::Array(items)))
        .await
    {
        Ok(response) => response,
        Err(TransportError::InvalidRequest(message)) => {
            return Err(TransportError::InvalidRequest(message))
        }
        Err(err) => {
            logger.error(&format!("HTTP error during bulk update: {}", err), None);
            return Ok(error_result(format!("HTTP error: {}", err)));
        }
    };

    if !response.is_success() {
        let message = format!("{} for url '{}'", response.status_text(), path);
        logger.error(&format!("HTTP error during bulk update: {}", message), None);
        return Ok(error_result(format!("HTTP error: {}", message)));
    }

    logger.info(
        &format!("Bulk update successful: {} for profile {}", spec.field, profile_id),
        None,
    );
    Ok(response.into_payload())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Object(_) => "object",
        Value::String(_) => "string",
        Value::Number(_) => "number",
        Value::Bool(_) => "boolean",
        Value::Null => "null",
        Value::Array(_) => "array",
    }
}

/// Tool handler for one [`BulkListSpec`].
pub struct BulkReplaceTool {
    spec: BulkListSpec,
    transport: Arc<dyn HttpTransport>,
    logger: Logger,
}

impl BulkReplaceTool {
    pub fn new(spec: BulkListSpec, transport: Arc<dyn HttpTransport>, logger: Logger) -> Self {
        Self {
            spec,
            transport,
            logger: logger.child("bulk"),
        }
    }
}

#[async_trait]
impl ToolHandler for BulkReplaceTool {
    async fn handle(&self, args: Map<String, Value>) -> Result<ToolOutput, ToolError> {
        let profile_id = path_segment("profile_id", &required_string(&args, "profile_id")?)?;
        // Arrays sent natively go through the same gate as their string form.
        let payload = match args.get(self.spec.field) {
            None | Some(Value::Null) => {
                return Err(ToolError::invalid_params(format!(
                    "{} is required",
                    self.spec.field
                )))
            }
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
        };

        let result = bulk_replace(
            self.transport.as_ref(),
            &self.logger,
            &self.spec,
            &profile_id,
            &payload,
        )
        .await?;

        let failed = result
            .as_object()
            .map(|obj| obj.len() == 1 && obj.contains_key("error"))
            .unwrap_or(false);
        Ok(if failed {
            ToolOutput::error(result)
        } else {
            ToolOutput::ok(result)
        })
    }
}
