use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use url::Url;

use crate::constants::doh;
use crate::errors::{ToolError, TransportError};
use crate::mcp::catalog::{object_schema, string_param, ToolDef};
use crate::services::logger::Logger;
use crate::services::tool_executor::{ToolHandler, ToolOutput};
use crate::services::transport::{ApiRequest, HttpTransport};
use crate::utils::args::{optional_string, path_segment, required_string};

pub const TOOL_NAME: &str = "dohLookup";

pub fn tool_def() -> ToolDef {
    ToolDef::new(
        TOOL_NAME,
        "Perform a DNS-over-HTTPS lookup through a NextDNS profile to see how that profile resolves a domain (blocked, allowed, rewritten).",
        object_schema(
            vec![
                (
                    "domain",
                    string_param("The domain name to look up, e.g. adwords.google.com"),
                ),
                (
                    "profile_id",
                    string_param("NextDNS profile ID. Defaults to NEXTDNS_DEFAULT_PROFILE"),
                ),
                (
                    "record_type",
                    json!({
                        "type": "string",
                        "description": "DNS record type to query",
                        "default": doh::DEFAULT_RECORD_TYPE,
                        "enum": doh::VALID_RECORD_TYPES,
                    }),
                ),
            ],
            &["domain"],
        ),
    )
}

/// The query URL as sent, with `name` and `type` form-encoded.
fn endpoint_url(path: &str, domain: &str, record_type: &str) -> String {
    let base = format!("{}{}", doh::BASE_URL, path);
    Url::parse_with_params(&base, &[("name", domain), ("type", record_type)])
        .map(String::from)
        .unwrap_or(base)
}

pub fn status_description(status: i64) -> String {
    doh::STATUS_CODES
        .iter()
        .find(|(code, _)| *code == status)
        .map(|(_, text)| text.to_string())
        .unwrap_or_else(|| format!("Unknown status code: {}", status))
}

/// DNS-over-HTTPS query against `dns.nextdns.io`. It never touches the
/// management API, so no profile access check applies.
pub struct DohLookupTool {
    transport: Arc<dyn HttpTransport>,
    default_profile: Option<String>,
    logger: Logger,
}

impl DohLookupTool {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        default_profile: Option<String>,
        logger: Logger,
    ) -> Self {
        Self {
            transport,
            default_profile,
            logger: logger.child("doh"),
        }
    }

    pub async fn lookup(
        &self,
        domain: &str,
        profile_id: Option<String>,
        record_type: Option<String>,
    ) -> Result<ToolOutput, ToolError> {
        let Some(profile) = profile_id.or_else(|| self.default_profile.clone()) else {
            return Ok(ToolOutput::error(json!({
                "error": "No profile_id provided and NEXTDNS_DEFAULT_PROFILE not set",
                "hint": "Provide profile_id parameter or set NEXTDNS_DEFAULT_PROFILE environment variable",
            })));
        };
        let profile = path_segment("profile_id", &profile)?;

        let requested = record_type.unwrap_or_else(|| doh::DEFAULT_RECORD_TYPE.to_string());
        let record_type = requested.to_uppercase();
        if !doh::VALID_RECORD_TYPES.contains(&record_type.as_str()) {
            self.logger.warn(
                &format!("Invalid DNS record type requested: {}", requested),
                None,
            );
            return Ok(ToolOutput::error(json!({
                "error": format!("Invalid record type: {}", requested),
                "valid_types": doh::VALID_RECORD_TYPES,
            })));
        }

        self.logger.info(
            &format!(
                "DoH lookup: {} ({}) via profile {}",
                domain, record_type, profile
            ),
            None,
        );

        let path = format!("/{}/dns-query", profile);
        let request = ApiRequest::get(path.clone()).with_query(vec![
            ("name".to_string(), domain.to_string()),
            ("type".to_string(), record_type.clone()),
        ]);

        let failure = |message: String| {
            self.logger.error(
                &format!("HTTP error during DoH lookup for {}: {}", domain, message),
                None,
            );
            ToolOutput::error(json!({
                "error": format!("HTTP error during DoH lookup: {}", message),
                "profile_id": profile,
                "domain": domain,
                "type": record_type,
            }))
        };

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(err @ TransportError::InvalidRequest(_)) => return Err(err.into()),
            Err(err) => return Ok(failure(err.to_string())),
        };
        if !response.is_success() {
            return Ok(failure(format!(
                "{} for url '{}{}'",
                response.status_text(),
                doh::BASE_URL,
                path
            )));
        }
        let Value::Object(mut answer) = response.body else {
            return Ok(failure("response is not a JSON object".to_string()));
        };

        let mut metadata = json!({
            "profile_id": profile,
            "query_domain": domain,
            "query_type": record_type,
            "doh_endpoint": endpoint_url(&path, domain, &record_type),
        });
        if let Some(status) = answer.get("Status").and_then(Value::as_i64) {
            let description = status_description(status);
            self.logger.debug(
                &format!("DoH lookup result: {} -> {}", domain, description),
                None,
            );
            metadata["status_description"] = Value::String(description);
        }
        answer.insert("_metadata".to_string(), metadata);
        Ok(ToolOutput::ok(Value::Object(answer)))
    }
}

#[async_trait]
impl ToolHandler for DohLookupTool {
    async fn handle(&self, args: Map<String, Value>) -> Result<ToolOutput, ToolError> {
        let domain = required_string(&args, "domain")?;
        let profile_id = optional_string(&args, "profile_id")?;
        let record_type = optional_string(&args, "record_type")?;
        self.lookup(&domain, profile_id, record_type).await
    }
}
