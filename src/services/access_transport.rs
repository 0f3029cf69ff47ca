use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::errors::TransportError;
use crate::services::logger::Logger;
use crate::services::policy::{AccessDecision, AccessKind, PolicyHandle};
use crate::services::transport::{ApiRequest, ApiResponse, HttpTransport};
use crate::utils::coerce::coerce_json_types;

static PROFILE_PATH: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^/?profiles/([^/?#]+)(?:[/?#]|$)").ok());

/// The profile a request path targets, if any.
pub fn extract_profile_id(path: &str) -> Option<&str> {
    let regex = PROFILE_PATH.as_ref()?;
    regex
        .captures(path)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Decorates another transport with profile access checks and body coercion.
pub struct AccessControlledTransport {
    inner: Arc<dyn HttpTransport>,
    policy: PolicyHandle,
    logger: Logger,
}

impl AccessControlledTransport {
    pub fn new(inner: Arc<dyn HttpTransport>, policy: PolicyHandle, logger: Logger) -> Self {
        Self {
            inner,
            policy,
            logger: logger.child("transport"),
        }
    }

    fn denial(&self, request: &ApiRequest, profile_id: &str) -> Option<ApiResponse> {
        let kind = AccessKind::for_method(request.method.as_str());
        let AccessDecision::Denied(reason) = self.policy.snapshot().check(profile_id, kind) else {
            return None;
        };
        let message = reason.message();
        self.logger.warn(
            &format!(
                "{} (method={}, url={})",
                message, request.method, request.path
            ),
            None,
        );
        Some(ApiResponse::new(
            403,
            json!({"error": message, "profile_id": profile_id}),
        ))
    }
}

#[async_trait]
impl HttpTransport for AccessControlledTransport {
    async fn send(&self, mut request: ApiRequest) -> Result<ApiResponse, TransportError> {
        self.logger.info(
            &format!("HTTP Request: {} {}", request.method, request.path),
            None,
        );

        if let Some(profile_id) = extract_profile_id(&request.path) {
            if let Some(denied) = self.denial(&request, profile_id) {
                return Ok(denied);
            }
        }

        if let Some(Value::Object(_)) = &request.body {
            let coerced = request.body.take().map(coerce_json_types);
            self.logger.debug("Coerced JSON body", coerced.as_ref());
            request.body = coerced;
        }

        self.inner.send(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::extract_profile_id;

    #[test]
    fn extracts_profile_with_or_without_leading_slash() {
        assert_eq!(extract_profile_id("/profiles/abc123/denylist"), Some("abc123"));
        assert_eq!(extract_profile_id("profiles/abc123"), Some("abc123"));
        assert_eq!(extract_profile_id("/profiles/abc123?from=-1d"), Some("abc123"));
    }

    #[test]
    fn collection_paths_have_no_profile() {
        assert_eq!(extract_profile_id("/profiles"), None);
        assert_eq!(extract_profile_id("/profiles/"), None);
        assert_eq!(extract_profile_id("/v2/profiles/abc"), None);
        assert_eq!(extract_profile_id("/analytics"), None);
    }
}
