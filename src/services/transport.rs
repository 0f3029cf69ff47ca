use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::constants::{api, doh};
use crate::errors::TransportError;

/// One outbound call to the management API. `path` is relative to the
/// transport's base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PUT, path).with_body(body)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The body as tool output. An empty body becomes `{"status": code}` so
    /// callers always get a JSON value to inspect.
    pub fn into_payload(self) -> Value {
        match self.body {
            Value::Null => serde_json::json!({ "status": self.status }),
            body => body,
        }
    }

    pub fn status_text(&self) -> String {
        let reason = reqwest::StatusCode::from_u16(self.status)
            .ok()
            .and_then(|code| code.canonical_reason())
            .unwrap_or("");
        format!("{} {}", self.status, reason).trim_end().to_string()
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

/// Transport backed by a pooled `reqwest` client with fixed default headers.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: Url,
}

impl ReqwestTransport {
    /// Client for the management API, authenticated with `api_key`.
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, TransportError> {
        let mut key = HeaderValue::from_str(api_key)
            .map_err(|_| TransportError::InvalidRequest("API key is not a valid header".into()))?;
        key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(api::API_KEY_HEADER, key);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Self::with_headers(base_url, headers, timeout)
    }

    /// Unauthenticated client for the DNS-over-HTTPS resolver.
    pub fn doh(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(doh::ACCEPT));
        Self::with_headers(base_url, headers, timeout)
    }

    fn with_headers(
        base_url: &str,
        headers: HeaderMap,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let base_url = Url::parse(base_url)
            .map_err(|err| TransportError::InvalidRequest(format!("base URL: {}", err)))?;
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(api::MAX_REDIRECTS))
            .build()
            .map_err(|err| {
                TransportError::InvalidRequest(format!("Failed to build HTTP client: {}", err))
            })?;
        Ok(Self { client, base_url })
    }

    fn resolve(&self, request: &ApiRequest) -> Result<Url, TransportError> {
        let mut url = self
            .base_url
            .join(&request.path)
            .map_err(|err| TransportError::InvalidRequest(format!("{}: {}", request.path, err)))?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(request.query.iter());
        }
        Ok(url)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = self.resolve(&request)?;
        let mut builder = self.client.request(request.method.clone(), url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        let response = builder.send().await?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await?;
        Ok(ApiResponse::new(status, decode_body(&bytes)))
    }
}

/// JSON when possible, otherwise the raw text; an empty body is `null`.
pub fn decode_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_body_prefers_json() {
        assert_eq!(decode_body(br#"{"data": []}"#), json!({"data": []}));
        assert_eq!(decode_body(b"plain text"), json!("plain text"));
        assert_eq!(decode_body(b"  "), Value::Null);
    }

    #[test]
    fn resolve_joins_path_and_query() {
        let transport =
            ReqwestTransport::new("https://api.nextdns.io", "key", Duration::from_secs(5)).unwrap();
        let request = ApiRequest::get("/profiles/abc/logs")
            .with_query(vec![("limit".into(), "10".into()), ("search".into(), "a b".into())]);
        let url = transport.resolve(&request).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.nextdns.io/profiles/abc/logs?limit=10&search=a+b"
        );
    }

    #[test]
    fn status_text_includes_reason() {
        assert_eq!(ApiResponse::new(403, Value::Null).status_text(), "403 Forbidden");
        assert!(!ApiResponse::new(404, Value::Null).is_success());
        assert!(ApiResponse::new(204, Value::Null).is_success());
    }

    #[test]
    fn empty_body_becomes_status_object() {
        assert_eq!(ApiResponse::new(204, Value::Null).into_payload(), json!({"status": 204}));
        assert_eq!(ApiResponse::new(200, json!([])).into_payload(), json!([]));
    }
}
