#![allow(dead_code)]

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;

use nextdns_mcp::app::App;
use nextdns_mcp::config::Settings;
use nextdns_mcp::errors::TransportError;
use nextdns_mcp::services::transport::{ApiRequest, ApiResponse, HttpTransport};

pub static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// Records every request. Answers with the canned response when one is set,
/// otherwise echoes the body back as `{"data": body}`.
#[derive(Default)]
pub struct StubTransport {
    requests: StdMutex<Vec<ApiRequest>>,
    canned: Option<ApiResponse>,
    failure: Option<TransportError>,
}

impl StubTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn responding(status: u16, body: Value) -> Arc<Self> {
        Arc::new(Self {
            canned: Some(ApiResponse::new(status, body)),
            ..Self::default()
        })
    }

    pub fn failing(error: TransportError) -> Arc<Self> {
        Arc::new(Self {
            failure: Some(error),
            ..Self::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last(&self) -> ApiRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("at least one request")
    }
}

#[async_trait]
impl HttpTransport for StubTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let body = request.body.clone();
        self.requests.lock().unwrap().push(request);
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        if let Some(canned) = &self.canned {
            return Ok(canned.clone());
        }
        Ok(ApiResponse::new(200, json!({ "data": body })))
    }
}

pub fn settings(pairs: &[(&str, &str)]) -> Settings {
    let mut map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    map.entry("NEXTDNS_API_KEY".to_string())
        .or_insert_with(|| "test-key".to_string());
    Settings::from_lookup(|key| map.get(key).cloned()).expect("settings")
}

pub struct Harness {
    pub app: App,
    pub api: Arc<StubTransport>,
    pub resolver: Arc<StubTransport>,
}

pub fn harness(pairs: &[(&str, &str)]) -> Harness {
    harness_with(pairs, StubTransport::new())
}

pub fn harness_with(pairs: &[(&str, &str)], api: Arc<StubTransport>) -> Harness {
    let resolver = StubTransport::responding(200, json!({"Status": 0, "Answer": []}));
    let app = App::with_transports(&settings(pairs), api.clone(), resolver.clone())
        .expect("app wiring");
    Harness { app, api, resolver }
}

impl Harness {
    pub async fn call(&self, tool: &str, args: Value) -> (Value, bool) {
        let output = self
            .app
            .tool_executor
            .execute(tool, args)
            .await
            .expect("tool output");
        (output.payload, output.is_error)
    }
}
