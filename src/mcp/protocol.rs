use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{ErrorCode, McpError};

pub const JSONRPC_VERSION: &str = "2.0";

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

impl JsonRpcRequest {
    /// Notifications carry no id and never get a reply.
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, code: i32, message: String) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(JsonRpcError { code, message }),
        }
    }

    pub fn from_error(id: Value, error: McpError) -> Self {
        Self::failure(id, error.code.as_i32(), error.message)
    }

    pub fn to_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Decodes one frame. Malformed input yields the error response to send back.
pub fn decode_frame(raw: &str) -> Result<JsonRpcRequest, JsonRpcResponse> {
    let parsed: Value = serde_json::from_str(raw).map_err(|_| {
        JsonRpcResponse::failure(
            Value::Null,
            ErrorCode::ParseError.as_i32(),
            "Parse error".to_string(),
        )
    })?;
    let id = parsed.get("id").cloned().unwrap_or(Value::Null);
    serde_json::from_value(parsed).map_err(|_| {
        JsonRpcResponse::failure(
            id,
            ErrorCode::InvalidRequest.as_i32(),
            "Invalid request".to_string(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_rpc_request_allows_missing_id_for_notifications() {
        let raw = r#"{"jsonrpc":"2.0","method":"notifications/initialized","params":{}}"#;
        let parsed = decode_frame(raw).expect("must parse");
        assert!(parsed.is_notification());
        assert_eq!(parsed.method, "notifications/initialized");
    }

    #[test]
    fn malformed_frames_map_to_json_rpc_errors() {
        let parse = decode_frame("{not json").unwrap_err();
        assert_eq!(parse.error.map(|e| e.code), Some(-32700));

        let invalid = decode_frame(r#"{"jsonrpc":"2.0","id":7}"#).unwrap_err();
        assert_eq!(invalid.id, serde_json::json!(7));
        assert_eq!(invalid.error.map(|e| e.code), Some(-32600));
    }

    #[test]
    fn success_omits_error_field() {
        let line = JsonRpcResponse::success(serde_json::json!(1), serde_json::json!({})).to_line();
        assert_eq!(line, r#"{"jsonrpc":"2.0","id":1,"result":{}}"#);
    }
}
