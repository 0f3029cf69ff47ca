use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};

use crate::constants::server;
use crate::errors::{ErrorCode, McpError, ToolError};
use crate::mcp::protocol::{decode_frame, JsonRpcRequest, JsonRpcResponse};
use crate::services::logger::Logger;
use crate::services::tool_executor::{ToolExecutor, ToolOutput};

pub struct McpServer {
    executor: Arc<ToolExecutor>,
    logger: Logger,
}

impl McpServer {
    pub fn new(executor: Arc<ToolExecutor>, logger: Logger) -> Self {
        Self {
            executor,
            logger: logger.child("mcp"),
        }
    }

    fn handle_initialize(&self) -> Value {
        json!({
            "protocolVersion": server::PROTOCOL_VERSION,
            "capabilities": {"tools": {"listChanged": false}},
            "serverInfo": {"name": server::NAME, "version": server::VERSION},
        })
    }

    fn handle_tools_list(&self) -> Value {
        json!({ "tools": self.executor.registry().definitions() })
    }

    async fn handle_tools_call(&self, params: &Value) -> Result<Value, McpError> {
        let name = params.get("name").and_then(Value::as_str).unwrap_or("");
        if name.is_empty() {
            return Err(McpError::new(ErrorCode::InvalidParams, "Missing tool name"));
        }
        let args = params.get("arguments").cloned().unwrap_or(Value::Null);
        let output = self
            .executor
            .execute(name, args)
            .await
            .map_err(|err| self.tool_failure(name, &err))?;
        Ok(render_tool_output(&output))
    }

    fn tool_failure(&self, tool: &str, error: &ToolError) -> McpError {
        self.logger.warn(
            &format!("Tool {} failed: {}", tool, error.message),
            error.details.as_ref(),
        );
        McpError::from_tool_error(tool, error)
    }

    /// Dispatches one request; `None` means nothing is sent back.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        match request.method.as_str() {
            "notifications/initialized" => request
                .id
                .map(|id| JsonRpcResponse::success(id, json!({}))),
            method if method.starts_with("notifications/") && request.is_notification() => None,
            "initialize" => request
                .id
                .map(|id| JsonRpcResponse::success(id, self.handle_initialize())),
            "ping" => request.id.map(|id| JsonRpcResponse::success(id, json!({}))),
            "tools/list" => request
                .id
                .map(|id| JsonRpcResponse::success(id, self.handle_tools_list())),
            "tools/call" => {
                let id = request.id?;
                Some(match self.handle_tools_call(&request.params).await {
                    Ok(result) => JsonRpcResponse::success(id, result),
                    Err(err) => JsonRpcResponse::from_error(id, err),
                })
            }
            _ => request.id.map(|id| {
                JsonRpcResponse::failure(
                    id,
                    ErrorCode::MethodNotFound.as_i32(),
                    "Method not found".to_string(),
                )
            }),
        }
    }

    pub async fn handle_frame(&self, raw: &str) -> Option<JsonRpcResponse> {
        match decode_frame(raw) {
            Ok(request) => self.handle_request(request).await,
            Err(response) => Some(response),
        }
    }

    /// Line-delimited JSON-RPC over any reader/writer pair.
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> Result<(), ToolError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        let mut writer = BufWriter::new(writer);

        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|err| ToolError::internal(err.to_string()))?
        {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if let Some(response) = self.handle_frame(trimmed).await {
                writer.write_all(response.to_line().as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }
        Ok(())
    }

    pub async fn run_stdio(&self) -> Result<(), ToolError> {
        self.logger.info("Transport: stdio", None);
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }
}

pub fn render_tool_output(output: &ToolOutput) -> Value {
    let text = serde_json::to_string(&output.payload).unwrap_or_else(|_| "null".to_string());
    json!({
        "content": [ { "type": "text", "text": text } ],
        "isError": output.is_error,
    })
}
