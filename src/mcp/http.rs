use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::constants::network;
use crate::errors::ToolError;
use crate::mcp::server::McpServer;

pub fn router(server: Arc<McpServer>) -> Router {
    Router::new()
        .route(network::MCP_HTTP_PATH, post(handle_post))
        .with_state(server)
}

/// One JSON-RPC message per POST. Notifications are accepted without a body.
pub async fn handle_post(State(server): State<Arc<McpServer>>, body: String) -> Response {
    match server.handle_frame(body.trim()).await {
        Some(response) => (StatusCode::OK, Json(response)).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

pub async fn serve(server: Arc<McpServer>, host: &str, port: u16) -> Result<(), ToolError> {
    let listener = TcpListener::bind((host, port)).await.map_err(|err| {
        ToolError::internal(format!("Failed to bind {}:{}: {}", host, port, err))
    })?;
    tracing::info!(
        host,
        port,
        path = network::MCP_HTTP_PATH,
        "Transport: http"
    );
    axum::serve(listener, router(server))
        .await
        .map_err(|err| ToolError::internal(format!("HTTP server failed: {}", err)))
}
