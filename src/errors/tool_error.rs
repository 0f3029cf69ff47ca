use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use super::{ConfigError, OpenApiError, TransportError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    InvalidParams,
    NotFound,
    Timeout,
    Retryable,
    Internal,
}

impl ToolErrorKind {
    pub fn default_code(self) -> &'static str {
        match self {
            ToolErrorKind::InvalidParams => "INVALID_PARAMS",
            ToolErrorKind::NotFound => "NOT_FOUND",
            ToolErrorKind::Timeout => "TIMEOUT",
            ToolErrorKind::Retryable => "RETRYABLE",
            ToolErrorKind::Internal => "INTERNAL",
        }
    }

    fn is_retryable(self) -> bool {
        matches!(self, ToolErrorKind::Timeout | ToolErrorKind::Retryable)
    }
}

/// A call that could not produce tool output at all. Failures the caller
/// should read as data (denials, bad list payloads, upstream errors) are
/// ordinary output instead.
#[derive(Debug, Clone, Serialize, Error)]
#[error("{message}")]
pub struct ToolError {
    pub kind: ToolErrorKind,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    pub retryable: bool,
}

impl ToolError {
    pub fn new(kind: ToolErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
            hint: None,
            details: None,
            retryable: kind.is_retryable(),
        }
    }

    fn of_kind(kind: ToolErrorKind, message: impl Into<String>) -> Self {
        Self::new(kind, kind.default_code(), message)
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::of_kind(ToolErrorKind::InvalidParams, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::of_kind(ToolErrorKind::NotFound, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::of_kind(ToolErrorKind::Timeout, message)
    }

    pub fn retryable(message: impl Into<String>) -> Self {
        Self::of_kind(ToolErrorKind::Retryable, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::of_kind(ToolErrorKind::Internal, message)
    }
}

impl From<std::io::Error> for ToolError {
    fn from(err: std::io::Error) -> Self {
        ToolError::internal(err.to_string())
    }
}

impl From<TransportError> for ToolError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout(message) => ToolError::timeout(message),
            TransportError::Http(message) => ToolError::retryable(message),
            TransportError::InvalidRequest(message) => ToolError::invalid_params(message),
        }
    }
}

impl From<OpenApiError> for ToolError {
    fn from(err: OpenApiError) -> Self {
        ToolError::new(ToolErrorKind::Internal, "OPENAPI", err.to_string())
            .with_hint("Check NEXTDNS_OPENAPI_PATH or unset it to use the bundled document")
    }
}

impl From<ConfigError> for ToolError {
    fn from(err: ConfigError) -> Self {
        ToolError::new(ToolErrorKind::Internal, "CONFIG", err.to_string())
    }
}
