mod config_error;
mod mcp_error;
mod openapi_error;
mod tool_error;
mod transport_error;

pub use config_error::ConfigError;
pub use mcp_error::{ErrorCode, McpError};
pub use openapi_error::OpenApiError;
pub use tool_error::{ToolError, ToolErrorKind};
pub use transport_error::TransportError;
