pub mod document;
pub mod generator;
pub mod routes;

pub use document::OpenApiDocument;
pub use generator::{generate_tools, OpenApiTool, Operation, RequestBody};
pub use routes::{default_exclusions, ExcludedRoute};
