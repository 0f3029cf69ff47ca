use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OpenApiError {
    #[error("failed to read OpenAPI document {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid OpenAPI document: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("OpenAPI document has no 'paths' object")]
    MissingPaths,
    #[error("unresolvable reference '{0}'")]
    UnresolvedRef(String),
    #[error("duplicate tool name '{0}'")]
    DuplicateTool(String),
    #[error("invalid route pattern: {0}")]
    Pattern(#[from] regex::Error),
}
