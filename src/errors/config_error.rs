use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "NEXTDNS_API_KEY is required: set NEXTDNS_API_KEY or point NEXTDNS_API_KEY_FILE at a secret file"
    )]
    MissingApiKey,
    #[error("NEXTDNS_HTTP_TIMEOUT must be a positive number of seconds, got '{0}'")]
    InvalidTimeout(String),
    #[error("invalid port '{0}': expected an integer between 1 and 65535")]
    InvalidPort(String),
}
