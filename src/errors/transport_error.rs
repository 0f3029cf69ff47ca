use thiserror::Error;

/// Failure to complete an outbound call. A non-2xx status is not an error at
/// this layer; it comes back as an ordinary response.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("{0}")]
    Http(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return TransportError::Timeout(err.to_string());
        }
        if err.is_builder() {
            return TransportError::InvalidRequest(err.to_string());
        }
        TransportError::Http(err.to_string())
    }
}
