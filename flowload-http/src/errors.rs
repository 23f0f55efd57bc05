//! HTTP error types

/// Error type for HTTP operations
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Authentication failed with status {status}")]
    AuthenticationFailed { status: u16 },

    #[error("Response is missing expected field '{0}'")]
    MissingField(&'static str),
}
