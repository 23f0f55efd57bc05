//! Engine error types

use flowload_config::ConfigError;
use flowload_http::HttpError;
use flowload_metrics::ThresholdError;
use thiserror::Error;

/// Errors that abort a run before or during execution
///
/// Everything here is fatal by design: contract violations, workflow step
/// failures and poll timeouts are recorded as metrics instead and never
/// surface as errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Authentication failed during setup; the one unrecoverable runtime error
    #[error("Authentication failed: {0}")]
    Auth(#[source] HttpError),

    /// Invalid configuration surfaced before any traffic is generated
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Malformed threshold expression
    #[error(transparent)]
    Threshold(#[from] ThresholdError),

    /// Weighted dispatcher configured with zero total weight
    #[error(transparent)]
    Dispatch(#[from] crate::dispatch::ZeroWeightError),

    /// HTTP client could not be constructed
    #[error("HTTP client setup failed: {0}")]
    ClientSetup(#[source] HttpError),
}
