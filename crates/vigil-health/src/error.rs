//! Probe pipeline error types.

use thiserror::Error;

/// Errors that can occur while setting up or feeding the probe pipeline.
///
/// Individual probe failures are not errors; they are recorded on the target.
#[derive(Debug, Error)]
pub enum HealthError {
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("worker pool is shut down")]
    PoolClosed,
}

pub type HealthResult<T> = Result<T, HealthError>;
