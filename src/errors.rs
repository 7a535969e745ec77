//! Error types for the expiring pool

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum PoolError {
    #[error("Operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Invalid pool configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Failed to spawn reclaimer thread: {0}")]
    ReclaimerSpawn(String),
}

pub type PoolResult<T> = Result<T, PoolError>;
