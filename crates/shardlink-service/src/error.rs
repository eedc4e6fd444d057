use shardlink_core::StorageError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("invalid service configuration: {0}")]
    InvalidConfig(String),
    #[error("no free alias found after {attempts} attempts")]
    ExhaustedRetries { attempts: u32 },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ServiceError {
    /// Whether a shard could not be reached, as opposed to a logic failure.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Storage(err) if err.is_unavailable())
    }
}
