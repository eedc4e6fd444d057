use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("invalid alias: {0}")]
    InvalidAlias(String),
}

/// Failures talking to the cache. Always recoverable: callers treat any of
/// these as a miss.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache operation timed out: {0}")]
    Timeout(String),
    #[error("cache initialization failed: {0}")]
    Initialization(String),
    #[error("cache operation failed: {0}")]
    Operation(String),
}

/// Failures raised by the shard router and the record store.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("invalid routing key: {0}")]
    InvalidKey(String),
    #[error("alias already exists: {0}")]
    Conflict(String),
    #[error("shard unavailable: {0}")]
    Unavailable(String),
    #[error("shard operation timed out: {0}")]
    Timeout(String),
    #[error("shard query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error("invalid shard configuration: {0}")]
    Configuration(String),
}

impl StorageError {
    /// Whether the failure means a shard could not be reached in time.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout(_))
    }

    /// Prefixes the message with the shard it came from, keeping the variant.
    pub fn on_shard(self, shard: &str) -> Self {
        let tag = |message: String| format!("shard '{shard}': {message}");
        match self {
            Self::InvalidKey(m) => Self::InvalidKey(tag(m)),
            Self::Conflict(m) => Self::Conflict(tag(m)),
            Self::Unavailable(m) => Self::Unavailable(tag(m)),
            Self::Timeout(m) => Self::Timeout(tag(m)),
            Self::Query(m) => Self::Query(tag(m)),
            Self::InvalidData(m) => Self::InvalidData(tag(m)),
            Self::Configuration(m) => Self::Configuration(tag(m)),
        }
    }
}

impl From<CoreError> for StorageError {
    fn from(value: CoreError) -> Self {
        match value {
            CoreError::InvalidAlias(message) => Self::InvalidKey(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn on_shard_keeps_variant() {
        let err = StorageError::Unavailable("connection refused".to_string()).on_shard("shard_1");
        assert!(err.is_unavailable());
        assert_eq!(
            err.to_string(),
            "shard unavailable: shard 'shard_1': connection refused"
        );
    }

    #[test]
    fn timeouts_count_as_unavailable() {
        assert!(StorageError::Timeout("slow".to_string()).is_unavailable());
        assert!(!StorageError::Query("syntax".to_string()).is_unavailable());
        assert!(!StorageError::Conflict("abc".to_string()).is_unavailable());
    }

    #[test]
    fn invalid_alias_becomes_invalid_key() {
        let err: StorageError = CoreError::InvalidAlias("empty".to_string()).into();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }
}
