use crate::error::CacheError;
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, CacheError>;

/// A key-value cache partitioned into named buckets.
///
/// The same key set in two different buckets names two different entries.
/// Every entry expires after the fixed TTL the implementation was built with;
/// a miss and an expired entry look the same to the caller.
#[async_trait]
pub trait BucketCache: Send + Sync + 'static {
    /// Returns `Ok(None)` if the key was never set or has expired.
    async fn get(&self, bucket: &str, key: &str) -> Result<Option<String>>;

    /// Overwrites the entry and restarts its expiry window.
    async fn set(&self, bucket: &str, key: &str, value: &str) -> Result<()>;
}

/// The flat key a `(bucket, key)` pair is stored under.
pub fn namespaced_key(bucket: &str, key: &str) -> String {
    format!("{bucket}:{key}")
}
