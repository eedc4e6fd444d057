use async_trait::async_trait;
use moka::future::Cache;
use shardlink_core::cache::{namespaced_key, BucketCache, Result};
use std::time::Duration;

/// In-process [`BucketCache`] with a per-entry time to live.
///
/// Useful for single-node deployments and tests; entries are not shared
/// between processes.
#[derive(Debug, Clone)]
pub struct MokaCache {
    cache: Cache<String, String>,
}

impl MokaCache {
    pub fn with_ttl(max_capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();
        Self { cache }
    }
}

#[async_trait]
impl BucketCache for MokaCache {
    async fn get(&self, bucket: &str, key: &str) -> Result<Option<String>> {
        Ok(self.cache.get(&namespaced_key(bucket, key)).await)
    }

    async fn set(&self, bucket: &str, key: &str, value: &str) -> Result<()> {
        self.cache
            .insert(namespaced_key(bucket, key), value.to_string())
            .await;
        Ok(())
    }
}
