use shardlink_core::cache::{BucketCache, Result};
use shardlink_core::CacheError;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Best-effort front for a [`BucketCache`].
///
/// Cache failures never reach the caller: a failed or slow `get` is a miss
/// and a failed `set` is dropped, both logged at `warn`.
#[derive(Debug)]
pub struct CacheAside<C> {
    cache: Arc<C>,
    timeout: Option<Duration>,
}

impl<C> Clone for CacheAside<C> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            timeout: self.timeout,
        }
    }
}

impl<C: BucketCache> CacheAside<C> {
    pub fn new(cache: C) -> Self {
        Self::from_shared(Arc::new(cache))
    }

    pub fn from_shared(cache: Arc<C>) -> Self {
        Self {
            cache,
            timeout: None,
        }
    }

    /// Bounds every cache call; an overrun counts as a failure.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn inner(&self) -> &C {
        &self.cache
    }

    pub async fn get(&self, bucket: &str, key: &str) -> Option<String> {
        match self.bounded(self.cache.get(bucket, key)).await {
            Ok(Some(value)) => {
                debug!(bucket, key, "cache hit");
                Some(value)
            }
            Ok(None) => {
                debug!(bucket, key, "cache miss");
                None
            }
            Err(err) => {
                warn!(bucket, key, error = %err, "cache read failed, treating as miss");
                None
            }
        }
    }

    pub async fn set(&self, bucket: &str, key: &str, value: &str) {
        if let Err(err) = self.bounded(self.cache.set(bucket, key, value)).await {
            warn!(bucket, key, error = %err, "cache write failed");
        }
    }

    /// Writes the entry on a separate task.
    ///
    /// The write runs to completion even if the caller is cancelled. The
    /// handle is only for tests and shutdown; nothing on the request path
    /// should await it.
    pub fn populate_detached(&self, bucket: &str, key: &str, value: &str) -> JoinHandle<()> {
        let this = self.clone();
        let (bucket, key, value) = (bucket.to_string(), key.to_string(), value.to_string());
        tokio::spawn(async move { this.set(&bucket, &key, &value).await })
    }

    async fn bounded<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        let Some(limit) = self.timeout else {
            return call.await;
        };
        match tokio::time::timeout(limit, call).await {
            Ok(outcome) => outcome,
            Err(_) => Err(CacheError::Timeout(format!(
                "no response within {}ms",
                limit.as_millis()
            ))),
        }
    }
}
