use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use shardlink_core::cache::{namespaced_key, BucketCache, Result};
use shardlink_core::CacheError;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Redis-backed [`BucketCache`].
///
/// Entries are stored as plain strings under `bucket:key` and written with
/// `SET .. EX`, so Redis handles expiry.
#[derive(Debug, Clone)]
pub struct RedisCache {
    conn: MultiplexedConnection,
    ttl: Duration,
}

fn map_redis_error(operation: &str, err: redis::RedisError) -> CacheError {
    let message = format!("{operation}: {err}");
    if err.is_timeout() || message.to_ascii_lowercase().contains("timed out") {
        CacheError::Timeout(message)
    } else if err.is_connection_refusal() || err.is_connection_dropped() {
        CacheError::Unavailable(message)
    } else {
        CacheError::Operation(message)
    }
}

impl RedisCache {
    /// Wraps an open connection. Every write expires after `ttl`, rounded
    /// down to whole seconds with a floor of one.
    pub fn new(conn: MultiplexedConnection, ttl: Duration) -> Self {
        Self { conn, ttl }
    }

    /// Opens a connection to `url` and checks that the server answers.
    pub async fn connect(url: &str, ttl: Duration) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| CacheError::Initialization(format!("invalid redis url: {e}")))?;
        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| CacheError::Initialization(format!("failed to connect to redis: {e}")))?;

        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(|e| CacheError::Initialization(format!("redis did not answer PING: {e}")))?;

        debug!("connected to redis");
        Ok(Self::new(conn, ttl))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn ttl_seconds(&self) -> u64 {
        self.ttl.as_secs().max(1)
    }
}

#[async_trait]
impl BucketCache for RedisCache {
    async fn get(&self, bucket: &str, key: &str) -> Result<Option<String>> {
        let cache_key = namespaced_key(bucket, key);
        trace!(key = %cache_key, "fetching value from redis");

        let mut conn = self.conn.clone();
        match conn.get::<_, Option<String>>(&cache_key).await {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!(key = %cache_key, error = %e, "redis error on get");
                Err(map_redis_error("failed to fetch value from redis", e))
            }
        }
    }

    async fn set(&self, bucket: &str, key: &str, value: &str) -> Result<()> {
        let cache_key = namespaced_key(bucket, key);
        trace!(key = %cache_key, "storing value in redis");

        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(&cache_key, value, self.ttl_seconds())
            .await
            .map_err(|e| {
                warn!(key = %cache_key, error = %e, "redis error on set");
                map_redis_error("failed to write value to redis", e)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeouts_are_recognised() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        let err = map_redis_error("get", redis::RedisError::from(io));
        assert!(matches!(err, CacheError::Timeout(_)));
    }
}
