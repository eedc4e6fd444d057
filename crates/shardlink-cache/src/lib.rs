//! Bucketed caches and the cache-aside wrapper the resolve path uses.

pub mod aside;
pub mod moka;
pub mod redis;

pub use self::aside::CacheAside;
pub use self::moka::MokaCache;
pub use self::redis::RedisCache;
pub use shardlink_core::cache::{namespaced_key, BucketCache, Result};
pub use shardlink_core::CacheError;
