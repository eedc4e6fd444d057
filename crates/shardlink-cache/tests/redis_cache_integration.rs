//! Runs against a disposable Redis container. Needs a docker daemon, so the
//! container tests are ignored by default:
//! `cargo test -p shardlink-cache --test redis_cache_integration -- --ignored`

use std::time::Duration;

use redis::AsyncCommands;
use shardlink_cache::{BucketCache, CacheAside, CacheError, RedisCache};
use shardlink_test_infra::redis::RedisServer;

struct Fixture {
    redis: RedisServer,
    url: String,
}

impl Fixture {
    async fn start() -> Self {
        let redis = RedisServer::new().await.expect("start redis");
        let url = redis.url().await.expect("redis url");
        Self { redis, url }
    }

    async fn cache(&self, ttl: Duration) -> RedisCache {
        RedisCache::connect(&self.url, ttl).await.expect("connect redis")
    }
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn set_then_get() {
    let fixture = Fixture::start().await;
    let cache = fixture.cache(Duration::from_secs(20)).await;

    assert!(cache.get("aliases", "aBcDeFg1").await.unwrap().is_none());
    cache
        .set("aliases", "aBcDeFg1", "https://example.com")
        .await
        .unwrap();

    assert_eq!(
        cache.get("aliases", "aBcDeFg1").await.unwrap().as_deref(),
        Some("https://example.com")
    );
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn writes_a_namespaced_key_with_an_expiry() {
    let fixture = Fixture::start().await;
    let cache = fixture.cache(Duration::from_secs(20)).await;

    cache
        .set("aliases", "aBcDeFg1", "https://example.com")
        .await
        .unwrap();

    let mut conn = fixture.redis.connection().await.expect("raw connection");
    let raw: Option<String> = conn.get("aliases:aBcDeFg1").await.unwrap();
    let ttl: i64 = conn.ttl("aliases:aBcDeFg1").await.unwrap();
    assert_eq!(raw.as_deref(), Some("https://example.com"));
    assert!((1..=20).contains(&ttl), "ttl {ttl}");
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn buckets_do_not_collide() {
    let fixture = Fixture::start().await;
    let cache = fixture.cache(Duration::from_secs(20)).await;

    cache.set("foo", "k", "one").await.unwrap();
    cache.set("bar", "k", "two").await.unwrap();

    assert_eq!(cache.get("foo", "k").await.unwrap().as_deref(), Some("one"));
    assert_eq!(cache.get("bar", "k").await.unwrap().as_deref(), Some("two"));
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires a docker daemon"]
async fn entries_expire() {
    let fixture = Fixture::start().await;
    let cache = fixture.cache(Duration::from_secs(1)).await;

    cache.set("aliases", "short", "v").await.unwrap();
    assert!(cache.get("aliases", "short").await.unwrap().is_some());

    awaitility::at_most(Duration::from_secs(5))
        .poll_interval(Duration::from_millis(100))
        .until_async(|| async { cache.get("aliases", "short").await.unwrap().is_none() })
        .await;
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires a docker daemon"]
async fn detached_population_reaches_redis() {
    let fixture = Fixture::start().await;
    let aside = CacheAside::new(fixture.cache(Duration::from_secs(20)).await);

    let _ = aside.populate_detached("aliases", "warm", "https://example.com/warm");

    awaitility::at_most(Duration::from_secs(5))
        .poll_interval(Duration::from_millis(50))
        .until_async(|| async { aside.get("aliases", "warm").await.is_some() })
        .await;
}

#[tokio::test]
async fn connect_fails_without_a_server() {
    let err = RedisCache::connect("redis://127.0.0.1:1", Duration::from_secs(20))
        .await
        .unwrap_err();

    assert!(matches!(err, CacheError::Initialization(_)));
}
