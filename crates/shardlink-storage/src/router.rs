use crate::error::CloseError;
use crate::shard::ShardStore;
use futures::stream::{self, StreamExt};
use shardlink_core::hash::fnv1a_64;
use shardlink_core::repository::Result;
use shardlink_core::StorageError;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, trace, warn};
use typed_builder::TypedBuilder;

#[derive(Debug, Clone, TypedBuilder)]
pub struct RouterConfig {
    /// Upper bound on shard queries in flight during a fan-out.
    #[builder(default = 4)]
    pub fan_out_concurrency: usize,
    /// Deadline for every individual routed or fanned-out shard call.
    #[builder(default, setter(strip_option))]
    pub shard_timeout: Option<Duration>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// One partition together with its position in the shard list.
#[derive(Debug, Clone)]
pub struct Shard<S> {
    index: usize,
    name: String,
    store: S,
}

impl<S> Shard<S> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

/// Maps keys onto a fixed, ordered list of shards and runs queries against
/// them.
///
/// A key always lands on `fnv1a_64(key) % N`. The list is fixed at
/// construction; changing it moves most keys to a different shard and is not
/// supported on a populated deployment.
#[derive(Debug)]
pub struct ShardRouter<S> {
    shards: Vec<Shard<S>>,
    by_name: HashMap<String, usize>,
    config: RouterConfig,
}

impl<S: ShardStore> ShardRouter<S> {
    /// Builds a router over `shards` in the given order.
    ///
    /// Fails with `Configuration` if the list is empty, a name repeats, or
    /// the fan-out concurrency is zero.
    pub fn new(
        shards: impl IntoIterator<Item = (String, S)>,
        config: RouterConfig,
    ) -> Result<Self> {
        if config.fan_out_concurrency == 0 {
            return Err(StorageError::Configuration(
                "fan-out concurrency must be at least 1".to_string(),
            ));
        }

        let mut by_name = HashMap::new();
        let mut list = Vec::new();
        for (index, (name, store)) in shards.into_iter().enumerate() {
            if by_name.insert(name.clone(), index).is_some() {
                return Err(StorageError::Configuration(format!(
                    "duplicate shard name '{name}'"
                )));
            }
            list.push(Shard { index, name, store });
        }

        if list.is_empty() {
            return Err(StorageError::Configuration(
                "at least one shard is required".to_string(),
            ));
        }

        debug!(shards = list.len(), "shard router ready");
        Ok(Self {
            shards: list,
            by_name,
            config,
        })
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    pub fn shards(&self) -> &[Shard<S>] {
        &self.shards
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn shard_by_name(&self, name: &str) -> Option<&Shard<S>> {
        self.by_name.get(name).map(|&index| &self.shards[index])
    }

    /// Position of the shard responsible for `key`.
    pub fn shard_index(&self, key: &str) -> Result<usize> {
        if key.is_empty() {
            return Err(StorageError::InvalidKey(
                "routing key must not be empty".to_string(),
            ));
        }
        Ok((fnv1a_64(key) % self.shards.len() as u64) as usize)
    }

    pub fn route_by_key(&self, key: &str) -> Result<&Shard<S>> {
        let index = self.shard_index(key)?;
        Ok(&self.shards[index])
    }

    /// Runs `query` against the shard that owns `key`.
    pub async fn execute<T, F, Fut>(&self, key: &str, query: F) -> Result<T>
    where
        F: FnOnce(S) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let shard = self.route_by_key(key)?;
        trace!(key, shard = %shard.name, "routing query");
        self.bounded(shard, query(shard.store.clone())).await
    }

    /// Asks every shard and returns the first non-empty answer in shard
    /// order.
    ///
    /// Up to `fan_out_concurrency` shards are queried at once, but answers
    /// are consumed in list order, so the result is the same as asking the
    /// shards one by one. Any error aborts the whole call; queries still in
    /// flight are dropped.
    pub async fn scatter_gather<T, F, Fut>(&self, query: F) -> Result<Option<T>>
    where
        F: Fn(S) -> Fut,
        Fut: Future<Output = Result<Option<T>>>,
    {
        let pending: Vec<_> = self
            .shards
            .iter()
            .map(|shard| {
                let call = self.bounded(shard, query(shard.store.clone()));
                async move { (shard, call.await) }
            })
            .collect();

        let mut answers = stream::iter(pending).buffered(self.config.fan_out_concurrency);
        while let Some((shard, answer)) = answers.next().await {
            match answer {
                Ok(Some(found)) => {
                    trace!(shard = %shard.name, "fan-out hit");
                    return Ok(Some(found));
                }
                Ok(None) => continue,
                Err(err) => {
                    warn!(shard = %shard.name, error = %err, "fan-out aborted");
                    return Err(err);
                }
            }
        }

        Ok(None)
    }

    /// Applies `action` to every shard in order, stopping at the first
    /// failure.
    ///
    /// Intended for administrative work such as migrations, so the per-call
    /// deadline is not applied.
    pub async fn for_each_shard<F, Fut>(&self, mut action: F) -> Result<()>
    where
        F: FnMut(S) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        for shard in &self.shards {
            if let Err(err) = action(shard.store.clone()).await {
                let err = err.on_shard(&shard.name);
                warn!(shard = %shard.name, error = %err, "per-shard action failed");
                return Err(err);
            }
            debug!(shard = %shard.name, "per-shard action completed");
        }
        Ok(())
    }

    /// Closes every shard, carrying on past failures.
    pub async fn close_all(&self) -> std::result::Result<(), CloseError> {
        let mut failures = Vec::new();
        for shard in &self.shards {
            match shard.store.close().await {
                Ok(()) => debug!(shard = %shard.name, "shard closed"),
                Err(err) => {
                    warn!(shard = %shard.name, error = %err, "failed to close shard");
                    failures.push((shard.name.clone(), err));
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(CloseError { failures })
        }
    }

    async fn bounded<T>(
        &self,
        shard: &Shard<S>,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        let outcome = match self.config.shard_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(outcome) => outcome,
                Err(_) => Err(StorageError::Timeout(format!(
                    "no response within {}ms",
                    limit.as_millis()
                ))),
            },
            None => call.await,
        };
        outcome.map_err(|err| err.on_shard(&shard.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryShard;
    use shardlink_core::Alias;
    use shardlink_generator::{Generator, RandomGenerator};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn shards(count: usize) -> Vec<(String, MemoryShard)> {
        (0..count)
            .map(|i| (format!("shard_{i}"), MemoryShard::new()))
            .collect()
    }

    fn router(count: usize) -> ShardRouter<MemoryShard> {
        ShardRouter::new(shards(count), RouterConfig::default()).unwrap()
    }

    fn alias(value: &str) -> Alias {
        Alias::new_unchecked(value)
    }

    #[test]
    fn rejects_empty_shard_list() {
        let err = ShardRouter::<MemoryShard>::new(Vec::new(), RouterConfig::default()).unwrap_err();
        assert!(matches!(err, StorageError::Configuration(_)));
    }

    #[test]
    fn rejects_duplicate_names() {
        let list = vec![
            ("a".to_string(), MemoryShard::new()),
            ("a".to_string(), MemoryShard::new()),
        ];
        let err = ShardRouter::new(list, RouterConfig::default()).unwrap_err();
        assert!(matches!(err, StorageError::Configuration(_)));
    }

    #[test]
    fn rejects_zero_concurrency() {
        let config = RouterConfig::builder().fan_out_concurrency(0).build();
        let err = ShardRouter::new(shards(2), config).unwrap_err();
        assert!(matches!(err, StorageError::Configuration(_)));
    }

    #[test]
    fn routes_by_fnv1a_modulo() {
        let router = router(3);

        assert_eq!(router.shard_index("abc").unwrap(), 0);
        assert_eq!(router.route_by_key("abc").unwrap().name(), "shard_0");
        assert_eq!(
            router.shard_index("aBcDeFg1").unwrap(),
            (fnv1a_64("aBcDeFg1") % 3) as usize
        );
    }

    #[test]
    fn routing_is_deterministic() {
        let router = router(5);
        let generator = RandomGenerator::new();

        for _ in 0..100 {
            let key = generator.generate(8);
            let first = router.shard_index(key.as_str()).unwrap();
            for _ in 0..10 {
                assert_eq!(router.shard_index(key.as_str()).unwrap(), first);
            }
        }
    }

    #[test]
    fn single_shard_takes_everything() {
        let router = router(1);
        assert_eq!(router.shard_index("anything").unwrap(), 0);
        assert_eq!(router.shard_index("x").unwrap(), 0);
    }

    #[test]
    fn empty_key_is_rejected() {
        let router = router(3);
        assert!(matches!(
            router.route_by_key(""),
            Err(StorageError::InvalidKey(_))
        ));
    }

    #[test]
    fn random_aliases_spread_evenly() {
        let router = router(4);
        let generator = RandomGenerator::new();
        let mut counts = [0usize; 4];

        for _ in 0..60_000 {
            let key = generator.generate(8);
            counts[router.shard_index(key.as_str()).unwrap()] += 1;
        }

        for count in counts {
            assert!((13_500..=16_500).contains(&count), "skewed: {counts:?}");
        }
    }

    #[test]
    fn shard_by_name_finds_configured_shards() {
        let router = router(3);
        assert_eq!(router.shard_by_name("shard_2").unwrap().index(), 2);
        assert!(router.shard_by_name("shard_9").is_none());
    }

    #[tokio::test]
    async fn execute_runs_on_the_owning_shard() {
        let router = router(3);
        let code = alias("aBcDeFg1");

        router
            .execute(code.as_str(), |shard| {
                let code = code.clone();
                async move { shard.insert(&code, "https://example.com").await }
            })
            .await
            .unwrap();

        let owner = router.route_by_key(code.as_str()).unwrap().index();
        for shard in router.shards() {
            let expected = usize::from(shard.index() == owner);
            assert_eq!(shard.store().len(), expected);
        }
    }

    #[tokio::test]
    async fn scatter_gather_finds_a_record_on_any_shard() {
        let router = router(3);
        router.shards()[2]
            .store()
            .insert(&alias("zzz"), "https://example.com/x")
            .await
            .unwrap();

        let found = router
            .scatter_gather(|shard| async move {
                shard.find_by_original_url("https://example.com/x").await
            })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(found.alias, alias("zzz"));
    }

    #[tokio::test]
    async fn scatter_gather_prefers_the_lowest_shard() {
        let router = router(3);
        for (i, shard) in router.shards().iter().enumerate().skip(1) {
            shard
                .store()
                .insert(&alias(&format!("dup{i}")), "https://example.com/d")
                .await
                .unwrap();
        }
        // The lower shard answers slower but still wins.
        router.shards()[1]
            .store()
            .set_latency(Duration::from_millis(30));

        let found = router
            .scatter_gather(|shard| async move {
                shard.find_by_original_url("https://example.com/d").await
            })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(found.alias, alias("dup1"));
    }

    #[tokio::test]
    async fn scatter_gather_returns_none_when_every_shard_misses() {
        let router = router(4);
        let found = router
            .scatter_gather(|shard| async move { shard.find_by_original_url("https://nowhere").await })
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn scatter_gather_fails_when_a_shard_is_down() {
        let router = router(3);
        router.shards()[2]
            .store()
            .insert(&alias("abc"), "https://example.com")
            .await
            .unwrap();
        router.shards()[1].store().set_available(false);

        let err = router
            .scatter_gather(|shard| async move { shard.find_by_original_url("https://example.com").await })
            .await
            .unwrap_err();

        assert!(err.is_unavailable());
        assert!(err.to_string().contains("shard_1"));
    }

    #[tokio::test]
    async fn scatter_gather_bounds_concurrency() {
        let config = RouterConfig::builder().fan_out_concurrency(2).build();
        let router = ShardRouter::new(shards(6), config).unwrap();
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let found: Option<()> = router
            .scatter_gather(|_shard| {
                let in_flight = in_flight.clone();
                let peak = peak.clone();
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok(None)
                }
            })
            .await
            .unwrap();

        assert!(found.is_none());
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn slow_shard_surfaces_as_timeout() {
        let config = RouterConfig::builder()
            .shard_timeout(Duration::from_millis(20))
            .build();
        let router = ShardRouter::new(shards(2), config).unwrap();
        router.shards()[0]
            .store()
            .set_latency(Duration::from_millis(500));

        let err = router
            .scatter_gather(|shard| async move { shard.find_by_original_url("https://example.com").await })
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::Timeout(_)));
    }

    #[tokio::test]
    async fn for_each_shard_visits_in_order() {
        let router = router(3);
        let mut visited = Vec::new();

        router
            .for_each_shard(|shard| {
                visited.push(shard.clone());
                async move { shard.migrate().await }
            })
            .await
            .unwrap();

        assert_eq!(visited.len(), 3);
        for (shard, seen) in router.shards().iter().zip(&visited) {
            assert!(shard.store().same_shard(seen));
        }
    }

    #[tokio::test]
    async fn for_each_shard_stops_at_first_failure() {
        let router = router(3);
        router.shards()[1].store().set_available(false);
        let calls = AtomicUsize::new(0);

        let err = router
            .for_each_shard(|shard| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move { shard.migrate().await }
            })
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(err.to_string().contains("shard_1"));
    }

    #[tokio::test]
    async fn close_all_continues_past_failures() {
        let router = router(3);
        router.shards()[0].store().fail_on_close(true);
        router.shards()[2].store().fail_on_close(true);

        let err = router.close_all().await.unwrap_err();

        let failed: Vec<&str> = err.failures.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(failed, vec!["shard_0", "shard_2"]);
        for shard in router.shards() {
            assert!(shard.store().is_closed());
        }
    }

    #[tokio::test]
    async fn close_all_succeeds_when_every_shard_closes() {
        let router = router(2);
        router.close_all().await.unwrap();
        assert!(router.shards().iter().all(|s| s.store().is_closed()));
    }
}
