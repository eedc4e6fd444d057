use crate::router::ShardRouter;
use crate::shard::ShardStore;
use async_trait::async_trait;
use shardlink_core::repository::{AliasRecord, AliasRepository, Result};
use shardlink_core::Alias;
use std::sync::Arc;
use tracing::trace;

/// Record store that partitions rows by alias.
///
/// Creates and alias lookups touch exactly the owning shard; lookups by
/// original URL fan out to all of them.
#[derive(Debug)]
pub struct ShardedRepository<S> {
    router: Arc<ShardRouter<S>>,
}

impl<S> Clone for ShardedRepository<S> {
    fn clone(&self) -> Self {
        Self {
            router: Arc::clone(&self.router),
        }
    }
}

impl<S: ShardStore> ShardedRepository<S> {
    pub fn new(router: Arc<ShardRouter<S>>) -> Self {
        Self { router }
    }

    pub fn router(&self) -> &Arc<ShardRouter<S>> {
        &self.router
    }
}

#[async_trait]
impl<S: ShardStore> AliasRepository for ShardedRepository<S> {
    async fn create(&self, alias: &Alias, original_url: &str) -> Result<AliasRecord> {
        trace!(alias = %alias, "creating alias record");
        self.router
            .execute(alias.as_str(), |shard| async move {
                shard.insert(alias, original_url).await
            })
            .await
    }

    async fn find_by_alias(&self, alias: &Alias) -> Result<Option<AliasRecord>> {
        self.router
            .execute(alias.as_str(), |shard| async move {
                shard.find_by_alias(alias).await
            })
            .await
    }

    async fn find_by_original_url(&self, original_url: &str) -> Result<Option<AliasRecord>> {
        self.router
            .scatter_gather(|shard| async move { shard.find_by_original_url(original_url).await })
            .await
    }
}
