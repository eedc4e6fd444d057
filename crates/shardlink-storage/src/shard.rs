use async_trait::async_trait;
use shardlink_core::repository::{AliasRecord, Result};
use shardlink_core::Alias;

/// Operations against one independent partition.
///
/// Handles are cheap to clone (a pool or an `Arc`); the router hands a clone
/// to every query it runs. Implementations must be safe to call from many
/// tasks at once.
#[async_trait]
pub trait ShardStore: Clone + Send + Sync + 'static {
    /// Inserts a row and returns it with the store-assigned timestamps.
    ///
    /// Returns `Err(Conflict)` if the alias is already present on this shard.
    async fn insert(&self, alias: &Alias, original_url: &str) -> Result<AliasRecord>;

    async fn find_by_alias(&self, alias: &Alias) -> Result<Option<AliasRecord>>;

    /// Returns the oldest row on this shard pointing at `original_url`.
    async fn find_by_original_url(&self, original_url: &str) -> Result<Option<AliasRecord>>;

    /// Brings the schema up to date. Must be safe to run again.
    async fn migrate(&self) -> Result<()>;

    /// Releases the underlying connections.
    async fn close(&self) -> Result<()>;
}
