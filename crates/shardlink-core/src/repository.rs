use crate::alias::Alias;
use crate::error::StorageError;
use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Result type for record store operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// A stored alias → URL mapping.
///
/// Lives on exactly one shard, the one its alias hashes to. Timestamps are
/// assigned by the store on insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasRecord {
    pub alias: Alias,
    pub original_url: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Typed access to alias records.
#[async_trait]
pub trait AliasRepository: Send + Sync + 'static {
    /// Inserts a new record on the alias' owning shard.
    ///
    /// Returns `Err(Conflict)` if the alias already exists there.
    async fn create(&self, alias: &Alias, original_url: &str) -> Result<AliasRecord>;

    /// Point lookup by alias. A missing row is `Ok(None)`.
    async fn find_by_alias(&self, alias: &Alias) -> Result<Option<AliasRecord>>;

    /// Looks for any record pointing at `original_url`.
    ///
    /// The URL is not the routing key, so implementations may have to ask
    /// every shard.
    async fn find_by_original_url(&self, original_url: &str) -> Result<Option<AliasRecord>>;
}
