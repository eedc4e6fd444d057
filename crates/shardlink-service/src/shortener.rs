use crate::ServiceError;
use async_trait::async_trait;
use shardlink_core::AliasRecord;

/// Result of a create request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOutcome {
    pub record: AliasRecord,
    /// `false` when the URL already had an alias and that one was returned.
    pub created: bool,
}

#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Returns the alias for `original_url`, minting one if none exists yet.
    async fn shorten(&self, original_url: &str) -> Result<CreateOutcome, ServiceError>;

    /// Looks up the URL behind `alias`.
    ///
    /// `Ok(None)` covers both an unknown alias and one that is not
    /// well-formed.
    async fn resolve(&self, alias: &str) -> Result<Option<String>, ServiceError>;
}
