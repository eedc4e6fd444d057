use crate::shard::ShardStore;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use jiff::Timestamp;
use shardlink_core::repository::{AliasRecord, Result};
use shardlink_core::{Alias, StorageError};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// In-process shard backed by a concurrent map.
///
/// Clones share the same rows. The fault switches (`set_available`,
/// `set_latency`, `fail_on_close`) let tests stand in for a misbehaving
/// database.
#[derive(Debug, Clone, Default)]
pub struct MemoryShard {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    rows: DashMap<String, AliasRecord>,
    offline: AtomicBool,
    closed: AtomicBool,
    fail_close: AtomicBool,
    latency_micros: AtomicU64,
}

impl MemoryShard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently stored.
    pub fn len(&self) -> usize {
        self.inner.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.rows.is_empty()
    }

    /// When `false`, every call fails with `Unavailable`.
    pub fn set_available(&self, available: bool) {
        self.inner.offline.store(!available, Ordering::SeqCst);
    }

    /// Delays every call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        let micros = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        self.inner.latency_micros.store(micros, Ordering::SeqCst);
    }

    pub fn fail_on_close(&self, fail: bool) {
        self.inner.fail_close.store(fail, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Whether both handles point at the same rows.
    pub fn same_shard(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    async fn enter(&self) -> Result<()> {
        let micros = self.inner.latency_micros.load(Ordering::SeqCst);
        if micros > 0 {
            tokio::time::sleep(Duration::from_micros(micros)).await;
        }
        if self.inner.offline.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("connection refused".to_string()));
        }
        if self.is_closed() {
            return Err(StorageError::Unavailable("shard is closed".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ShardStore for MemoryShard {
    async fn insert(&self, alias: &Alias, original_url: &str) -> Result<AliasRecord> {
        self.enter().await?;

        match self.inner.rows.entry(alias.to_string()) {
            Entry::Occupied(_) => Err(StorageError::Conflict(alias.to_string())),
            Entry::Vacant(slot) => {
                let now = Timestamp::now();
                let record = AliasRecord {
                    alias: alias.clone(),
                    original_url: original_url.to_string(),
                    created_at: now,
                    updated_at: now,
                };
                slot.insert(record.clone());
                Ok(record)
            }
        }
    }

    async fn find_by_alias(&self, alias: &Alias) -> Result<Option<AliasRecord>> {
        self.enter().await?;
        Ok(self
            .inner
            .rows
            .get(alias.as_str())
            .map(|row| row.value().clone()))
    }

    async fn find_by_original_url(&self, original_url: &str) -> Result<Option<AliasRecord>> {
        self.enter().await?;
        Ok(self
            .inner
            .rows
            .iter()
            .filter(|row| row.original_url == original_url)
            .map(|row| row.value().clone())
            .min_by(|a, b| {
                a.created_at
                    .cmp(&b.created_at)
                    .then_with(|| a.alias.cmp(&b.alias))
            }))
    }

    async fn migrate(&self) -> Result<()> {
        self.enter().await
    }

    async fn close(&self) -> Result<()> {
        self.inner.closed.store(true, Ordering::SeqCst);
        if self.inner.fail_close.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(
                "failed to release connections".to_string(),
            ));
        }
        Ok(())
    }
}
