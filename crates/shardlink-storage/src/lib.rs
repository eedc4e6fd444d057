//! Sharded persistence for alias records.
//!
//! [`ShardRouter`] owns one [`ShardStore`] per partition and decides where a
//! key lives; [`ShardedRepository`] builds the typed record store on top of
//! it. [`PgShard`] is the production backend, [`MemoryShard`] the in-process
//! one used by tests and local runs.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod repository;
pub mod router;
pub mod shard;

pub use error::CloseError;
pub use memory::MemoryShard;
pub use postgres::{PgShard, PgShardOptions};
pub use repository::ShardedRepository;
pub use router::{RouterConfig, Shard, ShardRouter};
pub use shard::ShardStore;
pub use shardlink_core::repository::{AliasRecord, AliasRepository, Result};
pub use shardlink_core::StorageError;
