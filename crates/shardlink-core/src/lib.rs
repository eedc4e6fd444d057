//! Core types and traits for the Shardlink alias service.
//!
//! This crate provides the domain types, the placement hash, the error
//! taxonomy and the storage/cache contracts shared by every other crate.

pub mod alias;
pub mod cache;
pub mod error;
pub mod hash;
pub mod repository;

pub use alias::Alias;
pub use cache::BucketCache;
pub use error::{CacheError, CoreError, StorageError};
pub use repository::{AliasRecord, AliasRepository};
