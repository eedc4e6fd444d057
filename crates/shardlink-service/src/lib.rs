//! Create and resolve workflows over the sharded record store and the cache.

pub mod error;
pub mod service;
pub mod shortener;

pub use error::ServiceError;
pub use service::{ServiceConfig, ShortenerService, ALIAS_CACHE_BUCKET};
pub use shortener::{CreateOutcome, Shortener};
