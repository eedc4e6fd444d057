use std::result::Result as StdResult;
use thiserror::Error;

/// Errors raised while starting or talking to a test container.
#[derive(Debug, Error)]
pub enum TestInfraError {
    #[error("Container error: {0}")]
    Container(#[from] testcontainers::TestcontainersError),

    #[error("Postgres error: {0}")]
    Postgres(#[from] sqlx::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("{service} did not become ready: {reason}")]
    NotReady { service: &'static str, reason: String },
}

pub type Result<T> = StdResult<T, TestInfraError>;
