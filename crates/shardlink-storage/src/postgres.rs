use crate::shard::ShardStore;
use async_trait::async_trait;
use jiff::Timestamp;
use shardlink_core::repository::{AliasRecord, Result};
use shardlink_core::{Alias, StorageError};
use sqlx::migrate::{MigrateError, Migrator};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;
use typed_builder::TypedBuilder;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[derive(Debug, Clone, TypedBuilder)]
pub struct PgShardOptions {
    #[builder(default = 10)]
    pub max_connections: u32,
    /// How long a query may wait for a free pooled connection.
    #[builder(default = Duration::from_secs(5))]
    pub acquire_timeout: Duration,
}

impl Default for PgShardOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// PostgreSQL shard: one database holding an `alias_records` table.
///
/// Timestamps are stored as microseconds since the Unix epoch and assigned
/// by the database on insert.
#[derive(Debug, Clone)]
pub struct PgShard {
    pool: PgPool,
}

impl PgShard {
    /// Wraps an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a new pool against `database_url`.
    pub async fn connect(database_url: &str, options: &PgShardOptions) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(options.max_connections)
            .acquire_timeout(options.acquire_timeout)
            .connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn parse_micros(column: &str, value: i64) -> Result<Timestamp> {
    Timestamp::from_microsecond(value).map_err(|e| {
        StorageError::InvalidData(format!("invalid {column} timestamp '{value}': {e}"))
    })
}

fn record_from_row(row: &PgRow) -> Result<AliasRecord> {
    let alias: String = row.try_get("alias").map_err(map_sqlx_error)?;
    let original_url: String = row.try_get("original_url").map_err(map_sqlx_error)?;
    let created_at: i64 = row.try_get("created_at").map_err(map_sqlx_error)?;
    let updated_at: i64 = row.try_get("updated_at").map_err(map_sqlx_error)?;

    Ok(AliasRecord {
        alias: Alias::new(alias).map_err(|e| StorageError::InvalidData(e.to_string()))?,
        original_url,
        created_at: parse_micros("created_at", created_at)?,
        updated_at: parse_micros("updated_at", updated_at)?,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

pub(crate) fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::Configuration(_) => StorageError::Configuration(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

fn map_migrate_error(err: MigrateError) -> StorageError {
    match err {
        MigrateError::Execute(err) => map_sqlx_error(err),
        other => StorageError::Query(format!("migration failed: {other}")),
    }
}

#[async_trait]
impl ShardStore for PgShard {
    async fn insert(&self, alias: &Alias, original_url: &str) -> Result<AliasRecord> {
        let result = sqlx::query(
            r#"
            INSERT INTO alias_records (alias, original_url)
            VALUES ($1, $2)
            RETURNING alias, original_url, created_at, updated_at
            "#,
        )
        .bind(alias.as_str())
        .bind(original_url)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => record_from_row(&row),
            Err(err) if is_unique_violation(&err) => Err(StorageError::Conflict(alias.to_string())),
            Err(err) => Err(map_sqlx_error(err)),
        }
    }

    async fn find_by_alias(&self, alias: &Alias) -> Result<Option<AliasRecord>> {
        let row = sqlx::query(
            r#"
            SELECT alias, original_url, created_at, updated_at
            FROM alias_records
            WHERE alias = $1
            "#,
        )
        .bind(alias.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(record_from_row).transpose()
    }

    async fn find_by_original_url(&self, original_url: &str) -> Result<Option<AliasRecord>> {
        let row = sqlx::query(
            r#"
            SELECT alias, original_url, created_at, updated_at
            FROM alias_records
            WHERE original_url = $1
            ORDER BY created_at, alias
            LIMIT 1
            "#,
        )
        .bind(original_url)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(record_from_row).transpose()
    }

    async fn migrate(&self) -> Result<()> {
        MIGRATOR.run(&self.pool).await.map_err(map_migrate_error)
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}
