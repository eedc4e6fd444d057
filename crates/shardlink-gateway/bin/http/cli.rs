use clap::builder::RangedU64ValueParser;
use clap::{Parser, ValueEnum};
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::str::FromStr;

pub const LISTEN_ADDR_ENV: &str = "SHARDLINK_LISTEN_ADDR";
pub const SHARDS_ENV: &str = "SHARDLINK_SHARDS";
pub const MAX_SHARD_CONNECTIONS_ENV: &str = "SHARDLINK_MAX_SHARD_CONNECTIONS";
pub const SHARD_TIMEOUT_MS_ENV: &str = "SHARDLINK_SHARD_TIMEOUT_MS";
pub const FAN_OUT_CONCURRENCY_ENV: &str = "SHARDLINK_FAN_OUT_CONCURRENCY";
pub const REDIS_URL_ENV: &str = "SHARDLINK_REDIS_URL";
pub const CACHE_TTL_SECS_ENV: &str = "SHARDLINK_CACHE_TTL_SECS";
pub const CACHE_TIMEOUT_MS_ENV: &str = "SHARDLINK_CACHE_TIMEOUT_MS";
pub const ALIAS_LENGTH_ENV: &str = "SHARDLINK_ALIAS_LENGTH";
pub const MAX_CREATE_ATTEMPTS_ENV: &str = "SHARDLINK_MAX_CREATE_ATTEMPTS";
pub const LOG_FORMAT_ENV: &str = "SHARDLINK_LOG_FORMAT";

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

impl Display for LogFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

/// One configured shard: `name=dsn`, or a bare DSN named after its database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardSpec {
    pub name: String,
    pub dsn: String,
}

impl FromStr for ShardSpec {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();

        if let Some((name, dsn)) = value.split_once('=') {
            if !name.is_empty() && !name.contains([':', '/', '?', '@']) {
                if dsn.is_empty() {
                    return Err(format!("shard '{name}' has an empty dsn"));
                }
                return Ok(Self {
                    name: name.to_string(),
                    dsn: dsn.to_string(),
                });
            }
        }

        let name = database_name(value)
            .ok_or_else(|| format!("cannot derive a shard name from '{value}', use name=dsn"))?;
        Ok(Self {
            name: name.to_string(),
            dsn: value.to_string(),
        })
    }
}

fn database_name(dsn: &str) -> Option<&str> {
    let (_, rest) = dsn.split_once("://")?;
    let path = rest.split(['?', '#']).next()?;
    let (_, database) = path.split_once('/')?;
    let database = database.rsplit('/').next()?;
    (!database.is_empty()).then_some(database)
}

#[derive(Debug, Parser)]
#[command(name = "shardlink", about = "Sharded URL alias service")]
pub struct Cli {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    /// PostgreSQL shard, in placement order. Repeat or separate with commas.
    #[arg(
        long = "shard",
        env = SHARDS_ENV,
        value_delimiter = ',',
        required = true
    )]
    pub shards: Vec<ShardSpec>,

    #[arg(long, env = MAX_SHARD_CONNECTIONS_ENV, default_value_t = 10)]
    pub max_shard_connections: u32,

    #[arg(long, env = SHARD_TIMEOUT_MS_ENV, default_value_t = 2_000)]
    pub shard_timeout_ms: u64,

    #[arg(long, env = FAN_OUT_CONCURRENCY_ENV, default_value_t = 4)]
    pub fan_out_concurrency: usize,

    #[arg(long, env = REDIS_URL_ENV, default_value = DEFAULT_REDIS_URL)]
    pub redis_url: String,

    #[arg(long, env = CACHE_TTL_SECS_ENV, default_value_t = 20)]
    pub cache_ttl_secs: u64,

    #[arg(long, env = CACHE_TIMEOUT_MS_ENV, default_value_t = 250)]
    pub cache_timeout_ms: u64,

    /// Symbols per generated alias, at most 64.
    #[arg(
        long,
        env = ALIAS_LENGTH_ENV,
        default_value_t = 8,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..=64)
    )]
    pub alias_length: usize,

    #[arg(
        long,
        env = MAX_CREATE_ATTEMPTS_ENV,
        default_value_t = 5,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub max_create_attempts: u32,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}
