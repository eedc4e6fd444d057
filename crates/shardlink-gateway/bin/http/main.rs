mod cli;

use crate::cli::{Cli, LogFormat};
use anyhow::Context;
use clap::Parser;
use shardlink_cache::{CacheAside, RedisCache};
use shardlink_gateway::{App, AppState};
use shardlink_generator::RandomGenerator;
use shardlink_service::{ServiceConfig, ShortenerService};
use shardlink_storage::{
    PgShard, PgShardOptions, RouterConfig, ShardRouter, ShardStore, ShardedRepository,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    info!(
        listen_addr = %cli.listen_addr,
        shards = cli.shards.len(),
        log_format = %cli.log_format,
        "starting shardlink"
    );

    let options = PgShardOptions::builder()
        .max_connections(cli.max_shard_connections)
        .build();
    let mut shards = Vec::with_capacity(cli.shards.len());
    for spec in &cli.shards {
        let shard = PgShard::connect(&spec.dsn, &options)
            .await
            .with_context(|| format!("failed to connect to shard '{}'", spec.name))?;
        info!(shard = %spec.name, "connected to shard");
        shards.push((spec.name.clone(), shard));
    }

    let router_config = RouterConfig::builder()
        .fan_out_concurrency(cli.fan_out_concurrency)
        .shard_timeout(Duration::from_millis(cli.shard_timeout_ms))
        .build();
    let router = Arc::new(ShardRouter::new(shards, router_config).context("invalid shard list")?);

    router
        .for_each_shard(|shard| async move { shard.migrate().await })
        .await
        .context("schema migration failed")?;
    info!(shards = router.shard_count(), "schema is up to date on every shard");

    let cache = RedisCache::connect(&cli.redis_url, Duration::from_secs(cli.cache_ttl_secs))
        .await
        .context("failed to connect to redis")?;
    let cache = CacheAside::new(cache).with_timeout(Duration::from_millis(cli.cache_timeout_ms));

    let service = ShortenerService::new(
        ShardedRepository::new(Arc::clone(&router)),
        RandomGenerator::new(),
        cache,
        ServiceConfig::builder()
            .alias_length(cli.alias_length)
            .max_create_attempts(cli.max_create_attempts)
            .build(),
    )
    .context("invalid service configuration")?;
    let app = App::router(AppState::new(Arc::new(service)));

    let listener = TcpListener::bind(cli.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", cli.listen_addr))?;
    info!(listen_addr = %listener.local_addr()?, "serving http");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    match router.close_all().await {
        Ok(()) => info!("all shards closed"),
        Err(err) => warn!(error = %err, "shutdown finished with shard close failures"),
    }

    served.context("http server failed")
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to install ctrl-c handler");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received, draining");
}
