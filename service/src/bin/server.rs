//! Review service HTTP server.
//!
//! Connects the record store (fatal on failure), then attaches the cache,
//! event log and search index when configured, warning and degrading when
//! one of them is unreachable. Serves until SIGINT or SIGTERM.

use clap::Parser;
use review_elasticsearch::ElasticsearchIndex;
use review_postgres::PostgresReviewStore;
use review_redis::RedisReviewCache;
use review_redpanda::RedpandaEventLog;
use review_service::server::{build_router, shutdown_signal, AppState};
use review_service::{Config, ReviewRepository, ReviewService};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "review-server", about = "Review management HTTP server")]
struct Cli {
    /// Path to the config file, or a directory containing config.toml.
    #[arg(long = "conf", default_value = "./configs")]
    conf: PathBuf,
}

fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli.conf)?;
    init_tracing(&config.server.log_filter);

    tracing::info!(postgres = %config.postgres.url, "starting review server");

    let store = PostgresReviewStore::connect(&config.postgres.url).await?;
    store.migrate().await?;

    let mut repo = ReviewRepository::new(Arc::new(store));

    if let Some(redis) = &config.redis {
        match RedisReviewCache::connect(&redis.url).await {
            Ok(cache) => {
                if let Err(error) = cache.ping().await {
                    tracing::warn!(%error, "redis ping failed");
                }
                repo = repo.with_cache(Arc::new(cache));
            }
            Err(error) => {
                tracing::warn!(%error, "redis unavailable, running without a cache");
            }
        }
    }

    if let Some(kafka) = &config.kafka {
        match RedpandaEventLog::new(&kafka.brokers, kafka.topic.clone()) {
            Ok(log) => repo = repo.with_event_log(Arc::new(log)),
            Err(error) => {
                tracing::warn!(%error, "event log unavailable, running without publication");
            }
        }
    }

    if let Some(elasticsearch) = &config.elasticsearch {
        match ElasticsearchIndex::new(&elasticsearch.url, &elasticsearch.index) {
            Ok(index) => repo = repo.with_search_index(Arc::new(index)),
            Err(error) => {
                tracing::warn!(%error, "search index unavailable, lists will use the store");
            }
        }
    }

    let service = ReviewService::new(repo);
    let router = build_router(
        AppState::new(service),
        Duration::from_secs(config.server.request_timeout_secs),
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "review server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("review server stopped");
    Ok(())
}
