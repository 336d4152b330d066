//! Review search projector.
//!
//! Consumes the change-event topic in a consumer group and materializes
//! each review into the search index. Runs until SIGINT or SIGTERM; the
//! in-flight message finishes before the consumer leaves its group.

use anyhow::Context;
use clap::Parser;
use review_core::SearchIndex;
use review_elasticsearch::ElasticsearchIndex;
use review_redpanda::RedpandaEventConsumer;
use review_service::server::shutdown_signal;
use review_service::{Config, Projector};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "review-projector", about = "Review search index projector")]
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

    let kafka = config
        .kafka
        .clone()
        .context("projector requires a [kafka] section in the config")?;
    let elasticsearch = config
        .elasticsearch
        .clone()
        .context("projector requires an [elasticsearch] section in the config")?;

    let consumer = RedpandaEventConsumer::new(&kafka.brokers, &kafka.group, &kafka.topic)?;
    let index: Arc<dyn SearchIndex> =
        Arc::new(ElasticsearchIndex::new(&elasticsearch.url, &elasticsearch.index)?);

    tracing::info!(
        topic = %kafka.topic,
        group = %kafka.group,
        index = %elasticsearch.index,
        "starting review projector"
    );

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(());
    });

    Projector::new(consumer, index).run(shutdown_rx).await;

    tracing::info!("review projector stopped");
    Ok(())
}
