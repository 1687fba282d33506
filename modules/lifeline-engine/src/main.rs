use std::sync::Arc;

use anyhow::Result;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lifeline_common::Config;
use lifeline_engine::bus::{KafkaFlagSink, KafkaPostStream};
use lifeline_engine::classifier::KeywordClassifier;
use lifeline_engine::ledger::RedisLedger;
use lifeline_engine::DetectionEngine;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("lifeline_engine=info".parse()?),
        )
        .init();

    info!("Lifeline detection engine starting...");

    // Load config
    let config = Config::engine_from_env();
    config.log_redacted();

    // Connect to the ledger and the bus
    let ledger = RedisLedger::connect(&config.redis_url).await?;
    let stream = KafkaPostStream::connect(
        &config.kafka_brokers,
        &config.consumer_group,
        &config.posts_topic,
    )?;
    let sink = KafkaFlagSink::connect(&config.kafka_brokers, &config.flags_topic)?;

    let engine = DetectionEngine::new(
        Arc::new(KeywordClassifier::new()),
        Arc::new(ledger),
        Arc::new(sink),
        config.offense_threshold,
        config.claim_ttl,
        config.worker_pool_size,
    );

    // Drain in-flight work on ctrl-c before exiting
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received; draining in-flight work");
            let _ = shutdown_tx.send(true);
        }
    });

    engine.run(Arc::new(stream), shutdown_rx).await
}
