//! Synthetic traffic generator: a continuous stream of mostly benign posts
//! with a repeat offender surfacing every 20th post, so a running pipeline
//! produces a flag within a minute or so at the default cadence.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use rand::Rng;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use lifeline_common::{Config, Post};

const RISK_TEXTS: [&str; 3] = [
    "I'm feeling so alone, nothing seems to matter anymore.",
    "Feeling hopeless, don't know what to do with my life.",
    "Everything is so dark, I can't find a way out.",
];

const BENIGN_TEXTS: [&str; 4] = [
    "What a beautiful day! The sun is shining.",
    "Just finished my project, feeling great!",
    "Enjoying a cup of coffee. Simple pleasures.",
    "Had a fun time with friends today.",
];

const OFFENDERS: [&str; 3] = ["offender-1", "offender-2", "offender-3"];

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("lifeline_generator=info".parse()?),
        )
        .init();

    info!("Lifeline generator starting...");

    // Load config
    let config = Config::generator_from_env();
    config.log_redacted();

    let producer: FutureProducer = ClientConfig::new()
        .set("bootstrap.servers", config.kafka_brokers.as_str())
        .set("message.timeout.ms", "5000")
        .create()
        .context("Failed to create Kafka producer")?;

    info!("Starting continuous post generation...");

    for i in 0u64.. {
        // Every 20th post comes from a rotating repeat offender; the rest
        // are benign chatter from a wide author pool.
        let (author_id, text) = if i % 20 == 0 {
            let offender = (i / 20) as usize % OFFENDERS.len();
            (
                OFFENDERS[offender].to_string(),
                RISK_TEXTS[offender % RISK_TEXTS.len()],
            )
        } else {
            let author = rand::rng().random_range(0..10_000);
            let text = BENIGN_TEXTS[rand::rng().random_range(0..BENIGN_TEXTS.len())];
            (format!("user-{author}"), text)
        };

        let post = Post {
            id: Uuid::new_v4().to_string(),
            author_id,
            text: text.to_string(),
            timestamp: Utc::now(),
        };
        let payload = serde_json::to_vec(&post).context("Failed to serialize post")?;

        let delivery = producer
            .send(
                FutureRecord::to(&config.posts_topic)
                    .key(post.author_id.as_bytes())
                    .payload(&payload),
                Duration::from_secs(5),
            )
            .await;
        if let Err((e, _)) = delivery {
            warn!(error = %e, post_id = post.id.as_str(), "Failed to publish post");
        }

        if (i + 1) % 1000 == 0 {
            info!(produced = i + 1, "Generation progress");
        }

        tokio::time::sleep(config.post_interval).await;
    }

    Ok(())
}
