mod alert;
mod notify;

use anyhow::{Context, Result};
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::Message;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use lifeline_common::{Config, FlagEvent};

use crate::notify::{LogBackend, NotifyBackend, SmsBackend};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("lifeline_notifier=info".parse()?),
        )
        .init();

    info!("Lifeline notifier starting...");

    // Load config
    let config = Config::notifier_from_env();
    config.log_redacted();

    let backend: Box<dyn NotifyBackend> = match SmsBackend::from_config(&config) {
        Some(sms) => Box::new(sms),
        None => {
            warn!("Twilio configuration incomplete; alerts will be logged only");
            Box::new(LogBackend)
        }
    };

    let consumer: StreamConsumer = ClientConfig::new()
        .set("group.id", config.consumer_group.as_str())
        .set("bootstrap.servers", config.kafka_brokers.as_str())
        .set("enable.partition.eof", "false")
        .set("session.timeout.ms", "6000")
        .set("enable.auto.commit", "true")
        .create()
        .context("Failed to create Kafka consumer")?;
    consumer
        .subscribe(&[config.flags_topic.as_str()])
        .context("Failed to subscribe to flags topic")?;

    info!("Lifeline notifier started. Listening for flagged authors...");

    loop {
        let message = match consumer.recv().await {
            Ok(m) => m,
            Err(e) => {
                warn!(error = %e, "Flag stream read failed; retrying");
                continue;
            }
        };

        let event: FlagEvent = match serde_json::from_slice(message.payload().unwrap_or_default())
        {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "Dropping malformed flag event");
                continue;
            }
        };

        info!(
            author = event.author_id.as_str(),
            count = event.count,
            "Flag event received"
        );

        // Delivery failures never abort the consume loop.
        if let Err(e) = backend.send(&event).await {
            warn!(
                author = event.author_id.as_str(),
                error = %e,
                "Alert delivery failed"
            );
        }
    }
}
