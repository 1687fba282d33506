//! Event bus seams and their Kafka implementations.
//!
//! The engine needs exactly two capabilities from the bus: "read the next
//! record under consumer-group semantics" and "publish keyed by author".
//! Delivery is at-least-once on both sides; redelivered posts are handled
//! by the ledger's atomic operations, not deduplicated here.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::Message;
use rdkafka::producer::{FutureProducer, FutureRecord};

use lifeline_common::FlagEvent;

#[async_trait]
pub trait PostStream: Send + Sync {
    /// Next raw record payload from the posts topic. `Ok(None)` signals an
    /// exhausted stream; only finite test streams ever end.
    async fn next_post(&self) -> Result<Option<Vec<u8>>>;
}

#[async_trait]
pub trait FlagSink: Send + Sync {
    /// Publish a flag event to the flags topic, keyed by author id so the
    /// bus preserves per-author ordering.
    async fn publish(&self, event: &FlagEvent) -> Result<()>;
}

// --- Kafka implementations ---

pub struct KafkaPostStream {
    consumer: StreamConsumer,
}

impl KafkaPostStream {
    pub fn connect(brokers: &str, group: &str, topic: &str) -> Result<Self> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("group.id", group)
            .set("bootstrap.servers", brokers)
            .set("enable.partition.eof", "false")
            .set("session.timeout.ms", "6000")
            .set("enable.auto.commit", "true")
            .create()
            .context("Failed to create Kafka consumer")?;
        consumer
            .subscribe(&[topic])
            .context("Failed to subscribe to posts topic")?;
        Ok(Self { consumer })
    }
}

#[async_trait]
impl PostStream for KafkaPostStream {
    async fn next_post(&self) -> Result<Option<Vec<u8>>> {
        let message = self.consumer.recv().await.context("Kafka read failed")?;
        Ok(Some(message.payload().unwrap_or_default().to_vec()))
    }
}

pub struct KafkaFlagSink {
    producer: FutureProducer,
    topic: String,
}

impl KafkaFlagSink {
    pub fn connect(brokers: &str, topic: &str) -> Result<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()
            .context("Failed to create Kafka producer")?;
        Ok(Self {
            producer,
            topic: topic.to_string(),
        })
    }
}

#[async_trait]
impl FlagSink for KafkaFlagSink {
    async fn publish(&self, event: &FlagEvent) -> Result<()> {
        let payload = serde_json::to_vec(event).context("Failed to serialize flag event")?;
        self.producer
            .send(
                FutureRecord::to(&self.topic)
                    .key(event.author_id.as_bytes())
                    .payload(&payload),
                Duration::from_secs(5),
            )
            .await
            .map_err(|(e, _)| anyhow::anyhow!("Kafka publish failed: {e}"))?;
        Ok(())
    }
}
