use std::env;
use std::time::Duration;

use tracing::info;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Kafka
    pub kafka_brokers: String,
    pub posts_topic: String,
    pub flags_topic: String,
    pub consumer_group: String,

    // Redis
    pub redis_url: String,

    // Detection
    pub offense_threshold: i64,
    pub claim_ttl: Duration,
    pub worker_pool_size: usize,

    // Notifier (Twilio)
    pub twilio_account_sid: Option<String>,
    pub twilio_auth_token: Option<String>,
    pub twilio_from_number: Option<String>,
    pub alert_phone_number: Option<String>,

    // Generator
    pub post_interval: Duration,
}

impl Config {
    /// Load configuration for the detection engine.
    /// Panics with a clear message if a value fails to parse.
    pub fn engine_from_env() -> Self {
        Self {
            kafka_brokers: env_or("KAFKA_BROKERS", "localhost:9092"),
            posts_topic: env_or("POSTS_TOPIC", "posts"),
            flags_topic: env_or("FLAGS_TOPIC", "flagged-authors"),
            consumer_group: env_or("CONSUMER_GROUP", "lifeline-engine"),
            redis_url: env_or("REDIS_URL", "redis://127.0.0.1:6379"),
            offense_threshold: env_or("OFFENSE_THRESHOLD", "3")
                .parse()
                .expect("OFFENSE_THRESHOLD must be a number"),
            claim_ttl: Duration::from_secs(
                env_or("CLAIM_TTL_SECS", "86400")
                    .parse()
                    .expect("CLAIM_TTL_SECS must be a number"),
            ),
            worker_pool_size: env_or("WORKER_POOL_SIZE", "64")
                .parse()
                .expect("WORKER_POOL_SIZE must be a number"),
            twilio_account_sid: None,
            twilio_auth_token: None,
            twilio_from_number: None,
            alert_phone_number: None,
            post_interval: Duration::from_millis(100),
        }
    }

    /// Load configuration for the notifier. Twilio credentials are optional;
    /// the notifier degrades to log-only delivery when they are absent.
    pub fn notifier_from_env() -> Self {
        Self {
            kafka_brokers: env_or("KAFKA_BROKERS", "localhost:9092"),
            posts_topic: env_or("POSTS_TOPIC", "posts"),
            flags_topic: env_or("FLAGS_TOPIC", "flagged-authors"),
            consumer_group: env_or("CONSUMER_GROUP", "lifeline-notifier"),
            redis_url: String::new(),
            offense_threshold: 0,
            claim_ttl: Duration::ZERO,
            worker_pool_size: 0,
            twilio_account_sid: env::var("TWILIO_ACCOUNT_SID").ok(),
            twilio_auth_token: env::var("TWILIO_AUTH_TOKEN").ok(),
            twilio_from_number: env::var("TWILIO_FROM_NUMBER").ok(),
            alert_phone_number: env::var("ALERT_PHONE_NUMBER").ok(),
            post_interval: Duration::ZERO,
        }
    }

    /// Load configuration for the synthetic post generator.
    pub fn generator_from_env() -> Self {
        Self {
            kafka_brokers: env_or("KAFKA_BROKERS", "localhost:9092"),
            posts_topic: env_or("POSTS_TOPIC", "posts"),
            flags_topic: String::new(),
            consumer_group: String::new(),
            redis_url: String::new(),
            offense_threshold: 0,
            claim_ttl: Duration::ZERO,
            worker_pool_size: 0,
            twilio_account_sid: None,
            twilio_auth_token: None,
            twilio_from_number: None,
            alert_phone_number: None,
            post_interval: Duration::from_millis(
                env_or("POST_INTERVAL_MS", "100")
                    .parse()
                    .expect("POST_INTERVAL_MS must be a number"),
            ),
        }
    }

    /// Log the effective configuration without exposing secrets.
    pub fn log_redacted(&self) {
        info!(
            brokers = self.kafka_brokers.as_str(),
            posts_topic = self.posts_topic.as_str(),
            flags_topic = self.flags_topic.as_str(),
            group = self.consumer_group.as_str(),
            threshold = self.offense_threshold,
            claim_ttl_secs = self.claim_ttl.as_secs(),
            workers = self.worker_pool_size,
            twilio_configured = self.twilio_account_sid.is_some(),
            "Configuration loaded"
        );
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
