//! Offense ledger seam.
//!
//! The ledger is the only shared mutable state in the pipeline. Both
//! operations must be atomic at the store level; the engine never does a
//! local read-increment-write. Counter keys use the raw author id; claim
//! keys carry a prefix so the two namespaces never collide.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

const CLAIM_PREFIX: &str = "flagged:";

#[async_trait]
pub trait OffenseLedger: Send + Sync {
    /// Atomically increment the author's offense count and return the
    /// post-increment value. Concurrent increments serialize in the store.
    async fn increment_offense(&self, author_id: &str) -> Result<i64>;

    /// Atomically claim the author's current flagging episode. Returns true
    /// iff this call established the claim. The claim expires after `ttl`,
    /// at which point a new episode can be claimed.
    async fn claim_episode(&self, author_id: &str, ttl: Duration) -> Result<bool>;
}

/// Redis-backed ledger: INCR for counters, SET NX EX for claims.
pub struct RedisLedger {
    conn: ConnectionManager,
}

impl RedisLedger {
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).context("Invalid Redis URL")?;
        let conn = client
            .get_connection_manager()
            .await
            .context("Failed to connect to Redis")?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl OffenseLedger for RedisLedger {
    async fn increment_offense(&self, author_id: &str) -> Result<i64> {
        let mut conn = self.conn.clone();
        let count: i64 = conn
            .incr(author_id, 1)
            .await
            .context("Offense increment failed")?;
        Ok(count)
    }

    async fn claim_episode(&self, author_id: &str, ttl: Duration) -> Result<bool> {
        let mut conn = self.conn.clone();
        let key = format!("{CLAIM_PREFIX}{author_id}");
        // Single atomic SET NX EX. Only one concurrent caller observes the
        // key absent; everyone else gets Nil back.
        let established: Option<String> = redis::cmd("SET")
            .arg(&key)
            .arg("true")
            .arg("NX")
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async(&mut conn)
            .await
            .context("Episode claim failed")?;
        Ok(established.is_some())
    }
}
