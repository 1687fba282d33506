// Test mocks for the detection pipeline.
//
// Four mocks matching the four trait boundaries:
// - FixedClassifier (RiskClassifier) — constant verdict
// - MockLedger (OffenseLedger) — in-memory counters + expirable claims
// - MockStream (PostStream) — finite queue of raw payloads
// - MockSink (FlagSink) — records published events, optionally failing
//
// Plus helpers for constructing posts.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use lifeline_common::{FlagEvent, Post};

use crate::bus::{FlagSink, PostStream};
use crate::classifier::RiskClassifier;
use crate::ledger::OffenseLedger;

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// A post from `author` with the given text and a fresh id.
pub fn post(author: &str, text: &str) -> Post {
    Post {
        id: Uuid::new_v4().to_string(),
        author_id: author.to_string(),
        text: text.to_string(),
        timestamp: Utc::now(),
    }
}

// ---------------------------------------------------------------------------
// FixedClassifier
// ---------------------------------------------------------------------------

/// Returns the same verdict for every post.
pub struct FixedClassifier(pub bool);

impl RiskClassifier for FixedClassifier {
    fn classify(&self, _text: &str) -> bool {
        self.0
    }
}

// ---------------------------------------------------------------------------
// MockLedger
// ---------------------------------------------------------------------------

/// In-memory ledger. Claims honor their TTL against the real clock, so
/// expiry tests run with a short TTL and a short sleep.
pub struct MockLedger {
    counts: Mutex<HashMap<String, i64>>,
    claims: Mutex<HashMap<String, Instant>>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self {
            counts: Mutex::new(HashMap::new()),
            claims: Mutex::new(HashMap::new()),
        }
    }

    /// Current offense count for an author (0 if never incremented).
    pub fn count_for(&self, author: &str) -> i64 {
        self.counts.lock().unwrap().get(author).copied().unwrap_or(0)
    }

    /// Whether an unexpired claim is held for this author.
    pub fn claim_held(&self, author: &str) -> bool {
        self.claims
            .lock()
            .unwrap()
            .get(author)
            .is_some_and(|expiry| *expiry > Instant::now())
    }
}

impl Default for MockLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OffenseLedger for MockLedger {
    async fn increment_offense(&self, author_id: &str) -> Result<i64> {
        let mut counts = self.counts.lock().unwrap();
        let count = counts.entry(author_id.to_string()).or_insert(0);
        *count += 1;
        Ok(*count)
    }

    async fn claim_episode(&self, author_id: &str, ttl: Duration) -> Result<bool> {
        let mut claims = self.claims.lock().unwrap();
        let now = Instant::now();
        match claims.get(author_id) {
            Some(expiry) if *expiry > now => Ok(false),
            _ => {
                claims.insert(author_id.to_string(), now + ttl);
                Ok(true)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// MockStream
// ---------------------------------------------------------------------------

/// Finite queue of raw payloads. Returns `Ok(None)` once drained, which
/// ends the engine's run loop. Builder pattern: `.with_post()`, `.with_raw()`.
pub struct MockStream {
    records: Mutex<VecDeque<Vec<u8>>>,
}

impl MockStream {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(VecDeque::new()),
        }
    }

    pub fn with_post(self, post: &Post) -> Self {
        let payload = serde_json::to_vec(post).expect("post serializes");
        self.with_raw(payload)
    }

    pub fn with_raw(self, payload: Vec<u8>) -> Self {
        self.records.lock().unwrap().push_back(payload);
        self
    }
}

impl Default for MockStream {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PostStream for MockStream {
    async fn next_post(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.records.lock().unwrap().pop_front())
    }
}

// ---------------------------------------------------------------------------
// MockSink
// ---------------------------------------------------------------------------

/// Records published flag events. `failing()` builds a sink whose publish
/// always errors, for exercising the publish-after-claim path.
pub struct MockSink {
    published: Mutex<Vec<FlagEvent>>,
    fail: bool,
}

impl MockSink {
    pub fn new() -> Self {
        Self {
            published: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            published: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn published(&self) -> Vec<FlagEvent> {
        self.published.lock().unwrap().clone()
    }

    pub fn published_count(&self) -> usize {
        self.published.lock().unwrap().len()
    }
}

impl Default for MockSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FlagSink for MockSink {
    async fn publish(&self, event: &FlagEvent) -> Result<()> {
        if self.fail {
            bail!("MockSink: publish configured to fail");
        }
        self.published.lock().unwrap().push(event.clone());
        Ok(())
    }
}
