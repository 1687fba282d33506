//! Chain tests for the detection engine — end-to-end with mocks.
//!
//! Each test follows MOCK → FUNCTION → OUTPUT: set up the fake ledger,
//! stream, and sink, drive the ACTUAL engine, assert what came out. We
//! never reach into the engine and call its internals.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::watch;

use lifeline_common::FlagReason;

use crate::bus::PostStream;
use crate::classifier::KeywordClassifier;
use crate::engine::{DetectionEngine, PostOutcome};
use crate::testing::*;

const RISK_TEXT: &str = "I'm feeling so alone, nothing seems to matter anymore.";
const BENIGN_TEXT: &str = "Just finished my project, feeling great!";

fn engine_with(ledger: Arc<MockLedger>, sink: Arc<MockSink>, claim_ttl: Duration) -> DetectionEngine {
    DetectionEngine::new(
        Arc::new(KeywordClassifier::new()),
        ledger,
        sink,
        3,
        claim_ttl,
        8,
    )
}

// ---------------------------------------------------------------------------
// Chain Test 1: Threshold crossing
//
// Three qualifying posts from one author → counts 1, 2, then a single flag
// at 3. A fourth post within the claim window bumps the counter but never
// publishes a second event.
// ---------------------------------------------------------------------------

#[tokio::test]
async fn third_offense_flags_exactly_once() {
    let ledger = Arc::new(MockLedger::new());
    let sink = Arc::new(MockSink::new());
    let engine = engine_with(ledger.clone(), sink.clone(), Duration::from_secs(86400));

    let p1 = engine.process_post(&post("offender-1", RISK_TEXT)).await.unwrap();
    assert_eq!(p1, PostOutcome::Counted { count: 1 });
    assert_eq!(sink.published_count(), 0);

    let p2 = engine.process_post(&post("offender-1", RISK_TEXT)).await.unwrap();
    assert_eq!(p2, PostOutcome::Counted { count: 2 });
    assert_eq!(sink.published_count(), 0);

    let p3 = engine.process_post(&post("offender-1", RISK_TEXT)).await.unwrap();
    assert_eq!(p3, PostOutcome::Flagged { count: 3 });

    let events = sink.published();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].author_id, "offender-1");
    assert_eq!(events[0].reason, FlagReason::RepetitiveRiskLanguage);
    assert_eq!(events[0].count, 3);

    // Fourth matching post inside the window: counted, not re-flagged.
    let p4 = engine.process_post(&post("offender-1", RISK_TEXT)).await.unwrap();
    assert_eq!(p4, PostOutcome::AlreadyFlagged { count: 4 });
    assert_eq!(sink.published_count(), 1);
}

// ---------------------------------------------------------------------------
// Chain Test 2: Flag-once under concurrency
//
// Eight qualifying posts from the same author processed concurrently.
// Several workers observe count >= threshold; the claim, not ordering,
// guarantees a single published event.
// ---------------------------------------------------------------------------

#[tokio::test]
async fn concurrent_threshold_observers_publish_one_flag() {
    let ledger = Arc::new(MockLedger::new());
    let sink = Arc::new(MockSink::new());
    let engine = engine_with(ledger.clone(), sink.clone(), Duration::from_secs(86400));

    let posts: Vec<_> = (0..8).map(|_| post("offender-2", RISK_TEXT)).collect();
    let outcomes = futures::future::join_all(
        posts.iter().map(|p| engine.process_post(p)),
    )
    .await;

    let flagged = outcomes
        .iter()
        .filter(|o| matches!(o, Ok(PostOutcome::Flagged { .. })))
        .count();
    assert_eq!(flagged, 1, "exactly one worker should win the claim");
    assert_eq!(sink.published_count(), 1);
    assert_eq!(ledger.count_for("offender-2"), 8);
}

// ---------------------------------------------------------------------------
// Chain Test 3: Non-qualifying posts are inert
// ---------------------------------------------------------------------------

#[tokio::test]
async fn clean_posts_touch_nothing() {
    let ledger = Arc::new(MockLedger::new());
    let sink = Arc::new(MockSink::new());
    let engine = engine_with(ledger.clone(), sink.clone(), Duration::from_secs(86400));

    for _ in 0..5 {
        let outcome = engine.process_post(&post("calm-1", BENIGN_TEXT)).await.unwrap();
        assert_eq!(outcome, PostOutcome::Clean);
    }

    assert_eq!(ledger.count_for("calm-1"), 0);
    assert!(!ledger.claim_held("calm-1"));
    assert_eq!(sink.published_count(), 0);
}

// ---------------------------------------------------------------------------
// Chain Test 4: Counter monotonicity under redelivery
//
// Redelivered posts increment again; dedup is not the counter's job.
// ---------------------------------------------------------------------------

#[tokio::test]
async fn redelivered_post_increments_again() {
    let ledger = Arc::new(MockLedger::new());
    let sink = Arc::new(MockSink::new());
    let engine = engine_with(ledger.clone(), sink.clone(), Duration::from_secs(86400));

    let delivered = post("offender-3", RISK_TEXT);
    let first = engine.process_post(&delivered).await.unwrap();
    let redelivered = engine.process_post(&delivered).await.unwrap();

    assert_eq!(first, PostOutcome::Counted { count: 1 });
    assert_eq!(redelivered, PostOutcome::Counted { count: 2 });
    assert_eq!(ledger.count_for("offender-3"), 2);
}

// ---------------------------------------------------------------------------
// Chain Test 5: Claim expiry opens a new episode
//
// The counter never resets; once the claim lapses, the next qualifying
// post re-crosses the (long-passed) threshold and flags again.
// ---------------------------------------------------------------------------

#[tokio::test]
async fn expired_claim_allows_second_flag() {
    let ledger = Arc::new(MockLedger::new());
    let sink = Arc::new(MockSink::new());
    let engine = engine_with(ledger.clone(), sink.clone(), Duration::from_millis(50));

    for _ in 0..3 {
        engine.process_post(&post("offender-4", RISK_TEXT)).await.unwrap();
    }
    assert_eq!(sink.published_count(), 1);

    tokio::time::sleep(Duration::from_millis(80)).await;

    let outcome = engine.process_post(&post("offender-4", RISK_TEXT)).await.unwrap();
    assert_eq!(outcome, PostOutcome::Flagged { count: 4 });

    let events = sink.published();
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].count, 4);
}

// ---------------------------------------------------------------------------
// Chain Test 6: Publish failure after a won claim
//
// The claim is not rolled back, so the author stays flagged-but-unalerted
// for the rest of the window.
// ---------------------------------------------------------------------------

#[tokio::test]
async fn publish_failure_keeps_claim() {
    let ledger = Arc::new(MockLedger::new());
    let sink = Arc::new(MockSink::failing());
    let engine = engine_with(ledger.clone(), sink.clone(), Duration::from_secs(86400));

    for _ in 0..2 {
        engine.process_post(&post("offender-5", RISK_TEXT)).await.unwrap();
    }
    let dropped = engine.process_post(&post("offender-5", RISK_TEXT)).await.unwrap();
    assert_eq!(dropped, PostOutcome::FlagDropped { count: 3 });
    assert!(ledger.claim_held("offender-5"));

    // Next crossing observes the standing claim; no duplicate attempt.
    let next = engine.process_post(&post("offender-5", RISK_TEXT)).await.unwrap();
    assert_eq!(next, PostOutcome::AlreadyFlagged { count: 4 });
    assert_eq!(sink.published_count(), 0);
}

// ---------------------------------------------------------------------------
// Chain Test 7: Consumption loop
//
// Malformed payloads are dropped without stalling; parsed posts flow
// through the worker pool; the loop drains before returning.
// ---------------------------------------------------------------------------

#[tokio::test]
async fn run_loop_drops_malformed_and_processes_the_rest() {
    let ledger = Arc::new(MockLedger::new());
    let sink = Arc::new(MockSink::new());
    let engine = engine_with(ledger.clone(), sink.clone(), Duration::from_secs(86400));

    let stream = MockStream::new()
        .with_raw(b"{not json".to_vec())
        .with_post(&post("offender-6", RISK_TEXT))
        .with_post(&post("calm-2", BENIGN_TEXT))
        .with_post(&post("offender-6", RISK_TEXT))
        .with_raw(b"".to_vec())
        .with_post(&post("offender-6", RISK_TEXT));

    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    engine.run(Arc::new(stream), shutdown_rx).await.unwrap();

    assert_eq!(ledger.count_for("offender-6"), 3);
    assert_eq!(ledger.count_for("calm-2"), 0);
    assert_eq!(sink.published_count(), 1);
    assert_eq!(sink.published()[0].author_id, "offender-6");
}

// ---------------------------------------------------------------------------
// Chain Test 8: Transient read failures are retried
// ---------------------------------------------------------------------------

/// Errors on the first read, then drains an inner queue.
struct FlakyStream {
    errored: AtomicBool,
    inner: Mutex<Vec<Vec<u8>>>,
}

#[async_trait]
impl PostStream for FlakyStream {
    async fn next_post(&self) -> Result<Option<Vec<u8>>> {
        if !self.errored.swap(true, Ordering::SeqCst) {
            anyhow::bail!("transient broker hiccup");
        }
        let mut inner = self.inner.lock().unwrap();
        if inner.is_empty() {
            Ok(None)
        } else {
            Ok(Some(inner.remove(0)))
        }
    }
}

#[tokio::test]
async fn read_failure_does_not_stop_the_loop() {
    let ledger = Arc::new(MockLedger::new());
    let sink = Arc::new(MockSink::new());
    let engine = engine_with(ledger.clone(), sink.clone(), Duration::from_secs(86400));

    let stream = FlakyStream {
        errored: AtomicBool::new(false),
        inner: Mutex::new(vec![
            serde_json::to_vec(&post("offender-7", RISK_TEXT)).unwrap(),
        ]),
    };

    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    engine.run(Arc::new(stream), shutdown_rx).await.unwrap();

    assert_eq!(ledger.count_for("offender-7"), 1);
}
