//! The detection engine: consume posts, classify, count offenses, flag
//! each author at most once per episode.
//!
//! Correctness does not depend on processing order. Workers never block
//! each other; they serialize only through the ledger's two atomic
//! operations, and the claim key (not the counter value) is the gate
//! that makes flagging happen once per episode.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{watch, Semaphore};
use tracing::{debug, info, warn};

use lifeline_common::{FlagEvent, FlagReason, LifelineError, Post};

use crate::bus::{FlagSink, PostStream};
use crate::classifier::RiskClassifier;
use crate::ledger::OffenseLedger;

/// Outcome of processing one post. `process_post` decides; the consumption
/// loop owns the log/drop/retry policy for each variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOutcome {
    /// Classifier returned no risk verdict. The ledger was not touched.
    Clean,
    /// Qualifying post, count still below the offense threshold.
    Counted { count: i64 },
    /// Threshold crossed, claim won, flag event published.
    Flagged { count: i64 },
    /// Threshold crossed but the episode is already claimed. Normal under
    /// concurrency, never an error.
    AlreadyFlagged { count: i64 },
    /// Claim won but the publish failed. The claim stands: a missed alert
    /// is preferred over a duplicate one.
    FlagDropped { count: i64 },
}

#[derive(Clone)]
pub struct DetectionEngine {
    classifier: Arc<dyn RiskClassifier>,
    ledger: Arc<dyn OffenseLedger>,
    sink: Arc<dyn FlagSink>,
    offense_threshold: i64,
    claim_ttl: Duration,
    worker_pool_size: usize,
}

impl DetectionEngine {
    pub fn new(
        classifier: Arc<dyn RiskClassifier>,
        ledger: Arc<dyn OffenseLedger>,
        sink: Arc<dyn FlagSink>,
        offense_threshold: i64,
        claim_ttl: Duration,
        worker_pool_size: usize,
    ) -> Self {
        Self {
            classifier,
            ledger,
            sink,
            offense_threshold,
            claim_ttl,
            worker_pool_size,
        }
    }

    /// Classify one post and advance the author's offense state.
    ///
    /// A ledger failure aborts only this post; the bus will redeliver it
    /// and the retry is safe (increment repeatable, claim idempotent).
    pub async fn process_post(&self, post: &Post) -> Result<PostOutcome, LifelineError> {
        if !self.classifier.classify(&post.text) {
            return Ok(PostOutcome::Clean);
        }

        debug!(
            author = post.author_id.as_str(),
            post_id = post.id.as_str(),
            "Risk language detected"
        );

        let count = self
            .ledger
            .increment_offense(&post.author_id)
            .await
            .map_err(|e| LifelineError::Ledger(e.to_string()))?;

        if count < self.offense_threshold {
            return Ok(PostOutcome::Counted { count });
        }

        let won = self
            .ledger
            .claim_episode(&post.author_id, self.claim_ttl)
            .await
            .map_err(|e| LifelineError::Ledger(e.to_string()))?;
        if !won {
            return Ok(PostOutcome::AlreadyFlagged { count });
        }

        let event = FlagEvent {
            author_id: post.author_id.clone(),
            reason: FlagReason::RepetitiveRiskLanguage,
            count,
        };
        match self.sink.publish(&event).await {
            Ok(()) => Ok(PostOutcome::Flagged { count }),
            Err(e) => {
                warn!(
                    author = post.author_id.as_str(),
                    error = %e,
                    "Flag publish failed after claim; claim stands"
                );
                Ok(PostOutcome::FlagDropped { count })
            }
        }
    }

    /// The consumption loop. Reads sequentially from `stream`, parses each
    /// record, and hands qualifying work to a bounded worker pool. Returns
    /// when the shutdown signal fires or the stream ends, after draining
    /// in-flight workers.
    pub async fn run(
        &self,
        stream: Arc<dyn PostStream>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        let permits = Arc::new(Semaphore::new(self.worker_pool_size));
        info!(
            workers = self.worker_pool_size,
            threshold = self.offense_threshold,
            "Detection engine started"
        );

        loop {
            let record = tokio::select! {
                _ = shutdown.changed() => break,
                r = stream.next_post() => r,
            };

            match record {
                Ok(Some(payload)) => {
                    let post: Post = match serde_json::from_slice(&payload) {
                        Ok(post) => post,
                        Err(e) => {
                            // Retrying a permanently malformed record would
                            // stall the partition.
                            warn!(error = %e, "Dropping malformed post payload");
                            continue;
                        }
                    };

                    // Backpressure: block further reads while the pool is full.
                    let permit = permits
                        .clone()
                        .acquire_owned()
                        .await
                        .context("worker pool semaphore closed")?;
                    let engine = self.clone();
                    tokio::spawn(async move {
                        let _permit = permit;
                        let outcome = engine.process_post(&post).await;
                        engine.log_outcome(&post, outcome);
                    });
                }
                Ok(None) => {
                    info!("Post stream ended");
                    break;
                }
                Err(e) => {
                    // Transient read failures are recoverable; retry forever.
                    warn!(error = %e, "Post stream read failed; retrying");
                    continue;
                }
            }
        }

        // Graceful drain: take every permit back so in-flight workers finish
        // their ledger/publish calls before we return.
        let _drain = permits
            .acquire_many(self.worker_pool_size as u32)
            .await
            .context("worker pool semaphore closed during drain")?;
        info!("Detection engine drained");
        Ok(())
    }

    fn log_outcome(&self, post: &Post, outcome: Result<PostOutcome, LifelineError>) {
        let author = post.author_id.as_str();
        match outcome {
            Ok(PostOutcome::Clean) => {}
            Ok(PostOutcome::Counted { count }) => {
                info!(author, count, "Offense recorded");
            }
            Ok(PostOutcome::Flagged { count }) => {
                info!(author, count, "Author flagged");
            }
            Ok(PostOutcome::AlreadyFlagged { count }) => {
                debug!(author, count, "Episode already flagged; skipping");
            }
            Ok(PostOutcome::FlagDropped { count }) => {
                warn!(author, count, "Flag event dropped after claim");
            }
            Err(e) => {
                warn!(author, error = %e, "Post processing aborted; awaiting redelivery");
            }
        }
    }
}
