pub mod bus;
pub mod classifier;
pub mod engine;
pub mod ledger;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

#[cfg(test)]
mod engine_tests;

pub use engine::{DetectionEngine, PostOutcome};
