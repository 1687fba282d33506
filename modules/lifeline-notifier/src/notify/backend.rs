use async_trait::async_trait;

use lifeline_common::FlagEvent;

/// Pluggable alert delivery backend for the notifier.
#[async_trait]
pub trait NotifyBackend: Send + Sync {
    /// Deliver the alert for a single flag event.
    async fn send(&self, event: &FlagEvent) -> anyhow::Result<()>;
}
