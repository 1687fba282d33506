use async_trait::async_trait;
use tracing::info;

use lifeline_common::FlagEvent;

use super::backend::NotifyBackend;
use crate::alert::format_alert;

/// Log-only backend, used when Twilio is not configured.
pub struct LogBackend;

#[async_trait]
impl NotifyBackend for LogBackend {
    async fn send(&self, event: &FlagEvent) -> anyhow::Result<()> {
        info!(
            author = event.author_id.as_str(),
            alert = format_alert(event).as_str(),
            "Alert (log-only delivery)"
        );
        Ok(())
    }
}
