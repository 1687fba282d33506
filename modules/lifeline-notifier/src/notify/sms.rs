use async_trait::async_trait;
use tracing::info;

use lifeline_common::{Config, FlagEvent};
use twilio::{TwilioOptions, TwilioService};

use super::backend::NotifyBackend;
use crate::alert::format_alert;

/// Twilio SMS backend.
pub struct SmsBackend {
    service: TwilioService,
    to_number: String,
}

impl SmsBackend {
    /// Build from configuration. Returns `None` when any Twilio value is
    /// missing, so the caller can fall back to log-only delivery.
    pub fn from_config(config: &Config) -> Option<Self> {
        let account_sid = config.twilio_account_sid.clone()?;
        let auth_token = config.twilio_auth_token.clone()?;
        let from_number = config.twilio_from_number.clone()?;
        let to_number = config.alert_phone_number.clone()?;

        Some(Self {
            service: TwilioService::new(TwilioOptions {
                account_sid,
                auth_token,
                from_number,
            }),
            to_number,
        })
    }
}

#[async_trait]
impl NotifyBackend for SmsBackend {
    async fn send(&self, event: &FlagEvent) -> anyhow::Result<()> {
        let body = format_alert(event);
        let message = self.service.send_sms(&self.to_number, &body).await?;
        info!(
            sid = message.sid.as_str(),
            author = event.author_id.as_str(),
            "SMS alert sent"
        );
        Ok(())
    }
}
