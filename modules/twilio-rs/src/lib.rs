use std::collections::HashMap;

pub mod models;

use anyhow::{bail, Context, Result};
use reqwest::Client;

use crate::models::MessageResponse;

/// Check if a string is a plausible E.164 phone number
fn is_phone_number(identifier: &str) -> bool {
    identifier.starts_with('+') && identifier.len() >= 10
}

#[derive(Debug, Clone)]
pub struct TwilioOptions {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
}

#[derive(Debug, Clone)]
pub struct TwilioService {
    options: TwilioOptions,
    http: Client,
}

impl TwilioService {
    pub fn new(options: TwilioOptions) -> Self {
        Self {
            options,
            http: Client::new(),
        }
    }

    /// Send an SMS through the Messages API and return the created message
    /// resource.
    pub async fn send_sms(&self, to: &str, body: &str) -> Result<MessageResponse> {
        if !is_phone_number(to) {
            bail!("Recipient must be an E.164 phone number (+1234567890), got: {to}");
        }

        let url = format!(
            "https://api.twilio.com/2010-04-01/Accounts/{sid}/Messages.json",
            sid = self.options.account_sid
        );

        let mut form_body: HashMap<&str, String> = HashMap::new();
        form_body.insert("To", to.to_string());
        form_body.insert("From", self.options.from_number.clone());
        form_body.insert("Body", body.to_string());

        let res = self
            .http
            .post(&url)
            .basic_auth(&self.options.account_sid, Some(&self.options.auth_token))
            .form(&form_body)
            .send()
            .await
            .context("Twilio request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("Failed to read Twilio response body")?;
        if !status.is_success() {
            bail!("Twilio request failed with status {status}: {text}");
        }

        serde_json::from_str(&text).context("Failed to parse Twilio response")
    }
}
