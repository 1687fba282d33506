use serde::Deserialize;

/// Message resource returned by the Twilio Messages API.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    pub sid: String,
    pub status: String,
    pub to: String,
    pub from: String,
}
