use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// --- Inbound stream records ---

/// A single post read from the inbound stream. Immutable once parsed;
/// the bus may redeliver the same post (at-least-once).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    #[serde(rename = "user_id")]
    pub author_id: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

// --- Outbound stream records ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlagReason {
    #[serde(rename = "Repetitive suicidal content")]
    RepetitiveRiskLanguage,
}

impl std::fmt::Display for FlagReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlagReason::RepetitiveRiskLanguage => write!(f, "Repetitive suicidal content"),
        }
    }
}

/// Published once per author per episode, keyed by `author_id` so the bus
/// preserves per-author ordering on the flags topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagEvent {
    #[serde(rename = "user_id")]
    pub author_id: String,
    pub reason: FlagReason,
    pub count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_wire_format_uses_user_id() {
        let json = r#"{"id":"post-1","user_id":"offender-1","text":"hi","timestamp":"2026-08-06T12:00:00Z"}"#;
        let post: Post = serde_json::from_str(json).unwrap();
        assert_eq!(post.author_id, "offender-1");
    }

    #[test]
    fn flag_event_wire_format() {
        let event = FlagEvent {
            author_id: "offender-1".to_string(),
            reason: FlagReason::RepetitiveRiskLanguage,
            count: 3,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["user_id"], "offender-1");
        assert_eq!(json["reason"], "Repetitive suicidal content");
        assert_eq!(json["count"], 3);
    }
}
