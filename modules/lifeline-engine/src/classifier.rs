//! Risk classification seam.
//!
//! The engine only needs "given text, return a verdict". The production
//! keyword matcher is deliberately simple and swappable behind the trait.

/// Phrases matched case-insensitively anywhere in a post's text.
const RISK_PHRASES: &[&str] = &[
    "feeling so alone",
    "don't know what to do with my life",
    "find a way out",
    "everything is so dark",
];

pub trait RiskClassifier: Send + Sync {
    /// Pure verdict on a single post's text. No side effects, no state.
    fn classify(&self, text: &str) -> bool;
}

/// Case-insensitive substring matcher over a fixed phrase list.
pub struct KeywordClassifier {
    phrases: Vec<String>,
}

impl KeywordClassifier {
    pub fn new() -> Self {
        Self::with_phrases(RISK_PHRASES.iter().map(|p| p.to_string()).collect())
    }

    pub fn with_phrases(phrases: Vec<String>) -> Self {
        Self {
            phrases: phrases.into_iter().map(|p| p.to_lowercase()).collect(),
        }
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl RiskClassifier for KeywordClassifier {
    fn classify(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.phrases.iter().any(|p| lowered.contains(p.as_str()))
    }
}
