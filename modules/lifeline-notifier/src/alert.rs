use lifeline_common::FlagEvent;

/// Human-readable alert text for a flag event.
pub fn format_alert(event: &FlagEvent) -> String {
    format!(
        "ALERT: author {} flagged after {} risk posts. Reason: {}",
        event.author_id, event.count, event.reason
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifeline_common::FlagReason;

    #[test]
    fn alert_names_author_count_and_reason() {
        let event = FlagEvent {
            author_id: "offender-1".to_string(),
            reason: FlagReason::RepetitiveRiskLanguage,
            count: 3,
        };
        assert_eq!(
            format_alert(&event),
            "ALERT: author offender-1 flagged after 3 risk posts. Reason: Repetitive suicidal content"
        );
    }
}
