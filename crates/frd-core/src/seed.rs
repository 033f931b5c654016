use frd_model::FeedbackRecord;
use serde_json::json;

/// Fixed seed set used when no endpoint is reachable and by the mock server.
pub fn seed_records() -> Vec<FeedbackRecord> {
    vec![
        FeedbackRecord::new("1", "Login process review", "NEW")
            .with_rationale(
                "The login flow redirects too many times; users get lost between SSO and email login.",
            )
            .with_date("Dec 14, 2023")
            .with_attribute("Reason", json!("Unknown identity provider in request"))
            .with_attribute("unknown_word", json!(true))
            .with_attribute("call_external", json!(false)),
        FeedbackRecord::new("2", "Dashboard contrast audit", "Pending")
            .with_rationale("Charts are hard to read in dark mode; contrast ratio is below target.")
            .with_date("Dec 13, 2023"),
        FeedbackRecord::new("3", "Monthly report export", "Reviewed")
            .with_rationale("Finance needs to export all monthly reports at once.")
            .with_message("Bulk export would save the finance team a day each month.")
            .with_date("Dec 12, 2023"),
        FeedbackRecord::new("4", "Mobile navigation check", "new")
            .with_rationale("Navigation menu overlaps the dynamic island when scrolled to the top.")
            .with_date("Dec 10, 2023"),
        FeedbackRecord::new("5", "Invoice categorisation", "COMPLETED")
            .with_rationale("Vendor category was inferred from a previous invoice.")
            .with_date("Dec 08, 2023")
            .with_attribute("Reason", json!("Unknown category"))
            .with_attribute("unknown_category", json!(true))
            .with_attribute("feedback_request_reason", json!("Unknown category")),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn seed_ids_are_unique() {
        let records = seed_records();
        let ids: HashSet<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids.len(), records.len());
    }
}
