use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::status::StatusTone;

pub type RecordId = String;

/// Attribute key promoted to the main decision reason.
const REASON_KEY: &str = "Reason";
/// Attribute keys that repeat information shown elsewhere.
const REDUNDANT_KEYS: &[&str] = &["feedback_request_reason"];

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRecord {
    pub id: RecordId,
    pub workflow_name: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_request_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_attributes: Option<BTreeMap<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, Value>>,
    /// Base64 encoded spreadsheet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provided_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl FeedbackRecord {
    pub fn new(
        id: impl Into<String>,
        workflow_name: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            workflow_name: workflow_name.into(),
            status: status.into(),
            ..Default::default()
        }
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = Some(rationale.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.feedback_message = Some(message.into());
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn with_file(mut self, base64: impl Into<String>) -> Self {
        self.file = Some(base64.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.feedback_attributes
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value);
        self
    }

    pub fn tone(&self) -> StatusTone {
        StatusTone::from_slug(&self.status)
    }

    pub fn status_label(&self) -> String {
        self.status.trim().to_uppercase()
    }

    pub fn has_attachment(&self) -> bool {
        self.file.as_deref().is_some_and(|f| !f.trim().is_empty())
    }

    /// Case-insensitive substring match against the searchable fields.
    /// `needle` must already be lower-cased.
    pub fn matches_search(&self, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }
        if self.workflow_name.to_lowercase().contains(needle) {
            return true;
        }
        self.rationale
            .as_deref()
            .is_some_and(|r| r.to_lowercase().contains(needle))
    }

    /// The `Reason` attribute when it is a plain string.
    pub fn decision_reason(&self) -> Option<&str> {
        self.feedback_attributes
            .as_ref()?
            .get(REASON_KEY)?
            .as_str()
    }

    /// Remaining attributes rendered for display, in key order.
    pub fn attribute_lines(&self) -> Vec<AttributeLine> {
        let Some(attrs) = self.feedback_attributes.as_ref() else {
            return Vec::new();
        };
        attrs
            .iter()
            .filter(|(key, _)| key.as_str() != REASON_KEY)
            .filter(|(key, _)| !REDUNDANT_KEYS.contains(&key.as_str()))
            .map(|(key, value)| AttributeLine {
                key: key.clone(),
                display: display_value(value),
            })
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeLine {
    pub key: String,
    pub display: String,
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Bool(true) => "Yes".to_string(),
        Value::Bool(false) => "No".to_string(),
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Body shape returned by the listing endpoint.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct FeedbackEnvelope {
    pub data: Vec<FeedbackRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_payload_and_ignores_legacy_fields() {
        let payload = json!({
            "data": [{
                "id": "a1",
                "sessionId": "legacy-1",
                "workflowName": "Invoice triage",
                "status": "pending",
                "rationale": null,
                "feedbackMessage": "looks off",
                "feedbackData": {"rating": 3},
                "feedbackAttributes": {"Reason": "unknown vendor", "call_external": true},
                "file": null,
                "providedBy": "ops"
            }]
        });
        let env: FeedbackEnvelope = serde_json::from_value(payload).expect("decode");
        assert_eq!(env.data.len(), 1);
        let rec = &env.data[0];
        assert_eq!(rec.id, "a1");
        assert_eq!(rec.workflow_name, "Invoice triage");
        assert_eq!(rec.rationale, None);
        assert_eq!(rec.provided_by.as_deref(), Some("ops"));
        assert_eq!(rec.decision_reason(), Some("unknown vendor"));
        assert!(!rec.has_attachment());
    }

    #[test]
    fn missing_required_field_is_an_error() {
        let payload = json!({"data": [{"id": "x", "status": "NEW"}]});
        assert!(serde_json::from_value::<FeedbackEnvelope>(payload).is_err());
    }

    #[test]
    fn search_covers_workflow_and_rationale() {
        let rec = FeedbackRecord::new("1", "Login Flow", "NEW").with_rationale("SSO Redirects");
        assert!(rec.matches_search("login"));
        assert!(rec.matches_search("sso red"));
        assert!(rec.matches_search(""));
        assert!(!rec.matches_search("dark mode"));
    }

    #[test]
    fn attribute_lines_skip_reason_and_redundant_keys() {
        let rec = FeedbackRecord::new("1", "wf", "NEW")
            .with_attribute("Reason", json!("because"))
            .with_attribute("feedback_request_reason", json!("dup"))
            .with_attribute("unknown_word", json!(true))
            .with_attribute("call_external", json!(false))
            .with_attribute("tags", json!(["a", "b"]));
        let lines = rec.attribute_lines();
        let keys: Vec<_> = lines.iter().map(|l| l.key.as_str()).collect();
        assert_eq!(keys, vec!["call_external", "tags", "unknown_word"]);
        assert_eq!(lines[0].display, "No");
        assert_eq!(lines[1].display, r#"["a","b"]"#);
        assert_eq!(lines[2].display, "Yes");
    }

    #[test]
    fn serializes_camel_case_without_absent_fields() {
        let rec = FeedbackRecord::new("7", "wf", "NEW").with_message("hi");
        let value = serde_json::to_value(&rec).expect("encode");
        assert_eq!(
            value,
            json!({"id": "7", "workflowName": "wf", "status": "NEW", "feedbackMessage": "hi"})
        );
    }
}
