use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::FeedbackRecord;

/// Partial update. Present fields replace the record's, absent ones are kept.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_attributes: Option<BTreeMap<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provided_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl FeedbackPatch {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            feedback_message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Names of the fields this patch replaces, for logs.
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.workflow_name.is_some() {
            out.push("workflowName");
        }
        if self.status.is_some() {
            out.push("status");
        }
        if self.rationale.is_some() {
            out.push("rationale");
        }
        if self.feedback_message.is_some() {
            out.push("feedbackMessage");
        }
        if self.feedback_attributes.is_some() {
            out.push("feedbackAttributes");
        }
        if self.metadata.is_some() {
            out.push("metadata");
        }
        if self.file.is_some() {
            out.push("file");
        }
        if self.provided_by.is_some() {
            out.push("providedBy");
        }
        if self.date.is_some() {
            out.push("date");
        }
        out
    }

    pub fn apply_to(&self, record: &mut FeedbackRecord) {
        if let Some(v) = &self.workflow_name {
            record.workflow_name = v.clone();
        }
        if let Some(v) = &self.status {
            record.status = v.clone();
        }
        if let Some(v) = &self.rationale {
            record.rationale = Some(v.clone());
        }
        if let Some(v) = &self.feedback_message {
            record.feedback_message = Some(v.clone());
        }
        if let Some(v) = &self.feedback_attributes {
            record.feedback_attributes = Some(v.clone());
        }
        if let Some(v) = &self.metadata {
            record.metadata = Some(v.clone());
        }
        if let Some(v) = &self.file {
            record.file = Some(v.clone());
        }
        if let Some(v) = &self.provided_by {
            record.provided_by = Some(v.clone());
        }
        if let Some(v) = &self.date {
            record.date = Some(v.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn apply_replaces_only_present_fields() {
        let mut rec = FeedbackRecord::new("3", "Reports", "REVIEWED")
            .with_rationale("bulk export")
            .with_message("old")
            .with_file("QUJD");
        let before = rec.clone();
        FeedbackPatch::message("fixed").apply_to(&mut rec);
        assert_eq!(rec.feedback_message.as_deref(), Some("fixed"));
        rec.feedback_message = before.feedback_message.clone();
        assert_eq!(rec, before);
    }

    #[test]
    fn metadata_replacement_is_shallow() {
        let mut rec = FeedbackRecord::new("1", "wf", "NEW");
        rec.metadata = Some(BTreeMap::from([
            ("team".to_string(), json!("ops")),
            ("priority".to_string(), json!(2)),
        ]));
        let patch = FeedbackPatch {
            metadata: Some(BTreeMap::from([("team".to_string(), json!("finance"))])),
            ..Default::default()
        };
        patch.apply_to(&mut rec);
        let meta = rec.metadata.expect("metadata");
        assert_eq!(meta.len(), 1);
        assert_eq!(meta.get("team"), Some(&json!("finance")));
    }

    #[test]
    fn serializes_only_present_fields() {
        let patch = FeedbackPatch {
            feedback_message: Some("m".into()),
            file: Some("AAAA".into()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&patch).expect("encode"),
            json!({"feedbackMessage": "m", "file": "AAAA"})
        );
        assert_eq!(patch.field_names(), vec!["feedbackMessage", "file"]);
        assert!(FeedbackPatch::default().is_empty());
        assert!(!patch.is_empty());
    }
}
