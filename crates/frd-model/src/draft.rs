use std::collections::BTreeMap;

use serde_json::Value;

use crate::attachment::{AttachmentError, PickedFile};
use crate::patch::FeedbackPatch;
use crate::record::{FeedbackRecord, RecordId};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("feedback content is required")]
    MissingMessage,
    #[error("metadata must be a JSON object of scalar values: {0}")]
    InvalidMetadata(String),
    #[error(transparent)]
    Attachment(#[from] AttachmentError),
}

impl ValidationError {
    /// Form field the error belongs to.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingMessage => "message",
            ValidationError::InvalidMetadata(_) => "metadata",
            ValidationError::Attachment(_) => "file",
        }
    }
}

/// Editable copy of a record. Nothing here touches the record until the
/// draft is turned into a patch and saved.
#[derive(Clone, Debug, PartialEq)]
pub struct EditDraft {
    pub record_id: RecordId,
    pub content: String,
    pub metadata_text: String,
    pub pending_file: Option<PickedFile>,
    existing_file: Option<String>,
    had_metadata: bool,
}

impl EditDraft {
    pub fn from_record(record: &FeedbackRecord) -> Self {
        let metadata_text = record
            .metadata
            .as_ref()
            .and_then(|m| serde_json::to_string(m).ok())
            .unwrap_or_default();
        Self {
            record_id: record.id.clone(),
            content: record.feedback_message.clone().unwrap_or_default(),
            metadata_text,
            pending_file: None,
            existing_file: record.file.clone(),
            had_metadata: record.metadata.is_some(),
        }
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    pub fn set_metadata_text(&mut self, text: impl Into<String>) {
        self.metadata_text = text.into();
    }

    /// Replaces the pending file. A rejected file leaves the previous
    /// selection in place.
    pub fn attach(&mut self, file: PickedFile) -> Result<(), ValidationError> {
        file.validate()?;
        self.pending_file = Some(file);
        Ok(())
    }

    pub fn detach(&mut self) {
        self.pending_file = None;
    }

    pub fn existing_file(&self) -> Option<&str> {
        self.existing_file.as_deref()
    }

    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        self.to_patch().map(|_| ())
    }

    /// Builds the patch for saving, collecting every field error.
    pub fn to_patch(&self) -> Result<FeedbackPatch, Vec<ValidationError>> {
        let mut errors = Vec::new();
        if self.content.trim().is_empty() {
            errors.push(ValidationError::MissingMessage);
        }
        let metadata = match parse_metadata(&self.metadata_text) {
            Ok(Some(map)) => Some(map),
            Ok(None) if self.had_metadata => Some(BTreeMap::new()),
            Ok(None) => None,
            Err(err) => {
                errors.push(err);
                None
            }
        };
        if !errors.is_empty() {
            return Err(errors);
        }
        let file = match &self.pending_file {
            Some(picked) => Some(picked.to_base64()),
            None => self.existing_file.clone(),
        };
        Ok(FeedbackPatch {
            feedback_message: Some(self.content.clone()),
            metadata,
            file,
            ..Default::default()
        })
    }
}

fn parse_metadata(text: &str) -> Result<Option<BTreeMap<String, Value>>, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let value: Value = serde_json::from_str(trimmed)
        .map_err(|err| ValidationError::InvalidMetadata(err.to_string()))?;
    let Value::Object(obj) = value else {
        return Err(ValidationError::InvalidMetadata(
            "expected an object".to_string(),
        ));
    };
    let mut out = BTreeMap::new();
    for (key, value) in obj {
        if value.is_array() || value.is_object() {
            return Err(ValidationError::InvalidMetadata(format!(
                "value for `{key}` is not a scalar"
            )));
        }
        out.insert(key, value);
    }
    Ok(Some(out))
}
