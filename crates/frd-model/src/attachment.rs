use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine as _;

pub const EXCEL_MIME_TYPES: &[&str] = &[
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
];

const EXCEL_EXTENSIONS: &[&str] = &[".xls", ".xlsx"];

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AttachmentError {
    #[error("only Excel files (.xls, .xlsx) are allowed: {0}")]
    NotExcel(String),
    #[error("attachment is not valid base64: {0}")]
    Decode(String),
}

/// A file chosen or dropped by the user, before it enters a patch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PickedFile {
    pub name: String,
    pub media_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl PickedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: None,
            bytes,
        }
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    /// Accepts by extension or by declared media type; either is enough.
    pub fn validate(&self) -> Result<(), AttachmentError> {
        let lower = self.name.to_lowercase();
        let by_extension = EXCEL_EXTENSIONS.iter().any(|ext| lower.ends_with(ext));
        let by_media_type = self
            .media_type
            .as_deref()
            .is_some_and(|mt| EXCEL_MIME_TYPES.contains(&mt.trim()));
        if by_extension || by_media_type {
            Ok(())
        } else {
            Err(AttachmentError::NotExcel(self.name.clone()))
        }
    }

    pub fn to_base64(&self) -> String {
        B64.encode(&self.bytes)
    }
}

/// Decodes a stored attachment. Tolerates a leading `data:...;base64,` prefix.
pub fn decode_attachment(encoded: &str) -> Result<Vec<u8>, AttachmentError> {
    let raw = encoded.trim();
    let body = match raw.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map(|(_, b)| b).unwrap_or(rest),
        None => raw,
    };
    B64.decode(body)
        .map_err(|err| AttachmentError::Decode(err.to_string()))
}

pub fn default_download_name(id: &str) -> String {
    format!("feedback-{id}.xlsx")
}
