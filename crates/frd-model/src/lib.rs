//! Canonical feedback record shape and the client-side rules around it:
//! status labels, partial patches, spreadsheet attachments and edit drafts.

mod attachment;
mod draft;
mod patch;
mod record;
mod status;

pub use attachment::{
    decode_attachment, default_download_name, AttachmentError, PickedFile, EXCEL_MIME_TYPES,
};
pub use draft::{EditDraft, ValidationError};
pub use patch::FeedbackPatch;
pub use record::{AttributeLine, FeedbackEnvelope, FeedbackRecord, RecordId};
pub use status::{StatusFilter, StatusTone};
