//! Canonical event topic constants published by the collection manager.
//!
//! Consumers match on these strings to render notices, so keep them stable.
//! Keep this list alphabetized within sections and favor dot.case names.

// Load lifecycle
pub const TOPIC_FEEDBACK_LOAD_FAILED: &str = "feedback.load.failed";
pub const TOPIC_FEEDBACK_LOADED: &str = "feedback.loaded";

// Mutations
pub const TOPIC_FEEDBACK_DELETE_SCHEDULED: &str = "feedback.delete.scheduled";
pub const TOPIC_FEEDBACK_DELETED: &str = "feedback.deleted";
pub const TOPIC_FEEDBACK_UPDATE_FAILED: &str = "feedback.update.failed";
pub const TOPIC_FEEDBACK_UPDATED: &str = "feedback.updated";
pub const TOPIC_FEEDBACK_VALIDATION_FAILED: &str = "feedback.validation.failed";
