//! Client-side feedback collection manager.
//!
//! [`state::CollectionState`] holds the pure transitions; [`FeedbackManager`]
//! wraps it for async callers, owns the delete timers and talks to the
//! record source and update sink.

pub mod config;
mod error;
pub mod http;
mod manager;
pub mod seed;
mod source;
pub mod state;
#[cfg(test)]
mod test_support;

pub use config::DashboardConfig;
pub use error::{ConfigError, LoadError, SinkError, UpdateError};
pub use http::{HttpSource, HttpUpdateSink};
pub use manager::FeedbackManager;
pub use source::{RecordSource, SeedSource, SimulatedRoundTrip, UpdateSink};
pub use state::{CollectionState, LoadOutcome, LoadStatus, PageView, RowFlag, RowView};
