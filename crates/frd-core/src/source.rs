use std::time::Duration;

use frd_model::{FeedbackPatch, FeedbackRecord};

use crate::error::{LoadError, SinkError};

/// Where the collection comes from.
#[async_trait::async_trait]
pub trait RecordSource: Send + Sync {
    fn describe(&self) -> String;

    async fn fetch(&self) -> Result<Vec<FeedbackRecord>, LoadError>;
}

/// Confirms a patch with whoever owns durable state.
#[async_trait::async_trait]
pub trait UpdateSink: Send + Sync {
    async fn submit(&self, id: &str, patch: &FeedbackPatch) -> Result<(), SinkError>;
}

/// Static records, no I/O.
#[derive(Clone, Debug, Default)]
pub struct SeedSource {
    records: Vec<FeedbackRecord>,
}

impl SeedSource {
    pub fn new(records: Vec<FeedbackRecord>) -> Self {
        Self { records }
    }
}

#[async_trait::async_trait]
impl RecordSource for SeedSource {
    fn describe(&self) -> String {
        format!("seed ({} records)", self.records.len())
    }

    async fn fetch(&self) -> Result<Vec<FeedbackRecord>, LoadError> {
        Ok(self.records.clone())
    }
}

/// Stand-in for a backend: waits, then accepts every patch.
#[derive(Clone, Debug)]
pub struct SimulatedRoundTrip {
    delay: Duration,
}

impl SimulatedRoundTrip {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait::async_trait]
impl UpdateSink for SimulatedRoundTrip {
    async fn submit(&self, id: &str, patch: &FeedbackPatch) -> Result<(), SinkError> {
        tracing::debug!(id, fields = ?patch.field_names(), "simulated round trip");
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}
