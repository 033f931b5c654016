//! Feedback collection manager: owns the state container, schedules timed
//! removals and runs update round trips through an [`UpdateSink`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use frd_events::Bus;
use frd_model::{EditDraft, FeedbackPatch, StatusFilter};
use frd_topics as topics;
use serde_json::json;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::DashboardConfig;
use crate::error::{LoadError, UpdateError};
use crate::source::{RecordSource, UpdateSink};
use crate::state::{CollectionState, LoadOutcome, PageView, RowFlag};

const AUDIT: &str = "frd.audit";

#[derive(Clone)]
pub struct FeedbackManager {
    state: Arc<RwLock<CollectionState>>,
    pending_deletes: Arc<Mutex<HashMap<String, JoinHandle<()>>>>,
    sink: Arc<dyn UpdateSink>,
    bus: Bus,
    delete_delay: Duration,
}

impl FeedbackManager {
    pub fn new(page_size: usize, delete_delay: Duration, sink: Arc<dyn UpdateSink>, bus: Bus) -> Self {
        Self {
            state: Arc::new(RwLock::new(CollectionState::new(page_size))),
            pending_deletes: Arc::new(Mutex::new(HashMap::new())),
            sink,
            bus,
            delete_delay,
        }
    }

    pub fn from_config(cfg: &DashboardConfig, sink: Arc<dyn UpdateSink>, bus: Bus) -> Self {
        Self::new(cfg.page_size, cfg.delete_delay(), sink, bus)
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    pub async fn snapshot(&self) -> CollectionState {
        self.state.read().await.clone()
    }

    pub async fn view(&self) -> PageView {
        self.state.read().await.page_view()
    }

    // ---- load ----

    /// Replaces the collection with whatever `source` yields.
    pub async fn load(&self, source: &dyn RecordSource) -> Result<LoadOutcome, LoadError> {
        {
            let mut guard = self.state.write().await;
            if !guard.begin_load() {
                return Err(LoadError::InFlight);
            }
        }
        self.cancel_pending_deletes();
        let origin = source.describe();
        let fetched = source.fetch().await;
        let mut guard = self.state.write().await;
        // Rows stay deletable while the fetch is in flight; drop any timer
        // scheduled meanwhile before the new records land.
        self.cancel_pending_deletes();
        match fetched {
            Ok(records) => {
                let outcome = guard
                    .finish_load(Ok(records))
                    .unwrap_or(LoadOutcome::Empty);
                drop(guard);
                let count = match &outcome {
                    LoadOutcome::Loaded { count } => *count,
                    LoadOutcome::Empty => 0,
                };
                info!(source = %origin, count, "feedback loaded");
                self.bus.publish(
                    topics::TOPIC_FEEDBACK_LOADED,
                    &json!({"source": origin, "count": count}),
                );
                Ok(outcome)
            }
            Err(err) => {
                let _ = guard.finish_load(Err(err.to_string()));
                drop(guard);
                warn!(source = %origin, %err, "feedback load failed");
                self.bus.publish(
                    topics::TOPIC_FEEDBACK_LOAD_FAILED,
                    &json!({"source": origin, "error": err.to_string()}),
                );
                Err(err)
            }
        }
    }

    // ---- open / edit ----

    pub async fn toggle_open(&self, id: &str) -> bool {
        let changed = self.state.write().await.toggle_open(id);
        debug!(id, changed, "toggle open");
        changed
    }

    pub async fn begin_edit(&self, id: &str) -> Result<EditDraft, UpdateError> {
        let mut guard = self.state.write().await;
        guard.begin_edit(id)?;
        let record = guard
            .get(id)
            .ok_or_else(|| UpdateError::NotFound(id.to_string()))?;
        Ok(EditDraft::from_record(record))
    }

    pub async fn cancel_edit(&self, id: &str) -> bool {
        self.state.write().await.cancel_edit(id)
    }

    // ---- delete ----

    pub async fn request_delete(&self, id: &str) -> bool {
        self.state.write().await.request_delete(id)
    }

    pub async fn cancel_delete(&self, id: &str) -> bool {
        self.state.write().await.cancel_delete(id)
    }

    /// Runs [`Self::delete`] for a row awaiting confirmation.
    pub async fn confirm_delete(&self, id: &str) -> bool {
        if self.state.read().await.row_flag(id) != RowFlag::Confirming {
            return false;
        }
        self.delete(id).await
    }

    /// Marks `id` deleting now and removes it after the configured delay.
    /// Returns false when there is nothing to schedule.
    pub async fn delete(&self, id: &str) -> bool {
        if !self.state.write().await.mark_deleting(id) {
            debug!(id, "delete ignored");
            return false;
        }
        self.bus
            .publish(topics::TOPIC_FEEDBACK_DELETE_SCHEDULED, &json!({"id": id}));

        let mut pending = self
            .pending_deletes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let state = self.state.clone();
        let registry = self.pending_deletes.clone();
        let bus = self.bus.clone();
        let delay = self.delete_delay;
        let owned_id = id.to_string();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let removed = state.write().await.finish_delete(&owned_id);
            registry
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .remove(&owned_id);
            if removed.is_some() {
                info!(target: AUDIT, id = %owned_id, "feedback deleted");
                bus.publish(topics::TOPIC_FEEDBACK_DELETED, &json!({"id": owned_id}));
            }
        });
        pending.insert(id.to_string(), handle);
        true
    }

    pub fn pending_delete_count(&self) -> usize {
        self.pending_deletes
            .lock()
            .map(|p| p.len())
            .unwrap_or_default()
    }

    fn cancel_pending_deletes(&self) {
        let drained: Vec<_> = self
            .pending_deletes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .drain()
            .collect();
        for (id, handle) in drained {
            debug!(%id, "cancelling pending delete");
            handle.abort();
        }
    }

    /// Aborts every scheduled removal. Rows stay in the deleting state.
    pub fn shutdown(&self) {
        self.cancel_pending_deletes();
    }

    // ---- update ----

    /// Confirms `patch` through the sink, then merges it into the record.
    /// On failure the record and the editing state are left untouched.
    pub async fn update(&self, id: &str, patch: FeedbackPatch) -> Result<(), UpdateError> {
        self.state.read().await.ensure_mutable(id)?;
        if let Err(err) = self.sink.submit(id, &patch).await {
            warn!(id, %err, "feedback update failed");
            self.bus.publish(
                topics::TOPIC_FEEDBACK_UPDATE_FAILED,
                &json!({"id": id, "error": err.to_string()}),
            );
            return Err(UpdateError::RoundTrip(err));
        }
        if let Err(err) = self.state.write().await.apply_patch(id, &patch) {
            warn!(id, %err, "record changed during round trip; patch dropped");
            self.bus.publish(
                topics::TOPIC_FEEDBACK_UPDATE_FAILED,
                &json!({"id": id, "error": err.to_string()}),
            );
            return Err(err);
        }
        let fields = patch.field_names();
        info!(target: AUDIT, id, ?fields, "feedback updated");
        self.bus.publish(
            topics::TOPIC_FEEDBACK_UPDATED,
            &json!({"id": id, "fields": fields}),
        );
        Ok(())
    }

    /// Validates the draft, then runs [`Self::update`]. Invalid drafts never
    /// reach the sink.
    pub async fn submit_edit(&self, draft: &EditDraft) -> Result<(), UpdateError> {
        let patch = match draft.to_patch() {
            Ok(patch) => patch,
            Err(errors) => {
                let fields: Vec<_> = errors
                    .iter()
                    .map(|e| json!({"field": e.field(), "message": e.to_string()}))
                    .collect();
                self.bus.publish(
                    topics::TOPIC_FEEDBACK_VALIDATION_FAILED,
                    &json!({"id": draft.record_id, "errors": fields}),
                );
                return Err(UpdateError::Validation(errors));
            }
        };
        self.update(&draft.record_id, patch).await
    }

    // ---- filter / page ----

    pub async fn set_search(&self, text: &str) {
        self.state.write().await.set_search(text);
    }

    pub async fn set_status_filter(&self, label: &str) {
        self.state
            .write()
            .await
            .set_status_filter(StatusFilter::parse(label));
    }

    pub async fn set_page(&self, page: usize) {
        self.state.write().await.set_page(page);
    }

    pub async fn next_page(&self) {
        self.state.write().await.next_page();
    }

    pub async fn prev_page(&self) {
        self.state.write().await.prev_page();
    }
}
