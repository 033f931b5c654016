use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use frd_model::{FeedbackEnvelope, FeedbackPatch, FeedbackRecord};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::RwLock;

pub const FEEDBACK_ROUTE: &str = "/api/v1/demo-feedback";

/// Records served by the mock, mutated only by PATCH.
#[derive(Clone, Default)]
pub struct MockStore {
    records: Arc<RwLock<Vec<FeedbackRecord>>>,
}

impl MockStore {
    pub fn new(records: Vec<FeedbackRecord>) -> Self {
        Self {
            records: Arc::new(RwLock::new(records)),
        }
    }

    pub fn seeded() -> Self {
        Self::new(frd_core::seed::seed_records())
    }

    pub async fn get(&self, id: &str) -> Option<FeedbackRecord> {
        self.records.read().await.iter().find(|r| r.id == id).cloned()
    }
}

pub fn router(store: MockStore) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(FEEDBACK_ROUTE, get(list_feedback))
        .route(&format!("{FEEDBACK_ROUTE}/{{id}}"), patch(patch_feedback))
        .with_state(store)
}

async fn healthz() -> Json<Value> {
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    Json(json!({"status": "ok", "generated": now}))
}

async fn list_feedback(State(store): State<MockStore>) -> Json<FeedbackEnvelope> {
    let data = store.records.read().await.clone();
    Json(FeedbackEnvelope { data })
}

async fn patch_feedback(
    State(store): State<MockStore>,
    Path(id): Path<String>,
    Json(body): Json<FeedbackPatch>,
) -> Result<Json<FeedbackRecord>, StatusCode> {
    let mut guard = store.records.write().await;
    let record = guard
        .iter_mut()
        .find(|r| r.id == id)
        .ok_or(StatusCode::NOT_FOUND)?;
    body.apply_to(record);
    tracing::info!(%id, fields = ?body.field_names(), "mock feedback patched");
    Ok(Json(record.clone()))
}

/// Bind and serve until the task is dropped. Returns the bound address.
pub async fn spawn(
    addr: SocketAddr,
    store: MockStore,
) -> anyhow::Result<(SocketAddr, tokio::task::JoinHandle<()>)> {
    let listener = TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;
    let app = router(store);
    let handle = tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            tracing::warn!(%err, "mock server stopped");
        }
    });
    Ok((local, handle))
}
