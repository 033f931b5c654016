//! HTTP collaborators: the listing fetch and the PATCH write path.

use std::time::Duration;

use frd_model::{FeedbackEnvelope, FeedbackPatch, FeedbackRecord};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Client;

use crate::config::DashboardConfig;
use crate::error::{LoadError, SinkError};
use crate::source::{RecordSource, UpdateSink};

fn build_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder().timeout(timeout).build()
}

fn with_token(req: reqwest::RequestBuilder, token: Option<&str>) -> reqwest::RequestBuilder {
    match token.map(str::trim) {
        Some(t) if !t.is_empty() => req.header(AUTHORIZATION, format!("Bearer {t}")),
        _ => req,
    }
}

#[derive(Clone, Debug)]
pub struct HttpSource {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpSource {
    pub fn new(
        endpoint: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, LoadError> {
        let client = build_client(timeout).map_err(|e| LoadError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            token,
        })
    }

    pub fn from_config(cfg: &DashboardConfig) -> Result<Self, LoadError> {
        Self::new(cfg.endpoint.clone(), cfg.token.clone(), cfg.request_timeout())
    }
}

#[async_trait::async_trait]
impl RecordSource for HttpSource {
    fn describe(&self) -> String {
        self.endpoint.clone()
    }

    async fn fetch(&self) -> Result<Vec<FeedbackRecord>, LoadError> {
        let req = with_token(self.client.get(&self.endpoint), self.token.as_deref())
            .header(ACCEPT, "application/json");
        let resp = req
            .send()
            .await
            .map_err(|e| LoadError::Transport(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(LoadError::Status(status.as_u16()));
        }
        let body = resp
            .bytes()
            .await
            .map_err(|e| LoadError::Transport(e.to_string()))?;
        let env: FeedbackEnvelope =
            serde_json::from_slice(&body).map_err(|e| LoadError::Decode(e.to_string()))?;
        Ok(env.data)
    }
}

/// Sends `PATCH {endpoint}/{id}` with the patch as the JSON body.
#[derive(Clone, Debug)]
pub struct HttpUpdateSink {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpUpdateSink {
    pub fn new(
        endpoint: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, SinkError> {
        let client = build_client(timeout).map_err(|e| SinkError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            token,
        })
    }

    pub fn from_config(cfg: &DashboardConfig) -> Result<Self, SinkError> {
        Self::new(cfg.endpoint.clone(), cfg.token.clone(), cfg.request_timeout())
    }

    fn record_url(&self, id: &str) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), id)
    }
}

#[async_trait::async_trait]
impl UpdateSink for HttpUpdateSink {
    async fn submit(&self, id: &str, patch: &FeedbackPatch) -> Result<(), SinkError> {
        let req = with_token(self.client.patch(self.record_url(id)), self.token.as_deref())
            .header(ACCEPT, "application/json")
            .json(patch);
        let resp = req
            .send()
            .await
            .map_err(|e| SinkError::Transport(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SinkError::Status(status.as_u16()));
        }
        Ok(())
    }
}
