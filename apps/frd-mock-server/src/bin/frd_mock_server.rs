use std::{env, net::SocketAddr};

use anyhow::Context;
use frd_mock_server::{MockStore, FEEDBACK_ROUTE};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    frd_otel::init();

    let port = env::var("FRD_MOCK_PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(4000);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let (bound, handle) = frd_mock_server::spawn(addr, MockStore::seeded())
        .await
        .with_context(|| format!("binding mock server on {addr}"))?;
    tracing::info!("mock feedback server listening on http://{}{}", bound, FEEDBACK_ROUTE);
    handle.await.context("mock server task")?;
    Ok(())
}
