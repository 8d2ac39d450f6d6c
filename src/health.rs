//! Liveness endpoint and keep-alive self-ping. Operational plumbing with no
//! data dependency on the conversation core.

use std::time::Duration;

use anyhow::Result;
use axum::routing::get;
use axum::Router;
use rand::Rng;
use tracing::{info, warn};

/// Serve `GET /health` until the process exits.
pub async fn serve(port: u16) -> Result<()> {
    let app = Router::new().route("/health", get(|| async { "ok" }));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!(port, "health endpoint listening");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Ping `url` every `interval_secs`, with up to 30 seconds of random jitter
/// so restarted instances do not align. Failures are logged and retried at
/// the next tick.
pub async fn keep_alive(url: String, interval_secs: u64) {
    let client = reqwest::Client::new();
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        ticker.tick().await;
        let jitter = rand::thread_rng().gen_range(0..30);
        tokio::time::sleep(Duration::from_secs(jitter)).await;

        match client.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                info!(url = %url, "keep-alive ping ok");
            }
            Ok(response) => {
                warn!(url = %url, status = %response.status(), "keep-alive ping rejected");
            }
            Err(e) => {
                warn!(url = %url, error = %e, "keep-alive ping failed");
            }
        }
    }
}
