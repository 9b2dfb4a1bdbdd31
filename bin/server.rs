// Tip Pool - Web Server
// POST /api/ocr, /api/calculate, /api/export

use anyhow::{Context, Result};
use std::sync::Arc;
use tip_pool::http::{router, AppState};
use tip_pool::{init_tracing, AzureLayoutClient, DocumentAnalyzer, Settings};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let settings = Settings::load()?;

    // Missing credentials are reported per request, not at startup
    let analyzer: Option<Arc<dyn DocumentAnalyzer>> = match AzureLayoutClient::from_settings(&settings.ocr) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            warn!(error = %e, "OCR disabled; /api/ocr will answer 500");
            None
        }
    };

    let app = router(AppState { analyzer });

    let addr = settings.server.bind_addr.as_str();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    info!(%addr, version = tip_pool::VERSION, "server running");

    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}
