//! Process startup helpers: tracing, environment, and the HTTP listener.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::Router;
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

pub fn init_env() {
    dotenvy::dotenv().ok();
}

pub async fn serve(app: Router, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on {addr}");
    axum::serve(listener, app).await.context("Server error")
}
