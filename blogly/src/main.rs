// Run with:
//   cargo run -p blogly
//   cargo run -p blogly --features postgres-backend -- --database-url postgres://...

use anyhow::Context;
use blogly::{db, AppState, Config};
use clap::Parser;
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    blogly::telemetry::init();
    let config = Config::parse();

    let backend = db::Backend::from_url(&config.database_url);
    let users = db::connect(&config.database_url)
        .await
        .with_context(|| format!("opening {backend:?} database"))?;
    let app = blogly::app(AppState::new(users));

    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .with_context(|| format!("invalid bind address {}", config.bind_address()))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, ?backend, "blogly listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
