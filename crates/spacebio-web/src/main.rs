//! Space Bio API server
//!
//! Run with: cargo run -p spacebio-web --bin spacebio

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use spacebio_db::{Database, PaperRepository};
use spacebio_ingestion::csv_import::seed_if_empty;
use spacebio_web::config::Config;
use spacebio_web::router::build_router;
use spacebio_web::state::{build_article_source, build_chat_backend, AppState};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,spacebio=debug")),
        )
        .init();

    info!("Starting Space Bio server...");
    let config = Config::load()?;

    let db = Database::open(&config.database.path)
        .await
        .with_context(|| format!("opening database {}", config.database.path))?;
    db.initialize().await.context("initializing schema")?;
    let db = Arc::new(db);

    match seed_if_empty(&PaperRepository::new(db.clone()), &config.ingestion.csv_path).await {
        Ok(0) => {}
        Ok(n) => info!(papers = n, csv = %config.ingestion.csv_path, "Seeded paper store"),
        Err(e) => warn!(error = %e, csv = %config.ingestion.csv_path, "Seeding from CSV failed"),
    }

    let chat = build_chat_backend(&config.chat)?;
    let articles = build_article_source(&config.ingestion)?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.server.host, config.server.port))?;

    let app = build_router(AppState::new(db, config, chat, articles));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
