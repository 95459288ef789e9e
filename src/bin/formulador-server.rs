// ABOUTME: HTTP server binary for the Formulador formula service
// ABOUTME: Loads configuration, opens the database, and serves the axum router until ctrl-c
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Formulador Contributors

//! # Formulador Server Binary
//!
//! ```bash
//! formulador-server --http-port 8081 --database-url sqlite:./data/formulador.db
//! ```
//!
//! Flags override the matching environment variables.

use anyhow::{Context, Result};
use clap::Parser;
use formulador::{
    config::{DatabaseUrl, ServerConfig},
    database::Database,
    routes::{self, AppState},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "formulador-server")]
#[command(about = "Formulador - meat-product formula service")]
struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override database URL
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(url) = args.database_url.as_deref() {
        config.database.url = DatabaseUrl::parse_url(url)?;
    }

    config.logging.init()?;

    let database = Database::new(&config.database).await?;
    info!(url = %config.database.url, "Database initialized");

    let bind_address = config.bind_address();
    let state = Arc::new(AppState::new(database, config));
    let app = routes::build(state);

    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;
    info!(address = %bind_address, "Formulador server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Formulador server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for ctrl-c, shutting down");
        return;
    }
    info!("Shutdown signal received");
}
