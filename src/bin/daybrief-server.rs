// ABOUTME: Main server binary for the daybrief day-summary service
// ABOUTME: Initializes logging, configuration, database, and the HTTP server

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Daybrief

use anyhow::{Context, Result};
use clap::Parser;
use daybrief::config::ServerConfig;
use daybrief::database::Database;
use daybrief::logging::LoggingConfig;
use daybrief::resources::ServerResources;
use daybrief::routes;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "daybrief-server")]
#[command(about = "Day-summary aggregation server for personal health data")]
struct Args {
    /// HTTP port override (takes precedence over HTTP_PORT)
    #[arg(long)]
    http_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let logging = LoggingConfig::from_env();
    logging.init().context("Failed to initialize logging")?;

    let mut config = ServerConfig::from_env().context("Failed to load configuration")?;
    if let Some(port) = args.http_port {
        config.http_port = port;
    }

    info!(
        port = config.http_port,
        database_url = %config.database_url,
        llm_configured = config.llm.api_key.is_some(),
        "starting daybrief-server"
    );

    let database = Database::new(&config.database_url)
        .await
        .context("Failed to open database")?;

    let port = config.http_port;
    let resources = Arc::new(ServerResources::new(database, config));
    let app = routes::router(resources);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "listening");

    axum::serve(listener, app)
        .await
        .context("HTTP server failed")?;

    Ok(())
}
