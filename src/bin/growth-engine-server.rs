// ABOUTME: Growth Engine server binary
// ABOUTME: Loads configuration, wires resources, seeds demo data, and serves the HTTP API
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Growth Engine

//! # Growth Engine Server Binary
//!
//! Starts the guided student-analysis backend: auth, student and school
//! management, and the LLM-backed conversation flow, all on one HTTP port.

use anyhow::Result;
use clap::Parser;
use growth_engine::{
    config::ServerConfig, logging, resources::ServerResources, routes, seed,
};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "growth-engine-server")]
#[command(about = "Growth Engine - Guided student-analysis backend for K-12 teachers")]
struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }

    logging::init_from_env()?;

    info!("Starting Growth Engine");
    info!("{}", config.summary());

    let seed_demo = config.seed_demo_data;
    let http_port = config.http_port;
    let resources = Arc::new(ServerResources::new(config).map_err(|e| anyhow::anyhow!("{e}"))?);

    if seed_demo {
        seed::seed_demo_data(&resources).map_err(|e| anyhow::anyhow!("{e}"))?;
    }

    let app = routes::router(resources)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(tower_http::cors::CorsLayer::permissive());

    display_available_endpoints(http_port);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", http_port)).await?;
    info!("Server listening on port {http_port}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}

/// Display the API surface at startup
fn display_available_endpoints(port: u16) {
    info!("Available endpoints on port {port}:");
    info!("  GET    /health");
    info!("  POST   /api/auth/register | login | refresh | logout");
    info!("  GET    /api/auth/me");
    info!("  POST   /api/auth/forgot-password | reset-password");
    info!("  GET    /api/students  POST /api/students");
    info!("  GET    /api/students/:id  PUT|DELETE /api/students/:id");
    info!("  GET    /api/schools  POST /api/schools  GET /api/schools/:id");
    info!("  POST   /api/analysis/start | chat | complete");
    info!("  GET    /api/analysis  GET /api/analysis/by-id/:id  DELETE /api/analysis/:id");
    info!("  GET    /api/analysis/student/:student_id [/latest]");
    info!("  POST   /api/admin/conversations/cleanup");
}
