// ABOUTME: Health check route for monitoring and deployment probes
// ABOUTME: Unauthenticated, returns service identity and version
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Growth Engine

//! Health routes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};

use crate::constants::service_names;

/// Health routes handler
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create the health route
    pub fn routes() -> Router {
        Router::new().route("/health", get(Self::health))
    }

    async fn health() -> Response {
        (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "ok",
                "service": service_names::GROWTH_ENGINE,
                "version": env!("CARGO_PKG_VERSION"),
            })),
        )
            .into_response()
    }
}
