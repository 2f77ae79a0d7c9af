// ABOUTME: Administrative maintenance routes
// ABOUTME: Exposes the conversation eviction helper to administrators
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Growth Engine

//! Admin routes.
//!
//! Conversation eviction is not scheduled anywhere in the process; this
//! endpoint is the external caller that gives the age-based sweep effect.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::errors::AppError;
use crate::models::UserRole;
use crate::resources::ServerResources;

/// Optional override for the eviction age
#[derive(Debug, Deserialize, Default)]
pub struct CleanupRequest {
    /// Evict conversations older than this many hours; defaults to the
    /// configured maximum age
    #[serde(default)]
    pub max_age_hours: Option<i64>,
}

/// Eviction outcome
#[derive(Debug, Serialize, Deserialize)]
pub struct CleanupResponse {
    /// Number of conversations evicted
    pub cleared: usize,
    /// Age threshold that was applied, in hours
    pub max_age_hours: i64,
}

/// Admin routes handler
pub struct AdminRoutes;

impl AdminRoutes {
    /// Create all admin routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/admin/conversations/cleanup",
                post(Self::cleanup_conversations),
            )
            .with_state(resources)
    }

    async fn cleanup_conversations(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        body: Option<Json<CleanupRequest>>,
    ) -> Result<Response, AppError> {
        let user = super::authenticate(&headers, &resources)?;
        super::require_role(&user, UserRole::Admin)?;

        let max_age_hours = body
            .and_then(|Json(request)| request.max_age_hours)
            .unwrap_or(resources.config.conversation.max_age_hours);
        if max_age_hours <= 0 {
            return Err(AppError::invalid_input("max_age_hours must be positive"));
        }

        let cleared = resources
            .analysis_service
            .evict_stale_conversations(max_age_hours);

        Ok((
            StatusCode::OK,
            Json(CleanupResponse {
                cleared,
                max_age_hours,
            }),
        )
            .into_response())
    }
}
