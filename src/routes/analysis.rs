// ABOUTME: Guided analysis route handlers for starting, chatting, and finalizing
// ABOUTME: Also serves stored analysis lookups by id and by student
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Growth Engine

//! Guided analysis routes.
//!
//! The conversational flow (`start`, `chat`, `complete`) plus read and
//! delete access to stored analyses. The chat endpoint is the only
//! rate-limited surface; its per-user budget comes from configuration.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::analysis::{AdvanceOutcome, CompleteOutcome, StartOutcome};
use crate::errors::AppError;
use crate::resources::ServerResources;
use crate::store::AnalysisResult;

/// Request to start a conversation
#[derive(Debug, Deserialize)]
pub struct StartAnalysisRequest {
    /// Subject student id
    pub student_id: String,
}

/// Request to advance a conversation
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Conversation to advance
    pub conversation_id: Uuid,
    /// Teacher's message
    pub message: String,
}

/// Request to finalize a conversation
#[derive(Debug, Deserialize)]
pub struct CompleteAnalysisRequest {
    /// Conversation to finalize
    pub conversation_id: Uuid,
}

/// Query parameters for listing analyses
#[derive(Debug, Deserialize, Default)]
pub struct ListAnalysesQuery {
    /// Restrict to one student
    #[serde(default)]
    pub student_id: Option<String>,
}

/// Single-analysis response
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalysisResponse {
    /// The stored record
    pub analysis: AnalysisResult,
}

/// Analysis list response
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalysisListResponse {
    /// Matching records, newest first
    pub analyses: Vec<AnalysisResult>,
    /// Total count
    pub total: usize,
}

/// Guided analysis routes handler
pub struct AnalysisRoutes;

impl AnalysisRoutes {
    /// Create all analysis routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/analysis/start", post(Self::start))
            .route("/api/analysis/chat", post(Self::chat))
            .route("/api/analysis/complete", post(Self::complete))
            .route("/api/analysis", get(Self::list))
            .route("/api/analysis/by-id/:id", get(Self::get_by_id))
            .route("/api/analysis/:id", axum::routing::delete(Self::delete))
            .route("/api/analysis/student/:student_id", get(Self::get_by_student))
            .route(
                "/api/analysis/student/:student_id/latest",
                get(Self::get_latest_by_student),
            )
            .with_state(resources)
    }

    /// Start a guided conversation for a student
    async fn start(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<StartAnalysisRequest>,
    ) -> Result<Response, AppError> {
        super::authenticate(&headers, &resources)?;

        if request.student_id.trim().is_empty() {
            return Err(AppError::invalid_input("Student ID required"));
        }

        let outcome: StartOutcome = resources.analysis_service.start(&request.student_id)?;
        Ok((StatusCode::OK, Json(outcome)).into_response())
    }

    /// Advance a conversation with one teacher message
    async fn chat(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<ChatRequest>,
    ) -> Result<Response, AppError> {
        let user = super::authenticate(&headers, &resources)?;

        let status = resources.chat_rate_limiter.check(user.id);
        if status.is_rate_limited {
            return Err(AppError::rate_limit_exceeded(status.limit, status.reset_at));
        }

        let outcome: AdvanceOutcome = resources
            .analysis_service
            .advance(request.conversation_id, &request.message)
            .await?;
        Ok((StatusCode::OK, Json(outcome)).into_response())
    }

    /// Finalize a conversation into a stored analysis
    async fn complete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<CompleteAnalysisRequest>,
    ) -> Result<Response, AppError> {
        let user = super::authenticate(&headers, &resources)?;

        let outcome: CompleteOutcome = resources
            .analysis_service
            .complete(request.conversation_id, user.id)
            .await?;
        Ok((StatusCode::OK, Json(outcome)).into_response())
    }

    /// List stored analyses, optionally for one student
    async fn list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<ListAnalysesQuery>,
    ) -> Result<Response, AppError> {
        super::authenticate(&headers, &resources)?;

        let analyses = resources.analyses.get_all(query.student_id.as_deref());
        let total = analyses.len();
        Ok((StatusCode::OK, Json(AnalysisListResponse { analyses, total })).into_response())
    }

    /// Look up one stored analysis
    async fn get_by_id(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        super::authenticate(&headers, &resources)?;

        let analysis = resources
            .analyses
            .get_by_id(&id)
            .ok_or_else(|| AppError::not_found("Analysis"))?;
        Ok((StatusCode::OK, Json(AnalysisResponse { analysis })).into_response())
    }

    /// Delete one stored analysis
    async fn delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        super::authenticate(&headers, &resources)?;

        if !resources.analyses.delete(&id) {
            return Err(AppError::not_found("Analysis"));
        }
        Ok((StatusCode::NO_CONTENT, ()).into_response())
    }

    /// All analyses for one student, newest first
    async fn get_by_student(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(student_id): Path<String>,
    ) -> Result<Response, AppError> {
        super::authenticate(&headers, &resources)?;

        let analyses = resources.analyses.get_by_student_id(&student_id);
        let total = analyses.len();
        Ok((StatusCode::OK, Json(AnalysisListResponse { analyses, total })).into_response())
    }

    /// The most recent analysis for one student
    async fn get_latest_by_student(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(student_id): Path<String>,
    ) -> Result<Response, AppError> {
        super::authenticate(&headers, &resources)?;

        let analysis = resources
            .analyses
            .get_latest_by_student_id(&student_id)
            .ok_or_else(|| AppError::not_found("Analysis"))?;
        Ok((StatusCode::OK, Json(AnalysisResponse { analysis })).into_response())
    }
}
