// ABOUTME: School route handlers for listing, creation, and lookup
// ABOUTME: Creation is restricted to administrators
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Growth Engine

//! School routes.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::errors::AppError;
use crate::models::{School, UserRole};
use crate::resources::ServerResources;

/// Request to create a school
#[derive(Debug, Deserialize)]
pub struct CreateSchoolRequest {
    /// Unique registration code
    pub code: String,
    /// School name
    pub name: String,
    /// Optional postal address
    #[serde(default)]
    pub address: Option<String>,
}

/// Single-school response
#[derive(Debug, Serialize, Deserialize)]
pub struct SchoolResponse {
    /// The school record
    pub school: School,
}

/// School list response
#[derive(Debug, Serialize, Deserialize)]
pub struct SchoolListResponse {
    /// All schools
    pub schools: Vec<School>,
    /// Total count
    pub total: usize,
}

/// School routes handler
pub struct SchoolRoutes;

impl SchoolRoutes {
    /// Create all school routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/schools",
                get(Self::list_schools).post(Self::create_school),
            )
            .route("/api/schools/:id", get(Self::get_school))
            .with_state(resources)
    }

    async fn list_schools(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        super::authenticate(&headers, &resources)?;

        let schools = resources.schools.get_all();
        let total = schools.len();
        Ok((StatusCode::OK, Json(SchoolListResponse { schools, total })).into_response())
    }

    async fn create_school(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<CreateSchoolRequest>,
    ) -> Result<Response, AppError> {
        let user = super::authenticate(&headers, &resources)?;
        super::require_role(&user, UserRole::Admin)?;

        if request.code.trim().is_empty() || request.name.trim().is_empty() {
            return Err(AppError::invalid_input("School code and name required"));
        }

        let school = resources
            .schools
            .create(request.code, request.name, request.address)?;
        Ok((StatusCode::CREATED, Json(SchoolResponse { school })).into_response())
    }

    async fn get_school(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        super::authenticate(&headers, &resources)?;

        let school = resources
            .schools
            .get_by_id(&id)
            .ok_or_else(|| AppError::not_found("School"))?;
        Ok((StatusCode::OK, Json(SchoolResponse { school })).into_response())
    }
}
