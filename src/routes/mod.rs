// ABOUTME: HTTP route assembly and shared request authentication helpers
// ABOUTME: Merges the auth, students, schools, analysis, admin, and health routers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Growth Engine

//! HTTP routes.
//!
//! Every router follows the same shape: a unit struct with a `routes`
//! constructor that owns its handlers, taking `Arc<ServerResources>` as
//! state. Handlers authenticate explicitly via [`authenticate`] so the
//! bearer-token requirement is visible at each call site.

pub mod admin;
pub mod analysis;
pub mod auth;
pub mod health;
pub mod schools;
pub mod students;

use axum::http::HeaderMap;
use axum::Router;
use std::sync::Arc;

use crate::auth::JwtValidationError;
use crate::errors::AppError;
use crate::models::{User, UserRole};
use crate::resources::ServerResources;

/// Build the complete application router
pub fn router(resources: Arc<ServerResources>) -> Router {
    Router::new()
        .merge(health::HealthRoutes::routes())
        .merge(auth::AuthRoutes::routes(resources.clone()))
        .merge(students::StudentRoutes::routes(resources.clone()))
        .merge(schools::SchoolRoutes::routes(resources.clone()))
        .merge(analysis::AnalysisRoutes::routes(resources.clone()))
        .merge(admin::AdminRoutes::routes(resources))
}

/// Extract and authenticate the user from the `Authorization` header.
///
/// # Errors
///
/// Returns `AuthRequired` when the header is missing, `AuthExpired` for an
/// expired token, and `AuthInvalid` for everything else that fails
/// validation or resolution.
pub fn authenticate(
    headers: &HeaderMap,
    resources: &Arc<ServerResources>,
) -> Result<User, AppError> {
    let token = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(AppError::auth_required)?;

    let claims = resources
        .auth_manager
        .validate_access_token(token)
        .map_err(|e| match e {
            JwtValidationError::TokenExpired { .. } => AppError::auth_expired(),
            other => AppError::auth_invalid(other.to_string()),
        })?;

    let user_id = claims
        .user_id()
        .map_err(|e| AppError::auth_invalid(e.to_string()))?;

    let user = resources
        .users
        .get(user_id)
        .ok_or_else(|| AppError::auth_invalid("Unknown user"))?;

    if !user.is_active {
        return Err(AppError::auth_invalid("Account has been deactivated"));
    }

    Ok(user)
}

/// Require a specific role on top of authentication.
///
/// # Errors
///
/// Returns `PermissionDenied` when the authenticated user holds a different
/// role.
pub fn require_role(user: &User, role: UserRole) -> Result<(), AppError> {
    if user.role == role {
        Ok(())
    } else {
        Err(AppError::permission_denied(format!(
            "Requires {} role",
            role.as_str()
        )))
    }
}
