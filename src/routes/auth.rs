// ABOUTME: Authentication route handlers for registration, login, and token refresh
// ABOUTME: Thin handlers delegating business logic to AuthService
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Growth Engine

//! Authentication routes.
//!
//! Registration, login with lockout, refresh-token rotation, logout, the
//! current-user endpoint, and the password reset flow. All business logic
//! lives in [`AuthService`]; handlers only translate HTTP.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::constants::{error_messages, limits};
use crate::errors::AppError;
use crate::models::{PasswordResetToken, User, UserRole};
use crate::resources::ServerResources;

/// User registration request
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    /// Login email
    pub email: String,
    /// Plain-text password, hashed before storage
    pub password: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Optional school registration code
    #[serde(default)]
    pub school_code: Option<String>,
    /// Optional role; defaults to TEACHER
    #[serde(default)]
    pub role: Option<UserRole>,
}

/// User registration response
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    /// New user id
    pub user_id: String,
    /// Human-readable confirmation
    pub message: String,
}

/// User login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Login email
    pub email: String,
    /// Plain-text password
    pub password: String,
}

/// Sanitized user info for responses
#[derive(Debug, Serialize, Deserialize)]
pub struct UserInfo {
    /// User id
    pub user_id: String,
    /// Email
    pub email: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Role
    pub role: UserRole,
    /// School id when assigned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school_id: Option<String>,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id.to_string(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            role: user.role,
            school_id: user.school_id.clone(),
        }
    }
}

/// Login / refresh response carrying a rotated token pair
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Short-lived bearer token
    pub access_token: String,
    /// Long-lived rotation token
    pub refresh_token: String,
    /// Access token expiry (RFC 3339)
    pub expires_at: String,
    /// Authenticated user
    pub user: UserInfo,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshTokenRequest {
    /// The refresh token issued at login or the previous refresh
    pub refresh_token: String,
}

/// Forgot-password request
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    /// Account email
    pub email: String,
}

/// Reset-password request
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    /// Raw reset token from the email link
    pub token: String,
    /// Replacement password
    pub new_password: String,
}

/// Generic message response
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Human-readable outcome
    pub message: String,
}

/// Authentication service for business logic
#[derive(Clone)]
pub struct AuthService {
    resources: Arc<ServerResources>,
}

impl AuthService {
    /// Create the service
    #[must_use]
    pub const fn new(resources: Arc<ServerResources>) -> Self {
        Self { resources }
    }

    /// Handle user registration.
    ///
    /// # Errors
    ///
    /// Returns a validation error for malformed emails or weak passwords and
    /// a conflict error for duplicate emails.
    pub fn register(&self, request: RegisterRequest) -> Result<RegisterResponse, AppError> {
        tracing::info!("User registration attempt for email: {}", request.email);

        if !Self::is_valid_email(&request.email) {
            return Err(AppError::invalid_input(error_messages::INVALID_EMAIL_FORMAT));
        }
        if !Self::is_valid_password(&request.password) {
            return Err(AppError::invalid_input(error_messages::PASSWORD_TOO_WEAK));
        }

        let school_id = match request.school_code.as_deref() {
            Some(code) => Some(
                self.resources
                    .schools
                    .get_by_code(code)
                    .ok_or_else(|| AppError::not_found("School"))?
                    .id,
            ),
            None => None,
        };

        let password_hash = bcrypt::hash(&request.password, limits::BCRYPT_COST)
            .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))?;

        let mut user = User::new(
            request.email.clone(),
            password_hash,
            request.first_name,
            request.last_name,
            school_id,
        );
        if let Some(role) = request.role {
            user = user.with_role(role);
        }

        let user = self.resources.users.create(user)?;
        tracing::info!("User registered successfully: {} ({})", user.email, user.id);

        Ok(RegisterResponse {
            user_id: user.id.to_string(),
            message: "Registration successful.".into(),
        })
    }

    /// Handle user login.
    ///
    /// # Errors
    ///
    /// Returns `AuthInvalid` for bad credentials, locked accounts, and
    /// deactivated users.
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AppError> {
        tracing::info!("User login attempt for email: {}", request.email);

        if self.resources.users.locked_until(&request.email).is_some() {
            return Err(AppError::auth_invalid(error_messages::ACCOUNT_LOCKED));
        }

        let Some(user) = self.resources.users.get_by_email(&request.email) else {
            self.resources.users.record_failed_login(&request.email);
            return Err(AppError::auth_invalid(error_messages::INVALID_CREDENTIALS));
        };

        // bcrypt runs on a blocking thread so it never stalls the async executor
        let password = request.password.clone();
        let password_hash = user.password_hash.clone();
        let is_valid = tokio::task::spawn_blocking(move || bcrypt::verify(&password, &password_hash))
            .await
            .map_err(|e| AppError::internal(format!("Password verification task failed: {e}")))?
            .map_err(|e| AppError::internal(format!("Password verification error: {e}")))?;

        if !is_valid {
            let failures = self.resources.users.record_failed_login(&request.email);
            tracing::warn!(
                "Invalid password for user: {} (failure {failures})",
                request.email
            );
            return Err(AppError::auth_invalid(error_messages::INVALID_CREDENTIALS));
        }

        if !user.is_active {
            return Err(AppError::auth_invalid("Account has been deactivated"));
        }

        self.resources.users.clear_failed_logins(&request.email);
        self.resources.users.update_last_login(user.id);

        let pair = self.resources.auth_manager.issue_token_pair(&user)?;
        tracing::info!("User logged in successfully: {} ({})", user.email, user.id);

        Ok(LoginResponse {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            expires_at: pair.expires_at.to_rfc3339(),
            user: UserInfo::from(&user),
        })
    }

    /// Handle token refresh: validates the refresh token and rotates the
    /// pair, returning a new access and refresh token.
    ///
    /// # Errors
    ///
    /// Returns `AuthInvalid` for invalid or expired refresh tokens and for
    /// deactivated users.
    pub fn refresh(&self, request: &RefreshTokenRequest) -> Result<LoginResponse, AppError> {
        let claims = self
            .resources
            .auth_manager
            .validate_refresh_token(&request.refresh_token)
            .map_err(|e| AppError::auth_invalid(format!("Invalid or expired refresh token: {e}")))?;

        let user_id = claims
            .user_id()
            .map_err(|e| AppError::auth_invalid(e.to_string()))?;

        let user = self
            .resources
            .users
            .get(user_id)
            .ok_or_else(|| AppError::auth_invalid("Invalid refresh token"))?;

        if !user.is_active {
            return Err(AppError::auth_invalid("Account has been deactivated"));
        }

        self.resources.users.update_last_login(user.id);
        let pair = self.resources.auth_manager.issue_token_pair(&user)?;
        tracing::info!("Token refreshed successfully for user: {}", user.id);

        Ok(LoginResponse {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            expires_at: pair.expires_at.to_rfc3339(),
            user: UserInfo::from(&user),
        })
    }

    /// Start the password reset flow. Always answers with the same message
    /// so email existence cannot be probed.
    ///
    /// # Errors
    ///
    /// Returns an internal error only if token hashing fails.
    pub fn forgot_password(&self, email: &str) -> Result<MessageResponse, AppError> {
        if let Some(user) = self.resources.users.get_by_email(email) {
            let raw_token = Self::generate_reset_token();
            let token_hash = bcrypt::hash(&raw_token, bcrypt::DEFAULT_COST)
                .map_err(|e| AppError::internal(format!("Token hashing failed: {e}")))?;

            self.resources.users.add_reset_token(PasswordResetToken {
                id: Uuid::new_v4(),
                user_id: user.id,
                token_hash,
                expires_at: Utc::now() + Duration::minutes(limits::PASSWORD_RESET_EXPIRY_MINUTES),
                used_at: None,
            });

            // Delivery is an external collaborator concern; the token is
            // logged at debug level for development only
            tracing::debug!("Password reset token for {email}: {raw_token}");
            tracing::info!("Password reset requested for user: {}", user.id);
        }

        Ok(MessageResponse {
            message: error_messages::RESET_REQUESTED.into(),
        })
    }

    /// Complete the password reset flow.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for unknown, expired, or already-used tokens
    /// and for weak replacement passwords.
    pub async fn reset_password(
        &self,
        request: ResetPasswordRequest,
    ) -> Result<MessageResponse, AppError> {
        if !Self::is_valid_password(&request.new_password) {
            return Err(AppError::invalid_input(error_messages::PASSWORD_TOO_WEAK));
        }

        let candidates = self.resources.users.valid_reset_tokens();
        let token = request.token.clone();

        // Token hashes are bcrypt, so matching means comparing against each
        // candidate on a blocking thread
        let matched = tokio::task::spawn_blocking(move || {
            candidates
                .into_iter()
                .find(|record| bcrypt::verify(&token, &record.token_hash).unwrap_or(false))
        })
        .await
        .map_err(|e| AppError::internal(format!("Token verification task failed: {e}")))?;

        let Some(record) = matched else {
            return Err(AppError::invalid_input("Invalid or expired reset token"));
        };

        let password_hash = bcrypt::hash(&request.new_password, limits::BCRYPT_COST)
            .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))?;

        self.resources
            .users
            .set_password_hash(record.user_id, password_hash);
        self.resources.users.mark_reset_token_used(record.id);

        tracing::info!("Password reset completed for user: {}", record.user_id);
        Ok(MessageResponse {
            message: "Password reset successful. You can now login with your new password.".into(),
        })
    }

    /// Validate email format
    #[must_use]
    pub fn is_valid_email(email: &str) -> bool {
        if email.len() <= 5 {
            return false;
        }
        let Some(at_pos) = email.find('@') else {
            return false;
        };
        if at_pos == 0 || at_pos == email.len() - 1 {
            return false;
        }
        email[at_pos + 1..].contains('.')
    }

    /// Validate password strength
    #[must_use]
    pub const fn is_valid_password(password: &str) -> bool {
        password.len() >= limits::MIN_PASSWORD_LENGTH
    }

    fn generate_reset_token() -> String {
        use rand::RngCore;
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        hex::encode(bytes)
    }
}

/// Authentication routes handler
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create all authentication routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/auth/register", post(Self::register))
            .route("/api/auth/login", post(Self::login))
            .route("/api/auth/refresh", post(Self::refresh))
            .route("/api/auth/logout", post(Self::logout))
            .route("/api/auth/me", get(Self::me))
            .route("/api/auth/forgot-password", post(Self::forgot_password))
            .route("/api/auth/reset-password", post(Self::reset_password))
            .with_state(resources)
    }

    async fn register(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<RegisterRequest>,
    ) -> Result<Response, AppError> {
        let response = AuthService::new(resources).register(request)?;
        Ok((StatusCode::CREATED, Json(response)).into_response())
    }

    async fn login(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<LoginRequest>,
    ) -> Result<Response, AppError> {
        let response = AuthService::new(resources).login(request).await?;
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    async fn refresh(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<RefreshTokenRequest>,
    ) -> Result<Response, AppError> {
        let response = AuthService::new(resources).refresh(&request)?;
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    async fn logout(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let user = super::authenticate(&headers, &resources)?;
        // Tokens are stateless; removal happens client-side
        tracing::info!("User logged out: {}", user.id);
        Ok((
            StatusCode::OK,
            Json(MessageResponse {
                message: "Logged out successfully".into(),
            }),
        )
            .into_response())
    }

    async fn me(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let user = super::authenticate(&headers, &resources)?;
        Ok((
            StatusCode::OK,
            Json(serde_json::json!({ "user": UserInfo::from(&user) })),
        )
            .into_response())
    }

    async fn forgot_password(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<ForgotPasswordRequest>,
    ) -> Result<Response, AppError> {
        let response = AuthService::new(resources).forgot_password(&request.email)?;
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    async fn reset_password(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<ResetPasswordRequest>,
    ) -> Result<Response, AppError> {
        let response = AuthService::new(resources).reset_password(request).await?;
        Ok((StatusCode::OK, Json(response)).into_response())
    }
}
