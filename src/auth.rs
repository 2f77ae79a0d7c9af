// ABOUTME: JWT-based user authentication with access and refresh token pairs
// ABOUTME: Handles token generation, validation, and rotation for the HTTP API
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Growth Engine

//! # Authentication and Token Management
//!
//! HS256 JWT access tokens (short-lived) plus refresh tokens (long-lived,
//! separate secret and audience). Refreshing rotates the pair: both a new
//! access token and a new refresh token are issued.

use crate::config::AuthConfig;
use crate::constants::service_names;
use crate::models::{User, UserRole};
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// `JWT` validation error with detailed information
#[derive(Debug, Clone)]
pub enum JwtValidationError {
    /// Token has expired
    TokenExpired {
        /// When the token expired
        expired_at: DateTime<Utc>,
        /// Current time for reference
        current_time: DateTime<Utc>,
    },
    /// Token signature is invalid
    TokenInvalid {
        /// Reason for invalidity
        reason: String,
    },
    /// Token is malformed (not proper `JWT` format)
    TokenMalformed {
        /// Details about malformation
        details: String,
    },
}

impl std::fmt::Display for JwtValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TokenExpired {
                expired_at,
                current_time,
            } => {
                let expired_for = current_time.signed_duration_since(*expired_at);
                if expired_for.num_minutes() < 60 {
                    write!(
                        f,
                        "JWT token expired {} minutes ago at {}",
                        expired_for.num_minutes(),
                        expired_at.format("%Y-%m-%d %H:%M:%S UTC")
                    )
                } else {
                    write!(
                        f,
                        "JWT token expired {} hours ago at {}",
                        expired_for.num_hours(),
                        expired_at.format("%Y-%m-%d %H:%M:%S UTC")
                    )
                }
            }
            Self::TokenInvalid { reason } => {
                write!(f, "JWT token signature is invalid: {reason}")
            }
            Self::TokenMalformed { details } => {
                write!(f, "JWT token is malformed: {details}")
            }
        }
    }
}

impl std::error::Error for JwtValidationError {}

/// `JWT` claims for user authentication
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User `ID`
    pub sub: String,
    /// User email
    pub email: String,
    /// User role (TEACHER, PRINCIPAL, ADMIN)
    pub role: String,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
    /// Audience (access vs refresh)
    pub aud: String,
}

impl Claims {
    /// Parse the subject claim as a user id
    ///
    /// # Errors
    ///
    /// Returns an error if the subject is not a valid UUID.
    pub fn user_id(&self) -> Result<Uuid, JwtValidationError> {
        Uuid::parse_str(&self.sub).map_err(|e| JwtValidationError::TokenMalformed {
            details: format!("Token subject is not a valid user id: {e}"),
        })
    }

    /// Parse the role claim
    ///
    /// # Errors
    ///
    /// Returns an error if the role is unknown.
    pub fn user_role(&self) -> Result<UserRole, JwtValidationError> {
        self.role
            .parse()
            .map_err(|e: String| JwtValidationError::TokenMalformed { details: e })
    }
}

/// A freshly issued access/refresh token pair
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    /// Short-lived bearer token
    pub access_token: String,
    /// Long-lived rotation token
    pub refresh_token: String,
    /// Access token expiry
    pub expires_at: DateTime<Utc>,
}

/// Authentication manager for `JWT` tokens
pub struct AuthManager {
    access_secret: Vec<u8>,
    refresh_secret: Vec<u8>,
    access_expiry: Duration,
    refresh_expiry: Duration,
    /// Monotonic counter to ensure unique issued-at values for tokens
    token_counter: AtomicU64,
}

impl AuthManager {
    /// Create a new authentication manager from configuration
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            access_secret: config.jwt_secret.as_bytes().to_vec(),
            refresh_secret: config.jwt_refresh_secret.as_bytes().to_vec(),
            access_expiry: Duration::hours(config.access_token_expiry_hours),
            refresh_expiry: Duration::days(config.refresh_token_expiry_days),
            token_counter: AtomicU64::new(0),
        }
    }

    /// Generate an access/refresh token pair for a user.
    ///
    /// # Errors
    ///
    /// Returns an error if JWT encoding fails.
    pub fn issue_token_pair(&self, user: &User) -> Result<TokenPair> {
        let expires_at = Utc::now() + self.access_expiry;
        Ok(TokenPair {
            access_token: self.generate_token(
                user,
                service_names::GROWTH_ENGINE,
                self.access_expiry,
                &self.access_secret,
            )?,
            refresh_token: self.generate_token(
                user,
                service_names::GROWTH_ENGINE_REFRESH,
                self.refresh_expiry,
                &self.refresh_secret,
            )?,
            expires_at,
        })
    }

    /// Validate an access token with detailed error information.
    ///
    /// # Errors
    ///
    /// Returns a [`JwtValidationError`] describing whether the token is
    /// expired, invalid, or malformed.
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, JwtValidationError> {
        Self::validate(token, service_names::GROWTH_ENGINE, &self.access_secret)
    }

    /// Validate a refresh token with detailed error information.
    ///
    /// # Errors
    ///
    /// Returns a [`JwtValidationError`] describing whether the token is
    /// expired, invalid, or malformed.
    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims, JwtValidationError> {
        Self::validate(
            token,
            service_names::GROWTH_ENGINE_REFRESH,
            &self.refresh_secret,
        )
    }

    fn generate_token(
        &self,
        user: &User,
        audience: &str,
        expiry: Duration,
        secret: &[u8],
    ) -> Result<String> {
        let now = Utc::now();

        // Atomic counter keeps issued-at values unique so two tokens minted
        // in the same second never collide byte-for-byte
        let counter = self.token_counter.fetch_add(1, Ordering::Relaxed);
        let unique_iat =
            now.timestamp() * 1000 + i64::from(u32::try_from(counter % 1000).unwrap_or(0));

        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role.as_str().to_owned(),
            iat: unique_iat,
            exp: (now + expiry).timestamp(),
            aud: audience.to_owned(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret),
        )?;
        Ok(token)
    }

    /// Decode claims without expiration validation, then check expiry by hand
    /// so expired tokens get a distinct, precise error.
    fn validate(
        token: &str,
        audience: &str,
        secret: &[u8],
    ) -> Result<Claims, JwtValidationError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_audience(&[audience]);

        let claims = decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)
            .map(|data| data.claims)
            .map_err(|e| Self::convert_jwt_error(&e))?;

        let current_time = Utc::now();
        if current_time.timestamp() > claims.exp {
            let expired_at = DateTime::from_timestamp(claims.exp, 0).unwrap_or_else(Utc::now);
            tracing::warn!(
                "JWT token expired for user {} at {}",
                claims.sub,
                expired_at.to_rfc3339()
            );
            return Err(JwtValidationError::TokenExpired {
                expired_at,
                current_time,
            });
        }

        Ok(claims)
    }

    /// Convert JWT library errors to detailed validation errors
    fn convert_jwt_error(e: &jsonwebtoken::errors::Error) -> JwtValidationError {
        use jsonwebtoken::errors::ErrorKind;

        match e.kind() {
            ErrorKind::InvalidSignature => JwtValidationError::TokenInvalid {
                reason: "Token signature verification failed".into(),
            },
            ErrorKind::InvalidAudience => JwtValidationError::TokenInvalid {
                reason: "Token audience mismatch".into(),
            },
            ErrorKind::InvalidToken => JwtValidationError::TokenMalformed {
                details: "Token format is invalid".into(),
            },
            ErrorKind::Base64(base64_err) => JwtValidationError::TokenMalformed {
                details: format!("Token contains invalid base64: {base64_err}"),
            },
            ErrorKind::Json(json_err) => JwtValidationError::TokenMalformed {
                details: format!("Token contains invalid JSON: {json_err}"),
            },
            _ => JwtValidationError::TokenInvalid {
                reason: format!("Token validation failed: {e}"),
            },
        }
    }
}
