// ABOUTME: Common data models for users, students, schools, and password reset tokens
// ABOUTME: Relational-shaped records held by the in-memory stores
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Growth Engine

//! Core data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of a user within a school
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Classroom teacher; records observations and runs analyses
    Teacher,
    /// School principal; teacher permissions plus school-level views
    Principal,
    /// Platform administrator; maintenance operations
    Admin,
}

impl UserRole {
    /// Whether this role may invoke administrative maintenance endpoints
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// String form used inside JWT claims
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Teacher => "TEACHER",
            Self::Principal => "PRINCIPAL",
            Self::Admin => "ADMIN",
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TEACHER" => Ok(Self::Teacher),
            "PRINCIPAL" => Ok(Self::Principal),
            "ADMIN" => Ok(Self::Admin),
            other => Err(format!("unknown user role: {other}")),
        }
    }
}

/// How the user authenticates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthProvider {
    /// Email and password
    Email,
    /// Google OAuth (account linkage only; the flow itself is external)
    Google,
    /// Microsoft OAuth (account linkage only; the flow itself is external)
    Microsoft,
}

/// A registered user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: Uuid,
    /// Login email, unique across the store
    pub email: String,
    /// bcrypt password hash; never serialized to clients
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Role within the school
    pub role: UserRole,
    /// Authentication method
    pub auth_provider: AuthProvider,
    /// School this user belongs to, when known
    pub school_id: Option<String>,
    /// Deactivated users cannot log in
    pub is_active: bool,
    /// Email verification state
    pub email_verified: bool,
    /// Last successful login
    pub last_login_at: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new active email/password user with the default teacher role
    #[must_use]
    pub fn new(
        email: String,
        password_hash: String,
        first_name: String,
        last_name: String,
        school_id: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            password_hash,
            first_name,
            last_name,
            role: UserRole::Teacher,
            auth_provider: AuthProvider::Email,
            school_id,
            is_active: true,
            // No mailer collaborator exists, so accounts are usable immediately
            email_verified: true,
            last_login_at: None,
            created_at: Utc::now(),
        }
    }

    /// Set a non-default role
    #[must_use]
    pub const fn with_role(mut self, role: UserRole) -> Self {
        self.role = role;
        self
    }

    /// Display name for logs and responses
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A student a teacher can analyze
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    /// Store-local identifier, stringified monotonic counter
    pub id: String,
    /// Full display name
    pub name: String,
    /// Grade label, e.g. "כיתה ג׳"
    pub grade: String,
    /// Homeroom / class label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// A school
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct School {
    /// Store-local identifier
    pub id: String,
    /// Unique registration code, e.g. "TLV-HS-01"
    pub code: String,
    /// School name
    pub name: String,
    /// Postal address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// A password reset token record. The raw token is never stored; only its
/// bcrypt hash is kept, and the record is invalidated on first use.
#[derive(Debug, Clone)]
pub struct PasswordResetToken {
    /// Record identifier
    pub id: Uuid,
    /// User the token belongs to
    pub user_id: Uuid,
    /// bcrypt hash of the raw token
    pub token_hash: String,
    /// Expiry instant
    pub expires_at: DateTime<Utc>,
    /// Set when the token is consumed
    pub used_at: Option<DateTime<Utc>>,
}

impl PasswordResetToken {
    /// Whether the token can still be redeemed
    #[must_use]
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.used_at.is_none() && self.expires_at >= now
    }
}
