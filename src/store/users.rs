// ABOUTME: In-memory user store with email index, lockout tracking, and reset tokens
// ABOUTME: Backs registration, login, and the password reset flow
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Growth Engine

//! User storage.
//!
//! Holds registered users (indexed by id and email), failed-login counters
//! for account lockout, and password reset token records. Reset tokens are
//! stored as bcrypt hashes only; matching a presented token against them is
//! the auth service's job.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use crate::constants::limits;
use crate::errors::AppError;
use crate::models::{PasswordResetToken, User};

/// Failed-login tracking per email
#[derive(Debug, Clone)]
struct FailedLoginState {
    count: u32,
    locked_until: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct UserStoreInner {
    by_id: HashMap<Uuid, User>,
    by_email: HashMap<String, Uuid>,
}

/// In-memory user store
#[derive(Default)]
pub struct UserStore {
    inner: RwLock<UserStoreInner>,
    reset_tokens: RwLock<Vec<PasswordResetToken>>,
    failed_logins: DashMap<String, FailedLoginState>,
}

impl UserStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new user.
    ///
    /// # Errors
    ///
    /// Returns a conflict error when the email is already registered.
    pub fn create(&self, user: User) -> Result<User, AppError> {
        let mut inner = self.inner.write().unwrap_or_else(std::sync::PoisonError::into_inner);

        let email_key = user.email.to_lowercase();
        if inner.by_email.contains_key(&email_key) {
            return Err(AppError::already_exists(
                "User with this email already exists",
            ));
        }

        inner.by_email.insert(email_key, user.id);
        inner.by_id.insert(user.id, user.clone());
        Ok(user)
    }

    /// Look up a user by id
    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<User> {
        let inner = self.inner.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.by_id.get(&id).cloned()
    }

    /// Look up a user by email (case-insensitive)
    #[must_use]
    pub fn get_by_email(&self, email: &str) -> Option<User> {
        let inner = self.inner.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner
            .by_email
            .get(&email.to_lowercase())
            .and_then(|id| inner.by_id.get(id))
            .cloned()
    }

    /// Stamp a successful login
    pub fn update_last_login(&self, id: Uuid) {
        let mut inner = self.inner.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(user) = inner.by_id.get_mut(&id) {
            user.last_login_at = Some(Utc::now());
        }
    }

    /// Replace a user's password hash
    pub fn set_password_hash(&self, id: Uuid, password_hash: String) {
        let mut inner = self.inner.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(user) = inner.by_id.get_mut(&id) {
            user.password_hash = password_hash;
        }
    }

    /// Number of registered users
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .by_id
            .len()
    }

    /// Whether the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ========================================================================
    // Account lockout
    // ========================================================================

    /// When the account is currently locked, returns the unlock instant
    #[must_use]
    pub fn locked_until(&self, email: &str) -> Option<DateTime<Utc>> {
        let state = self.failed_logins.get(&email.to_lowercase())?;
        state.locked_until.filter(|until| *until > Utc::now())
    }

    /// Record a failed login attempt; locks the account once the attempt
    /// budget is exhausted. Returns the updated failure count.
    pub fn record_failed_login(&self, email: &str) -> u32 {
        let mut entry = self
            .failed_logins
            .entry(email.to_lowercase())
            .or_insert(FailedLoginState {
                count: 0,
                locked_until: None,
            });
        entry.count += 1;
        if entry.count >= limits::MAX_FAILED_LOGIN_ATTEMPTS {
            entry.locked_until =
                Some(Utc::now() + Duration::minutes(limits::LOGIN_LOCKOUT_MINUTES));
        }
        entry.count
    }

    /// Clear failed-login state after a successful authentication
    pub fn clear_failed_logins(&self, email: &str) {
        self.failed_logins.remove(&email.to_lowercase());
    }

    // ========================================================================
    // Password reset tokens
    // ========================================================================

    /// Store a new reset token record
    pub fn add_reset_token(&self, token: PasswordResetToken) {
        let mut tokens = self
            .reset_tokens
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        tokens.push(token);
    }

    /// All redeemable (unused, unexpired) reset token records
    #[must_use]
    pub fn valid_reset_tokens(&self) -> Vec<PasswordResetToken> {
        let now = Utc::now();
        let tokens = self
            .reset_tokens
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        tokens.iter().filter(|t| t.is_valid(now)).cloned().collect()
    }

    /// Mark a reset token as consumed
    pub fn mark_reset_token_used(&self, token_id: Uuid) {
        let mut tokens = self
            .reset_tokens
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(token) = tokens.iter_mut().find(|t| t.id == token_id) {
            token.used_at = Some(Utc::now());
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn test_user(email: &str) -> User {
        User::new(
            email.into(),
            "hash".into(),
            "Demo".into(),
            "Teacher".into(),
            None,
        )
    }

    #[test]
    fn test_create_and_lookup() {
        let store = UserStore::new();
        let user = store.create(test_user("teacher@example.com")).unwrap();

        assert_eq!(store.get(user.id).unwrap().email, "teacher@example.com");
        assert_eq!(
            store.get_by_email("Teacher@Example.Com").unwrap().id,
            user.id
        );
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let store = UserStore::new();
        store.create(test_user("a@example.com")).unwrap();
        let error = store.create(test_user("A@example.com")).unwrap_err();
        assert_eq!(error.code, crate::errors::ErrorCode::ResourceAlreadyExists);
    }

    #[test]
    fn test_lockout_after_repeated_failures() {
        let store = UserStore::new();
        let email = "teacher@example.com";

        for _ in 0..limits::MAX_FAILED_LOGIN_ATTEMPTS - 1 {
            store.record_failed_login(email);
            assert!(store.locked_until(email).is_none());
        }
        store.record_failed_login(email);
        assert!(store.locked_until(email).is_some());

        store.clear_failed_logins(email);
        assert!(store.locked_until(email).is_none());
    }

    #[test]
    fn test_reset_token_lifecycle() {
        let store = UserStore::new();
        let user = store.create(test_user("t@example.com")).unwrap();

        let token = PasswordResetToken {
            id: Uuid::new_v4(),
            user_id: user.id,
            token_hash: "hash".into(),
            expires_at: Utc::now() + Duration::minutes(60),
            used_at: None,
        };
        let token_id = token.id;
        store.add_reset_token(token);

        assert_eq!(store.valid_reset_tokens().len(), 1);
        store.mark_reset_token_used(token_id);
        assert!(store.valid_reset_tokens().is_empty());
    }

    #[test]
    fn test_set_password_hash() {
        let store = UserStore::new();
        let user = store.create(test_user("t@example.com")).unwrap();
        store.set_password_hash(user.id, "new-hash".into());
        assert_eq!(store.get(user.id).unwrap().password_hash, "new-hash");
    }
}
