// ABOUTME: In-memory school store keyed by id with unique registration codes
// ABOUTME: Backs the schools API used during registration and administration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Growth Engine

//! School storage.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::errors::AppError;
use crate::models::School;

#[derive(Default)]
struct SchoolStoreInner {
    schools: HashMap<String, School>,
    next_id: u64,
}

/// In-memory school store
#[derive(Default)]
pub struct SchoolStore {
    inner: RwLock<SchoolStoreInner>,
}

impl SchoolStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new school.
    ///
    /// # Errors
    ///
    /// Returns a conflict error when the registration code is already taken.
    pub fn create(
        &self,
        code: String,
        name: String,
        address: Option<String>,
    ) -> Result<School, AppError> {
        let mut inner = self.inner.write().unwrap_or_else(std::sync::PoisonError::into_inner);

        if inner.schools.values().any(|s| s.code == code) {
            return Err(AppError::already_exists(format!(
                "School with code {code} already exists"
            )));
        }

        inner.next_id += 1;
        let school = School {
            id: inner.next_id.to_string(),
            code,
            name,
            address,
            created_at: Utc::now(),
        };
        inner.schools.insert(school.id.clone(), school.clone());
        Ok(school)
    }

    /// All schools, ordered by id
    #[must_use]
    pub fn get_all(&self) -> Vec<School> {
        let inner = self.inner.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut schools: Vec<School> = inner.schools.values().cloned().collect();
        schools.sort_by_key(|s| s.id.parse::<u64>().unwrap_or(0));
        schools
    }

    /// Look up a school by id
    #[must_use]
    pub fn get_by_id(&self, id: &str) -> Option<School> {
        let inner = self.inner.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.schools.get(id).cloned()
    }

    /// Look up a school by registration code
    #[must_use]
    pub fn get_by_code(&self, code: &str) -> Option<School> {
        let inner = self.inner.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.schools.values().find(|s| s.code == code).cloned()
    }

    /// Whether the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .schools
            .is_empty()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_create_and_lookup() {
        let store = SchoolStore::new();
        let school = store
            .create("TLV-HS-01".into(), "Tel Aviv High School".into(), None)
            .unwrap();
        assert_eq!(school.id, "1");

        assert_eq!(store.get_by_id("1").unwrap().name, "Tel Aviv High School");
        assert_eq!(store.get_by_code("TLV-HS-01").unwrap().id, "1");
        assert!(store.get_by_code("OTHER").is_none());
    }

    #[test]
    fn test_duplicate_code_rejected() {
        let store = SchoolStore::new();
        store
            .create("TLV-HS-01".into(), "First".into(), None)
            .unwrap();
        let error = store
            .create("TLV-HS-01".into(), "Second".into(), None)
            .unwrap_err();
        assert_eq!(error.code, crate::errors::ErrorCode::ResourceAlreadyExists);
    }
}
