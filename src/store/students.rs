// ABOUTME: In-memory student store with CRUD operations
// ABOUTME: Backs the students API and the conversation manager's name lookup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Growth Engine

//! Student storage.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::models::Student;

/// Fields accepted when updating a student; `None` leaves the field as-is
#[derive(Debug, Clone, Default)]
pub struct StudentUpdate {
    /// New display name
    pub name: Option<String>,
    /// New grade label
    pub grade: Option<String>,
    /// New class label
    pub class: Option<String>,
}

#[derive(Default)]
struct StudentStoreInner {
    students: HashMap<String, Student>,
    next_id: u64,
}

/// In-memory student store
#[derive(Default)]
pub struct StudentStore {
    inner: RwLock<StudentStoreInner>,
}

impl StudentStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new student, assigning the next id
    pub fn create(&self, name: String, grade: String, class: Option<String>) -> Student {
        let mut inner = self.inner.write().unwrap_or_else(std::sync::PoisonError::into_inner);

        inner.next_id += 1;
        let student = Student {
            id: inner.next_id.to_string(),
            name,
            grade,
            class,
            created_at: Utc::now(),
        };
        inner.students.insert(student.id.clone(), student.clone());
        student
    }

    /// All students, ordered by id
    #[must_use]
    pub fn get_all(&self) -> Vec<Student> {
        let inner = self.inner.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut students: Vec<Student> = inner.students.values().cloned().collect();
        students.sort_by_key(|s| s.id.parse::<u64>().unwrap_or(0));
        students
    }

    /// Look up a student by id
    #[must_use]
    pub fn get_by_id(&self, id: &str) -> Option<Student> {
        let inner = self.inner.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.students.get(id).cloned()
    }

    /// Apply a partial update; returns the updated record or `None` for an
    /// unknown id
    pub fn update(&self, id: &str, update: StudentUpdate) -> Option<Student> {
        let mut inner = self.inner.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        let student = inner.students.get_mut(id)?;

        if let Some(name) = update.name {
            student.name = name;
        }
        if let Some(grade) = update.grade {
            student.grade = grade;
        }
        if let Some(class) = update.class {
            student.class = Some(class);
        }
        Some(student.clone())
    }

    /// Delete a student by id
    pub fn delete(&self, id: &str) -> bool {
        let mut inner = self.inner.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.students.remove(id).is_some()
    }

    /// Number of students
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .students
            .len()
    }

    /// Whether the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_create_and_get() {
        let store = StudentStore::new();
        let student = store.create("שרה כהן".into(), "כיתה ג׳".into(), Some("גב׳ לוי".into()));
        assert_eq!(student.id, "1");

        let loaded = store.get_by_id("1").unwrap();
        assert_eq!(loaded.name, "שרה כהן");
        assert_eq!(loaded.class.as_deref(), Some("גב׳ לוי"));
    }

    #[test]
    fn test_update_partial() {
        let store = StudentStore::new();
        store.create("Dana".into(), "3".into(), None);

        let updated = store
            .update(
                "1",
                StudentUpdate {
                    grade: Some("4".into()),
                    ..StudentUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(updated.name, "Dana");
        assert_eq!(updated.grade, "4");

        assert!(store.update("99", StudentUpdate::default()).is_none());
    }

    #[test]
    fn test_delete() {
        let store = StudentStore::new();
        store.create("Dana".into(), "3".into(), None);
        assert!(store.delete("1"));
        assert!(!store.delete("1"));
        assert!(store.get_by_id("1").is_none());
    }

    #[test]
    fn test_get_all_ordered() {
        let store = StudentStore::new();
        for name in ["a", "b", "c"] {
            store.create(name.into(), "3".into(), None);
        }
        let all = store.get_all();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].name, "a");
        assert_eq!(all[2].name, "c");
    }
}
