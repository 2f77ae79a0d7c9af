// ABOUTME: In-memory analysis results store with a per-student secondary index
// ABOUTME: Records are immutable once created and deletable by id
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Growth Engine

//! Analysis result storage.
//!
//! The primary map (id to record) and the per-student index are guarded by
//! one lock so they can never drift out of sync. Ids come from a store-local
//! counter; they restart from 1 with the process and are not globally
//! unique.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

use crate::llm::ChatMessage;

/// A finalized student analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Store-local identifier, stringified monotonic counter
    pub id: String,
    /// Subject student id
    pub student_id: String,
    /// Final natural-language report text (Hebrew markdown)
    pub analysis: String,
    /// Snapshot of the messages that produced the report
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_history: Option<Vec<ChatMessage>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Teacher user id that finalized the conversation
    pub created_by: String,
}

/// Fields supplied when creating a record; id and timestamp are assigned by
/// the store
#[derive(Debug, Clone)]
pub struct NewAnalysis {
    /// Subject student id
    pub student_id: String,
    /// Report text
    pub analysis: String,
    /// Optional conversation snapshot
    pub conversation_history: Option<Vec<ChatMessage>>,
    /// Creating user id
    pub created_by: String,
}

#[derive(Default)]
struct AnalysisStoreInner {
    analyses: HashMap<String, AnalysisResult>,
    by_student: HashMap<String, Vec<String>>,
    next_id: u64,
}

/// In-memory analysis store
#[derive(Default)]
pub struct AnalysisStore {
    inner: RwLock<AnalysisStoreInner>,
}

impl AnalysisStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new analysis result, assigning the next id and stamping the
    /// creation time, and index it under its student.
    pub fn create(&self, data: NewAnalysis) -> AnalysisResult {
        let mut inner = self.inner.write().unwrap_or_else(std::sync::PoisonError::into_inner);

        inner.next_id += 1;
        let id = inner.next_id.to_string();

        let analysis = AnalysisResult {
            id: id.clone(),
            student_id: data.student_id.clone(),
            analysis: data.analysis,
            conversation_history: data.conversation_history,
            created_at: Utc::now(),
            created_by: data.created_by,
        };

        inner.analyses.insert(id.clone(), analysis.clone());
        inner
            .by_student
            .entry(data.student_id)
            .or_default()
            .push(id);

        analysis
    }

    /// All records, or records for one student, sorted by `created_at`
    /// descending. Ties break toward the later insertion (higher id first).
    #[must_use]
    pub fn get_all(&self, student_id: Option<&str>) -> Vec<AnalysisResult> {
        let inner = self.inner.read().unwrap_or_else(std::sync::PoisonError::into_inner);

        let mut results: Vec<AnalysisResult> = match student_id {
            Some(student_id) => inner
                .by_student
                .get(student_id)
                .map(|ids| {
                    ids.iter()
                        // Defensive: skip ids the index still carries but the
                        // primary map no longer holds
                        .filter_map(|id| inner.analyses.get(id).cloned())
                        .collect()
                })
                .unwrap_or_default(),
            None => inner.analyses.values().cloned().collect(),
        };

        results.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| numeric_id(&b.id).cmp(&numeric_id(&a.id)))
        });
        results
    }

    /// Look up one record by id
    #[must_use]
    pub fn get_by_id(&self, id: &str) -> Option<AnalysisResult> {
        let inner = self.inner.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.analyses.get(id).cloned()
    }

    /// All records for a student, newest first
    #[must_use]
    pub fn get_by_student_id(&self, student_id: &str) -> Vec<AnalysisResult> {
        self.get_all(Some(student_id))
    }

    /// The most recent record for a student
    #[must_use]
    pub fn get_latest_by_student_id(&self, student_id: &str) -> Option<AnalysisResult> {
        self.get_by_student_id(student_id).into_iter().next()
    }

    /// Delete a record by id, removing it from the primary map and the
    /// per-student index. Returns false for unknown ids.
    pub fn delete(&self, id: &str) -> bool {
        let mut inner = self.inner.write().unwrap_or_else(std::sync::PoisonError::into_inner);

        let Some(analysis) = inner.analyses.remove(id) else {
            return false;
        };

        if let Some(ids) = inner.by_student.get_mut(&analysis.student_id) {
            ids.retain(|existing| existing != id);
            if ids.is_empty() {
                inner.by_student.remove(&analysis.student_id);
            }
        }
        true
    }

    /// Number of stored records
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .analyses
            .len()
    }

    /// Whether the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn numeric_id(id: &str) -> u64 {
    id.parse().unwrap_or(0)
}
