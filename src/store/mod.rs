// ABOUTME: In-memory stores for conversations, analyses, students, schools, and users
// ABOUTME: All state is injected through ServerResources; nothing is a process-wide global
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Growth Engine

//! # In-Memory Stores
//!
//! Process-lifetime storage for every entity the server manages. Each store
//! is a plain struct owned by `ServerResources` and shared via `Arc`;
//! mutation goes through the store API only. Data does not survive a
//! restart, which is the intended demo semantics; a database-backed
//! implementation would slot in behind the same APIs.

pub mod analyses;
pub mod conversations;
pub mod schools;
pub mod students;
pub mod users;

pub use analyses::{AnalysisResult, AnalysisStore, NewAnalysis};
pub use conversations::{ConversationState, ConversationStore};
pub use schools::SchoolStore;
pub use students::StudentStore;
pub use users::UserStore;
