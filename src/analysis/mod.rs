// ABOUTME: Guided analysis conversation management
// ABOUTME: Orchestrates the fixed six-question interview and its finalization
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Growth Engine

//! Guided analysis conversation manager.

mod manager;

pub use manager::{
    AdvanceOutcome, AnalysisService, CompleteOutcome, ConversationMetadata, ReplySource,
    StartOutcome,
};
