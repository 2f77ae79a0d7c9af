// ABOUTME: Centralized resource container for dependency injection
// ABOUTME: Owns every shared store and service so no state is ambient or global
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Growth Engine

//! # Server Resources Module
//!
//! Centralized resource container for dependency injection. All stores are
//! plain injected instances created here exactly once; route handlers reach
//! them through this container, never through statics. That keeps the
//! in-memory, single-instance nature of the stores a visible property of the
//! wiring rather than an implicit assumption.

use std::sync::Arc;

use crate::analysis::AnalysisService;
use crate::auth::AuthManager;
use crate::config::ServerConfig;
use crate::errors::AppError;
use crate::llm::{LlmProvider, OpenAiProvider};
use crate::rate_limiting::RateLimiter;
use crate::store::{AnalysisStore, ConversationStore, SchoolStore, StudentStore, UserStore};

/// Centralized resource container for dependency injection
#[derive(Clone)]
pub struct ServerResources {
    /// Server configuration
    pub config: Arc<ServerConfig>,
    /// JWT token manager
    pub auth_manager: Arc<AuthManager>,
    /// Registered users
    pub users: Arc<UserStore>,
    /// Students
    pub students: Arc<StudentStore>,
    /// Schools
    pub schools: Arc<SchoolStore>,
    /// Active guided conversations
    pub conversations: Arc<ConversationStore>,
    /// Finalized analyses
    pub analyses: Arc<AnalysisStore>,
    /// LLM gateway
    pub llm: Arc<dyn LlmProvider>,
    /// Guided analysis orchestration
    pub analysis_service: Arc<AnalysisService>,
    /// Per-user chat throttle
    pub chat_rate_limiter: Arc<RateLimiter>,
}

impl ServerResources {
    /// Create all shared resources from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the LLM gateway's HTTP client cannot be built.
    pub fn new(config: ServerConfig) -> Result<Self, AppError> {
        let config = Arc::new(config);

        let provider = OpenAiProvider::new(config.openai.clone())?;
        tracing::info!(
            provider = provider.display_name(),
            configured = provider.is_configured(),
            capabilities = ?provider.capabilities(),
            "LLM gateway initialized"
        );
        let llm: Arc<dyn LlmProvider> = Arc::new(provider);

        let users = Arc::new(UserStore::new());
        let students = Arc::new(StudentStore::new());
        let schools = Arc::new(SchoolStore::new());
        let conversations = Arc::new(ConversationStore::new());
        let analyses = Arc::new(AnalysisStore::new());

        let analysis_service = Arc::new(AnalysisService::new(
            conversations.clone(),
            analyses.clone(),
            students.clone(),
            llm.clone(),
            config.conversation.system_prompt_path.clone(),
        ));

        Ok(Self {
            auth_manager: Arc::new(AuthManager::new(&config.auth)),
            users,
            students,
            schools,
            conversations,
            analyses,
            llm,
            analysis_service,
            chat_rate_limiter: Arc::new(RateLimiter::new(&config.rate_limit)),
            config,
        })
    }
}
