// ABOUTME: Conversation manager driving the fixed six-question guided interview
// ABOUTME: Coordinates the LLM gateway, template fallback, and analysis finalization
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Growth Engine

//! # Guided Analysis Conversation Manager
//!
//! Drives a fixed-length, question-driven chat between a teacher and the AI
//! model about one student:
//!
//! - `start` creates the conversation, seeded with the system prompt and a
//!   hand-authored first question.
//! - `advance` appends the teacher's message, obtains a reply from the LLM
//!   gateway (or the template fallback), and advances the question counter.
//!   The conversation completes once six assistant turns have happened; the
//!   client may offer completion earlier, at four.
//! - `complete` takes the most recent assistant message verbatim as the
//!   final report and hands it to the analysis store. There is no separate
//!   summarization call.
//!
//! Each conversation's read-modify-write section runs under that
//! conversation's mutation lock, so concurrent requests against the same id
//! are serialized instead of silently losing turns.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::constants::limits;
use crate::errors::{AppError, ErrorCode};
use crate::llm::{self, prompts, ChatMessage, ChatRequest, LlmProvider};
use crate::store::{AnalysisStore, ConversationState, ConversationStore, NewAnalysis, StudentStore};

/// Where a reply came from. Exposed to callers so a canned fallback is
/// distinguishable from a real model response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplySource {
    /// Generated by the LLM gateway
    Ai,
    /// Served from the canned question bank
    Template,
}

/// Result of starting a conversation
#[derive(Debug, Clone, Serialize)]
pub struct StartOutcome {
    /// New conversation id
    pub conversation_id: Uuid,
    /// First assistant message
    pub message: String,
}

/// Counters reported with every advance
#[derive(Debug, Clone, Serialize)]
pub struct ConversationMetadata {
    /// Assistant turns so far
    pub question_count: u32,
    /// Total messages including the system prompt
    pub message_count: usize,
    /// Whether the client may offer early completion (distinct, lower gate
    /// than `is_complete`)
    pub can_complete: bool,
}

/// Result of one conversation turn
#[derive(Debug, Clone, Serialize)]
pub struct AdvanceOutcome {
    /// Assistant reply
    pub message: String,
    /// Whether the interview reached its final question
    pub is_complete: bool,
    /// Reply provenance
    pub source: ReplySource,
    /// Turn counters
    pub metadata: ConversationMetadata,
}

/// Result of finalizing a conversation
#[derive(Debug, Clone, Serialize)]
pub struct CompleteOutcome {
    /// Stored analysis id
    pub analysis_id: String,
    /// Subject student id
    pub student_id: String,
    /// Storage timestamp
    pub completed_at: DateTime<Utc>,
}

/// Orchestrates guided-analysis conversations
pub struct AnalysisService {
    conversations: Arc<ConversationStore>,
    analyses: Arc<AnalysisStore>,
    students: Arc<StudentStore>,
    provider: Arc<dyn LlmProvider>,
    system_prompt_path: Option<PathBuf>,
}

impl AnalysisService {
    /// Create the service from its collaborators
    #[must_use]
    pub fn new(
        conversations: Arc<ConversationStore>,
        analyses: Arc<AnalysisStore>,
        students: Arc<StudentStore>,
        provider: Arc<dyn LlmProvider>,
        system_prompt_path: Option<PathBuf>,
    ) -> Self {
        Self {
            conversations,
            analyses,
            students,
            provider,
            system_prompt_path,
        }
    }

    /// Start a new conversation for a student.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when the student id does not resolve.
    pub fn start(&self, student_id: &str) -> Result<StartOutcome, AppError> {
        let student = self
            .students
            .get_by_id(student_id)
            .ok_or_else(|| AppError::not_found("Student"))?;

        let system_prompt =
            prompts::load_system_prompt(self.system_prompt_path.as_deref(), &student.name);
        let first_message = prompts::first_question(&student.name);

        let mut conversation = ConversationState::new(student.id, student.name.clone());
        conversation.messages.push(ChatMessage::system(system_prompt));
        conversation
            .messages
            .push(ChatMessage::assistant(first_message.clone()));
        conversation.question_count = 1;

        let conversation_id = conversation.id;
        self.conversations.insert(conversation);

        info!(%conversation_id, student = %student.name, "Started guided analysis conversation");

        Ok(StartOutcome {
            conversation_id,
            message: first_message,
        })
    }

    /// Advance a conversation with one teacher message.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty message (before any state
    /// mutation), `ResourceNotFound` for an unknown conversation,
    /// `ExternalRateLimited` when the upstream throttles us, and
    /// `ExternalServiceError` for other upstream failures.
    pub async fn advance(
        &self,
        conversation_id: Uuid,
        message: &str,
    ) -> Result<AdvanceOutcome, AppError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(AppError::invalid_input("Message required"));
        }

        // Serialize turns per conversation: hold the id's lock across the
        // whole read-modify-write section, including the upstream call
        let lock = self.conversations.mutation_lock(conversation_id);
        let _guard = lock.lock().await;

        let mut conversation = self
            .conversations
            .get(conversation_id)
            .ok_or_else(|| AppError::not_found("Conversation"))?;

        conversation.messages.push(ChatMessage::user(message));

        let (reply, source) = self.generate_reply(&conversation).await?;

        conversation
            .messages
            .push(ChatMessage::assistant(reply.clone()));
        conversation.question_count += 1;
        if conversation.question_count >= limits::COMPLETE_AFTER_QUESTIONS {
            conversation.is_complete = true;
        }

        let outcome = AdvanceOutcome {
            message: reply,
            is_complete: conversation.is_complete,
            source,
            metadata: ConversationMetadata {
                question_count: conversation.question_count,
                message_count: conversation.messages.len(),
                can_complete: conversation.question_count
                    >= limits::SUGGEST_COMPLETE_AFTER_QUESTIONS,
            },
        };

        self.conversations.insert(conversation);
        Ok(outcome)
    }

    /// Finalize a conversation into a stored analysis.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` for an unknown conversation and
    /// `InvalidInput` when no assistant message exists yet.
    pub async fn complete(
        &self,
        conversation_id: Uuid,
        created_by: Uuid,
    ) -> Result<CompleteOutcome, AppError> {
        let lock = self.conversations.mutation_lock(conversation_id);
        let _guard = lock.lock().await;

        let conversation = self
            .conversations
            .get(conversation_id)
            .ok_or_else(|| AppError::not_found("Conversation"))?;

        // The most recent assistant message becomes the report verbatim;
        // there is no separate summarization call
        let final_message = conversation
            .last_assistant_message()
            .ok_or_else(|| AppError::invalid_input("No analysis generated yet"))?
            .to_owned();

        let result = self.analyses.create(NewAnalysis {
            student_id: conversation.student_id.clone(),
            analysis: final_message,
            conversation_history: Some(conversation.messages.clone()),
            created_by: created_by.to_string(),
        });

        info!(
            %conversation_id,
            analysis_id = %result.id,
            student_id = %result.student_id,
            "Guided analysis finalized"
        );

        Ok(CompleteOutcome {
            analysis_id: result.id,
            student_id: result.student_id,
            completed_at: result.created_at,
        })
    }

    /// Evict conversations older than `max_age_hours`, returning the count
    /// removed. Invoked by the admin maintenance endpoint; never scheduled.
    #[must_use]
    pub fn evict_stale_conversations(&self, max_age_hours: i64) -> usize {
        let cleared = self
            .conversations
            .clear_older_than(Duration::hours(max_age_hours));
        if cleared > 0 {
            info!(cleared, max_age_hours, "Evicted stale conversations");
        }
        cleared
    }

    /// Produce the assistant reply for the current turn, choosing between
    /// the LLM gateway and the template fallback.
    async fn generate_reply(
        &self,
        conversation: &ConversationState,
    ) -> Result<(String, ReplySource), AppError> {
        if !self.provider.is_configured() {
            debug!("LLM gateway not configured, using template replies");
            return Ok((
                prompts::template_reply(conversation.question_count, &conversation.student_name),
                ReplySource::Template,
            ));
        }

        let window =
            llm::truncate_history(&conversation.messages, limits::HISTORY_WINDOW_MESSAGES);

        match self.provider.complete(&ChatRequest::new(window)).await {
            Ok(response) => {
                debug!(
                    conversation_id = %conversation.id,
                    message_count = conversation.messages.len(),
                    model = %response.model,
                    "Chat completion succeeded"
                );
                Ok((response.content, ReplySource::Ai))
            }
            // Upstream throttling propagates to the caller as 429
            Err(e) if e.code == ErrorCode::ExternalRateLimited => Err(e),
            // Key/config problems degrade to the canned questions instead of
            // failing the request; provenance is reported via `source`
            Err(e) if e.code == ErrorCode::ExternalAuthFailed => {
                warn!("LLM gateway credentials rejected, falling back to template replies: {e}");
                Ok((
                    prompts::template_reply(
                        conversation.question_count,
                        &conversation.student_name,
                    ),
                    ReplySource::Template,
                ))
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::errors::ErrorCode;
    use crate::llm::{ChatResponse, LlmCapabilities};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Scripted provider: pops the next canned result per call
    struct ScriptedProvider {
        configured: bool,
        replies: Mutex<Vec<Result<String, AppError>>>,
    }

    impl ScriptedProvider {
        fn unconfigured() -> Self {
            Self {
                configured: false,
                replies: Mutex::new(Vec::new()),
            }
        }

        fn with_replies(replies: Vec<Result<String, AppError>>) -> Self {
            Self {
                configured: true,
                replies: Mutex::new(replies),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &'static str {
            "scripted"
        }
        fn display_name(&self) -> &'static str {
            "Scripted"
        }
        fn capabilities(&self) -> LlmCapabilities {
            LlmCapabilities::SYSTEM_MESSAGES
        }
        fn default_model(&self) -> &str {
            "scripted-1"
        }
        fn available_models(&self) -> &'static [&'static str] {
            &["scripted-1"]
        }
        fn is_configured(&self) -> bool {
            self.configured
        }
        async fn complete(&self, _request: &ChatRequest) -> Result<ChatResponse, AppError> {
            let next = self.replies.lock().unwrap().remove(0);
            next.map(|content| ChatResponse {
                content,
                model: "scripted-1".into(),
                usage: None,
                finish_reason: Some("stop".into()),
            })
        }
        async fn health_check(&self) -> Result<bool, AppError> {
            Ok(true)
        }
    }

    fn service_with_provider(provider: Arc<dyn LlmProvider>) -> AnalysisService {
        let students = Arc::new(StudentStore::new());
        students.create("Dana".into(), "3".into(), None);
        AnalysisService::new(
            Arc::new(ConversationStore::new()),
            Arc::new(AnalysisStore::new()),
            students,
            provider,
            None,
        )
    }

    fn template_service() -> AnalysisService {
        service_with_provider(Arc::new(ScriptedProvider::unconfigured()))
    }

    #[tokio::test]
    async fn test_start_unknown_student() {
        let service = template_service();
        let error = service.start("42").unwrap_err();
        assert_eq!(error.code, ErrorCode::ResourceNotFound);
    }

    #[tokio::test]
    async fn test_start_seeds_first_question() {
        let service = template_service();
        let outcome = service.start("1").unwrap();
        assert!(outcome.message.contains("Dana"));
        assert!(outcome.message.contains("שאלה 1 מתוך 6"));
    }

    #[tokio::test]
    async fn test_two_starts_yield_independent_conversations() {
        let service = template_service();
        let first = service.start("1").unwrap();
        let second = service.start("1").unwrap();
        assert_ne!(first.conversation_id, second.conversation_id);

        service.advance(first.conversation_id, "obs").await.unwrap();
        // The second conversation's counter is untouched
        let outcome = service.advance(second.conversation_id, "obs").await.unwrap();
        assert_eq!(outcome.metadata.question_count, 2);
    }

    #[tokio::test]
    async fn test_advance_rejects_blank_message() {
        let service = template_service();
        let started = service.start("1").unwrap();

        for message in ["", "   ", "\n\t"] {
            let error = service
                .advance(started.conversation_id, message)
                .await
                .unwrap_err();
            assert_eq!(error.code, ErrorCode::InvalidInput);
        }

        // Rejection happened before any state mutation
        let outcome = service.advance(started.conversation_id, "real").await.unwrap();
        assert_eq!(outcome.metadata.question_count, 2);
        assert_eq!(outcome.metadata.message_count, 4);
    }

    #[tokio::test]
    async fn test_advance_unknown_conversation() {
        let service = template_service();
        let error = service.advance(Uuid::new_v4(), "hello").await.unwrap_err();
        assert_eq!(error.code, ErrorCode::ResourceNotFound);
    }

    #[tokio::test]
    async fn test_completion_after_six_questions() {
        let service = template_service();
        let started = service.start("1").unwrap();

        let mut last = None;
        for turn in 0..5 {
            let outcome = service
                .advance(started.conversation_id, "A")
                .await
                .unwrap();
            assert_eq!(outcome.source, ReplySource::Template);
            if turn < 4 {
                assert!(!outcome.is_complete, "turn {turn} completed early");
            }
            last = Some(outcome);
        }

        let last = last.unwrap();
        assert!(last.is_complete);
        assert_eq!(last.metadata.question_count, 6);

        // Advancing past completion is still allowed
        let extra = service.advance(started.conversation_id, "more").await.unwrap();
        assert!(extra.is_complete);
        assert_eq!(extra.metadata.question_count, 7);
    }

    #[tokio::test]
    async fn test_can_complete_at_four() {
        let service = template_service();
        let started = service.start("1").unwrap();

        let mut saw_can_complete_before_done = false;
        for _ in 0..5 {
            let outcome = service.advance(started.conversation_id, "A").await.unwrap();
            if outcome.metadata.can_complete && !outcome.is_complete {
                saw_can_complete_before_done = true;
            }
        }
        assert!(saw_can_complete_before_done);
    }

    #[tokio::test]
    async fn test_complete_stores_last_assistant_message() {
        let service = template_service();
        let started = service.start("1").unwrap();

        let mut last_reply = String::new();
        for _ in 0..5 {
            last_reply = service
                .advance(started.conversation_id, "A")
                .await
                .unwrap()
                .message;
        }

        let teacher = Uuid::new_v4();
        let outcome = service
            .complete(started.conversation_id, teacher)
            .await
            .unwrap();

        let stored = service.analyses.get_by_id(&outcome.analysis_id).unwrap();
        assert_eq!(stored.analysis, last_reply);
        assert_eq!(stored.student_id, "1");
        assert_eq!(stored.created_by, teacher.to_string());
        assert!(stored.conversation_history.is_some());
    }

    #[tokio::test]
    async fn test_complete_without_assistant_message() {
        let service = template_service();
        // Construct a conversation that has no assistant turn yet
        let conversation = ConversationState::new("1".into(), "Dana".into());
        let id = conversation.id;
        service.conversations.insert(conversation);

        let error = service.complete(id, Uuid::new_v4()).await.unwrap_err();
        assert_eq!(error.code, ErrorCode::InvalidInput);
    }

    #[tokio::test]
    async fn test_complete_unknown_conversation() {
        let service = template_service();
        let error = service
            .complete(Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(error.code, ErrorCode::ResourceNotFound);
    }

    #[tokio::test]
    async fn test_ai_reply_used_when_configured() {
        let provider = Arc::new(ScriptedProvider::with_replies(vec![Ok(
            "model says hi".to_owned()
        )]));
        let service = service_with_provider(provider);
        let started = service.start("1").unwrap();

        let outcome = service.advance(started.conversation_id, "obs").await.unwrap();
        assert_eq!(outcome.message, "model says hi");
        assert_eq!(outcome.source, ReplySource::Ai);
    }

    #[tokio::test]
    async fn test_upstream_rate_limit_propagates() {
        let provider = Arc::new(ScriptedProvider::with_replies(vec![Err(
            AppError::external_rate_limited("OpenAI", "slow down"),
        )]));
        let service = service_with_provider(provider);
        let started = service.start("1").unwrap();

        let error = service
            .advance(started.conversation_id, "obs")
            .await
            .unwrap_err();
        assert_eq!(error.code, ErrorCode::ExternalRateLimited);
    }

    #[tokio::test]
    async fn test_auth_failure_falls_back_to_template() {
        let provider = Arc::new(ScriptedProvider::with_replies(vec![Err(
            AppError::external_auth_failed("OpenAI", "bad key"),
        )]));
        let service = service_with_provider(provider);
        let started = service.start("1").unwrap();

        let outcome = service.advance(started.conversation_id, "obs").await.unwrap();
        assert_eq!(outcome.source, ReplySource::Template);
        assert!(outcome.message.contains("Dana"));
    }

    #[tokio::test]
    async fn test_service_error_propagates() {
        let provider = Arc::new(ScriptedProvider::with_replies(vec![Err(
            AppError::external_service("OpenAI", "upstream 500"),
        )]));
        let service = service_with_provider(provider);
        let started = service.start("1").unwrap();

        let error = service
            .advance(started.conversation_id, "obs")
            .await
            .unwrap_err();
        assert_eq!(error.code, ErrorCode::ExternalServiceError);
    }

    #[tokio::test]
    async fn test_evict_stale_conversations() {
        let service = template_service();
        let started = service.start("1").unwrap();

        assert_eq!(service.evict_stale_conversations(24), 0);

        let mut conversation = service.conversations.get(started.conversation_id).unwrap();
        conversation.created_at = Utc::now() - Duration::hours(48);
        service.conversations.insert(conversation);

        assert_eq!(service.evict_stale_conversations(24), 1);
        assert!(service.conversations.get(started.conversation_id).is_none());
    }
}
