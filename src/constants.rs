// ABOUTME: Application constants and configuration defaults shared across modules
// ABOUTME: Centralizes limits, environment variable names, and service identifiers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Growth Engine

//! Application-wide constants.

/// Service identifiers used in JWT audiences and structured logs
pub mod service_names {
    /// Canonical service name
    pub const GROWTH_ENGINE: &str = "growth-engine";

    /// Audience claim for refresh tokens, distinct from access tokens so one
    /// can never be presented in place of the other
    pub const GROWTH_ENGINE_REFRESH: &str = "growth-engine-refresh";
}

/// Numeric limits and thresholds
pub mod limits {
    /// Number of assistant turns after which a guided conversation is complete.
    ///
    /// The UI shows its "complete analysis" button earlier, at
    /// [`SUGGEST_COMPLETE_AFTER_QUESTIONS`]. The two gates are intentionally
    /// distinct and must not be unified.
    pub const COMPLETE_AFTER_QUESTIONS: u32 = 6;

    /// Assistant-turn count at which the client may offer early completion
    pub const SUGGEST_COMPLETE_AFTER_QUESTIONS: u32 = 4;

    /// Sliding window of non-system messages sent to the LLM per request
    pub const HISTORY_WINDOW_MESSAGES: usize = 15;

    /// Access token lifetime
    pub const ACCESS_TOKEN_EXPIRY_HOURS: i64 = 24;

    /// Refresh token lifetime
    pub const REFRESH_TOKEN_EXPIRY_DAYS: i64 = 7;

    /// Password reset tokens are valid for one hour and single-use
    pub const PASSWORD_RESET_EXPIRY_MINUTES: i64 = 60;

    /// Failed logins before the account is temporarily locked
    pub const MAX_FAILED_LOGIN_ATTEMPTS: u32 = 5;

    /// Lockout duration after too many failed logins
    pub const LOGIN_LOCKOUT_MINUTES: i64 = 15;

    /// Chat requests allowed per user per window
    pub const CHAT_RATE_LIMIT_REQUESTS: u32 = 20;

    /// Chat rate limit window
    pub const CHAT_RATE_LIMIT_WINDOW_SECS: u64 = 60;

    /// Conversations older than this are eligible for eviction
    pub const CONVERSATION_MAX_AGE_HOURS: i64 = 24;

    /// Minimum accepted password length at registration
    pub const MIN_PASSWORD_LENGTH: usize = 8;

    /// bcrypt work factor for password hashing
    pub const BCRYPT_COST: u32 = 12;

    /// Upstream LLM request timeout
    pub const LLM_REQUEST_TIMEOUT_SECS: u64 = 60;
}

/// Environment variable names read by `ServerConfig::from_env`
pub mod env_names {
    /// HTTP listen port
    pub const HTTP_PORT: &str = "HTTP_PORT";
    /// Deployment environment (development, production, testing)
    pub const ENVIRONMENT: &str = "ENVIRONMENT";
    /// JWT signing secret for access tokens
    pub const JWT_SECRET: &str = "JWT_SECRET";
    /// JWT signing secret for refresh tokens
    pub const JWT_REFRESH_SECRET: &str = "JWT_REFRESH_SECRET";
    /// OpenAI API key
    pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
    /// OpenAI model override
    pub const OPENAI_MODEL: &str = "OPENAI_MODEL";
    /// OpenAI max completion tokens
    pub const OPENAI_MAX_TOKENS: &str = "OPENAI_MAX_TOKENS";
    /// OpenAI sampling temperature
    pub const OPENAI_TEMPERATURE: &str = "OPENAI_TEMPERATURE";
    /// OpenAI API base URL override (for proxies and tests)
    pub const OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
    /// Path to the guided-analysis system prompt file
    pub const SYSTEM_PROMPT_PATH: &str = "SYSTEM_PROMPT_PATH";
    /// Whether to seed demo data at startup
    pub const SEED_DEMO_DATA: &str = "SEED_DEMO_DATA";
}

/// Shared user-facing error messages
pub mod error_messages {
    /// Login failure message, identical for unknown email and bad password
    pub const INVALID_CREDENTIALS: &str = "Invalid email or password";
    /// Shown when the account is locked after repeated failures
    pub const ACCOUNT_LOCKED: &str =
        "Account temporarily locked after repeated failed logins. Try again later.";
    /// Registration rejection for malformed email addresses
    pub const INVALID_EMAIL_FORMAT: &str = "Invalid email address format";
    /// Registration rejection for weak passwords
    pub const PASSWORD_TOO_WEAK: &str = "Password must be at least 8 characters long";
    /// Enumeration-safe response for password reset requests
    pub const RESET_REQUESTED: &str =
        "If an account with that email exists, a password reset link has been sent.";
}
