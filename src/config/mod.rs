// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Parses environment variables into a typed ServerConfig with sane defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Growth Engine

//! Environment-based configuration management.

use crate::constants::{env_names, limits};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use tracing::warn;

/// Development-only fallback secret, rejected in production
const DEV_JWT_SECRET: &str = "dev-secret-change-in-production";

/// Placeholder API key shipped in example env files; treated as unconfigured
pub const OPENAI_PLACEHOLDER_KEY: &str = "sk-proj-PLACEHOLDER";

/// Environment type for security and logging decisions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Production deployment
    Production,
    /// Automated test runs
    Testing,
}

impl Environment {
    /// Parse from string with fallback to development
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 signing secret for access tokens
    pub jwt_secret: String,
    /// HS256 signing secret for refresh tokens
    pub jwt_refresh_secret: String,
    /// Access token lifetime in hours
    pub access_token_expiry_hours: i64,
    /// Refresh token lifetime in days
    pub refresh_token_expiry_days: i64,
}

/// OpenAI gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// API key; absent or placeholder means the gateway is unconfigured and
    /// the template fallback serves all replies
    pub api_key: Option<String>,
    /// Chat completion model
    pub model: String,
    /// Maximum completion tokens per request
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// API base URL
    pub base_url: String,
    /// Upstream request timeout in seconds
    pub request_timeout_secs: u64,
}

impl OpenAiConfig {
    /// Whether the API key looks usable: present, not the placeholder, and
    /// carrying the expected `sk-` prefix
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.api_key
            .as_deref()
            .is_some_and(|key| key != OPENAI_PLACEHOLDER_KEY && key.starts_with("sk-"))
    }
}

/// Rate limiting configuration for the chat endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Requests allowed per user per window
    pub chat_requests: u32,
    /// Window length in seconds
    pub window_secs: u64,
}

/// Guided conversation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Conversations older than this are eligible for eviction (hours)
    pub max_age_hours: i64,
    /// Optional path to the system prompt file; the built-in default prompt
    /// is used when absent or unreadable
    pub system_prompt_path: Option<PathBuf>,
}

/// Top-level server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP API port
    pub http_port: u16,
    /// Deployment environment
    pub environment: Environment,
    /// Authentication configuration
    pub auth: AuthConfig,
    /// OpenAI gateway configuration
    pub openai: OpenAiConfig,
    /// Chat rate limiting
    pub rate_limit: RateLimitConfig,
    /// Guided conversation settings
    pub conversation: ConversationConfig,
    /// Seed demo data (students, schools, sample analyses) at startup
    pub seed_demo_data: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error when running in production without explicit JWT
    /// secrets, or when a numeric variable fails to parse.
    pub fn from_env() -> Result<Self> {
        let environment = Environment::from_str_or_default(
            &env::var(env_names::ENVIRONMENT).unwrap_or_default(),
        );

        let http_port = parse_env(env_names::HTTP_PORT, 8080)?;

        let jwt_secret = env::var(env_names::JWT_SECRET).unwrap_or_else(|_| {
            warn!("{} not set, using development secret", env_names::JWT_SECRET);
            DEV_JWT_SECRET.to_owned()
        });
        // Refresh tokens get their own secret so a leaked access secret does
        // not also compromise long-lived refresh tokens
        let jwt_refresh_secret = env::var(env_names::JWT_REFRESH_SECRET)
            .unwrap_or_else(|_| format!("{jwt_secret}-refresh"));

        if environment.is_production() && jwt_secret == DEV_JWT_SECRET {
            anyhow::bail!(
                "{} must be set explicitly in production",
                env_names::JWT_SECRET
            );
        }

        let seed_default = !environment.is_production();

        Ok(Self {
            http_port,
            environment,
            auth: AuthConfig {
                jwt_secret,
                jwt_refresh_secret,
                access_token_expiry_hours: limits::ACCESS_TOKEN_EXPIRY_HOURS,
                refresh_token_expiry_days: limits::REFRESH_TOKEN_EXPIRY_DAYS,
            },
            openai: OpenAiConfig {
                api_key: env::var(env_names::OPENAI_API_KEY).ok(),
                model: env::var(env_names::OPENAI_MODEL)
                    .unwrap_or_else(|_| "gpt-4-turbo-preview".to_owned()),
                max_tokens: parse_env(env_names::OPENAI_MAX_TOKENS, 2000)?,
                temperature: parse_env(env_names::OPENAI_TEMPERATURE, 0.7)?,
                base_url: env::var(env_names::OPENAI_BASE_URL)
                    .unwrap_or_else(|_| "https://api.openai.com/v1".to_owned()),
                request_timeout_secs: limits::LLM_REQUEST_TIMEOUT_SECS,
            },
            rate_limit: RateLimitConfig {
                chat_requests: limits::CHAT_RATE_LIMIT_REQUESTS,
                window_secs: limits::CHAT_RATE_LIMIT_WINDOW_SECS,
            },
            conversation: ConversationConfig {
                max_age_hours: limits::CONVERSATION_MAX_AGE_HOURS,
                system_prompt_path: env::var(env_names::SYSTEM_PROMPT_PATH).ok().map(PathBuf::from),
            },
            seed_demo_data: env::var(env_names::SEED_DEMO_DATA)
                .map(|v| v == "true" || v == "1")
                .unwrap_or(seed_default),
        })
    }

    /// One-line configuration summary for startup logs, without secrets
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "env={} port={} openai_configured={} model={} seed_demo={}",
            self.environment,
            self.http_port,
            self.openai.is_configured(),
            self.openai.model,
            self.seed_demo_data
        )
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid value for {name}: {e}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for name in [
            env_names::HTTP_PORT,
            env_names::ENVIRONMENT,
            env_names::JWT_SECRET,
            env_names::JWT_REFRESH_SECRET,
            env_names::OPENAI_API_KEY,
            env_names::OPENAI_MODEL,
            env_names::OPENAI_MAX_TOKENS,
            env_names::OPENAI_TEMPERATURE,
            env_names::OPENAI_BASE_URL,
            env_names::SYSTEM_PROMPT_PATH,
            env_names::SEED_DEMO_DATA,
        ] {
            env::remove_var(name);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.openai.model, "gpt-4-turbo-preview");
        assert_eq!(config.openai.max_tokens, 2000);
        assert!(!config.openai.is_configured());
        assert!(config.seed_demo_data);
    }

    #[test]
    #[serial]
    fn test_production_requires_explicit_secret() {
        clear_env();
        env::set_var(env_names::ENVIRONMENT, "production");
        assert!(ServerConfig::from_env().is_err());
        env::set_var(env_names::JWT_SECRET, "an-actual-secret");
        let config = ServerConfig::from_env().unwrap();
        assert!(config.environment.is_production());
        assert!(!config.seed_demo_data);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_placeholder_key_is_unconfigured() {
        clear_env();
        env::set_var(env_names::OPENAI_API_KEY, OPENAI_PLACEHOLDER_KEY);
        let config = ServerConfig::from_env().unwrap();
        assert!(!config.openai.is_configured());

        env::set_var(env_names::OPENAI_API_KEY, "sk-test-1234567890");
        let config = ServerConfig::from_env().unwrap();
        assert!(config.openai.is_configured());

        // Keys without the expected prefix are also treated as unconfigured
        env::set_var(env_names::OPENAI_API_KEY, "not-a-key");
        let config = ServerConfig::from_env().unwrap();
        assert!(!config.openai.is_configured());
        clear_env();
    }
}
