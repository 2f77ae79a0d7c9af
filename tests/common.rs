// ABOUTME: Shared setup for integration tests
// ABOUTME: Builds test server resources and users without touching the environment

#![allow(dead_code)]

use growth_engine::config::{
    AuthConfig, ConversationConfig, Environment, OpenAiConfig, RateLimitConfig, ServerConfig,
};
use growth_engine::models::{User, UserRole};
use growth_engine::resources::ServerResources;
use std::sync::Arc;

/// Low bcrypt cost to keep tests fast
pub const TEST_BCRYPT_COST: u32 = 4;

/// Password used for all test users
pub const TEST_PASSWORD: &str = "password123";

/// Test configuration: no LLM key (template fallback), in-memory everything
pub fn test_config() -> ServerConfig {
    ServerConfig {
        http_port: 0,
        environment: Environment::Testing,
        auth: AuthConfig {
            jwt_secret: "integration-test-secret".into(),
            jwt_refresh_secret: "integration-test-refresh-secret".into(),
            access_token_expiry_hours: 24,
            refresh_token_expiry_days: 7,
        },
        openai: OpenAiConfig {
            api_key: None,
            model: "gpt-4-turbo-preview".into(),
            max_tokens: 2000,
            temperature: 0.7,
            base_url: "https://api.openai.com/v1".into(),
            request_timeout_secs: 5,
        },
        rate_limit: RateLimitConfig {
            chat_requests: 20,
            window_secs: 60,
        },
        conversation: ConversationConfig {
            max_age_hours: 24,
            system_prompt_path: None,
        },
        seed_demo_data: false,
    }
}

/// Build resources from the default test configuration
pub fn create_test_resources() -> Arc<ServerResources> {
    create_test_resources_with(test_config())
}

/// Build resources from a customized configuration
pub fn create_test_resources_with(config: ServerConfig) -> Arc<ServerResources> {
    Arc::new(ServerResources::new(config).expect("failed to build test resources"))
}

/// Create a user directly in the store and return it
pub fn create_test_user(resources: &ServerResources, email: &str, role: UserRole) -> User {
    let password_hash =
        bcrypt::hash(TEST_PASSWORD, TEST_BCRYPT_COST).expect("failed to hash test password");
    let user = User::new(
        email.into(),
        password_hash,
        "Test".into(),
        "User".into(),
        None,
    )
    .with_role(role);
    resources
        .users
        .create(user)
        .expect("failed to create test user")
}

/// Issue a bearer header value for a user
pub fn bearer_token(resources: &ServerResources, user: &User) -> String {
    let pair = resources
        .auth_manager
        .issue_token_pair(user)
        .expect("failed to issue test token");
    format!("Bearer {}", pair.access_token)
}
