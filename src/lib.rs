// ABOUTME: Main library entry point for the Growth Engine backend
// ABOUTME: Guided student-analysis conversations, auth, and CRUD over one HTTP API
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Growth Engine

#![deny(unsafe_code)]

//! # Growth Engine
//!
//! A backend for K-12 teachers to record observations about students
//! through a guided conversational interface and receive an AI-generated
//! analysis with strengths, weaknesses, and recommendations.
//!
//! ## Features
//!
//! - **Guided analysis**: a fixed six-question interview driven by an LLM,
//!   with a deterministic Hebrew template fallback when no model is
//!   configured
//! - **Authentication**: JWT access tokens with refresh-token rotation,
//!   account lockout, and a single-use password reset flow
//! - **Management**: students, schools, and stored analyses over a REST API
//!
//! ## Architecture
//!
//! - **`analysis`**: the conversation manager orchestrating turn-taking
//! - **`llm`**: provider abstraction and the OpenAI gateway
//! - **`store`**: injected in-memory stores (process-lifetime, non-durable)
//! - **`routes`**: axum HTTP surface
//! - **`resources`**: dependency-injection container wiring it all together
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use growth_engine::config::ServerConfig;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("Growth Engine configured with port: {}", config.http_port);
//!     Ok(())
//! }
//! ```

/// Guided analysis conversation management
pub mod analysis;

/// Authentication and token management
pub mod auth;

/// Configuration management
pub mod config;

/// Application constants and configuration values
pub mod constants;

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// LLM provider abstraction for AI chat integration
pub mod llm;

/// Production logging and structured output
pub mod logging;

/// Common data models
pub mod models;

/// Unified rate limiting for the chat endpoint
pub mod rate_limiting;

/// Centralized resource container for dependency injection
pub mod resources;

/// `HTTP` routes for auth, students, schools, and guided analysis
pub mod routes;

/// Demo data seeding
pub mod seed;

/// In-memory stores
pub mod store;
