// ABOUTME: Test helper modules shared by integration tests
// ABOUTME: Re-exports the axum request driver

pub mod axum_test;
