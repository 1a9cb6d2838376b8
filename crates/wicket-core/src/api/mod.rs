//! REST client module for the remote identity API.
//!
//! This module provides the `ApiClient` for the credential-exchange
//! endpoints (login, registration, email verification, password reset,
//! Google sign-in) under a configured base URL.
//!
//! Every endpoint is a JSON POST; error responses carry an optional
//! `{"message": ...}` payload that is surfaced to callers.

pub mod client;
pub mod error;

pub use client::{ApiClient, AuthPayload};
pub use error::ApiError;
