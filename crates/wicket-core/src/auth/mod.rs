//! Authentication module for managing the user session and stored tokens.
//!
//! This module provides:
//! - `Session`: In-memory authentication state (token, profile, pending email)
//! - `TokenStore`: Two-tier persisted token (OS keychain or session file)
//! - `AuthStore`: The operations that drive both against the identity API
//!
//! The session is authenticated exactly when it holds a non-empty token.

pub mod session;
pub mod store;
pub mod token_store;

pub use session::{Session, User};
pub use store::{AuthError, AuthStore};
pub use token_store::TokenStore;
