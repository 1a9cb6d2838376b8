//! Core library for wicket.
//!
//! Everything stateful lives here: the typed client for the remote identity
//! API, the authentication store and its session state, two-tier token
//! persistence, the Google identity-provider client, and the route guard.
//! The TUI crate is rendering glue on top of these pieces.

pub mod api;
pub mod auth;
pub mod config;
pub mod google;
pub mod routes;

pub use api::{ApiClient, ApiError, AuthPayload};
pub use auth::{AuthError, AuthStore, Session, TokenStore, User};
pub use config::Config;
pub use google::{GoogleIdentity, IdCredential, IdentityProvider, ProviderStatus};
pub use routes::{guard, Route};
