//! The authentication store: session state plus the operations that change it.
//!
//! Every operation follows the same contract: await the identity API, then
//! mutate the session and token tiers before returning, so callers never
//! observe a half-updated state. Failures come back as an `AuthError`
//! carrying exactly the text to show the user - the server's message when
//! its error payload has one, a fixed per-operation fallback otherwise.
//! Operations take `&mut self`, so two sign-ins can never interleave on
//! one store.

use std::sync::Arc;

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::api::{ApiClient, ApiError, AuthPayload};
use crate::config::Config;
use crate::google::{GoogleIdentity, IdentityProvider, ProviderStatus};

use super::session::{Session, User};
use super::token_store::TokenStore;

/// Keychain service name for the durable token tier
const SERVICE_NAME: &str = "wicket";

// Fallback messages, used when the server's error payload has none of its own
const LOGIN_FAILED: &str = "Login failed";
const REGISTRATION_FAILED: &str = "Registration failed";
const VERIFICATION_FAILED: &str = "Email verification failed";
const FORGOT_FAILED: &str = "Forgot password request failed";
const RESET_FAILED: &str = "Reset password failed";
const GOOGLE_LOGIN_FAILED: &str = "Google login failed";

/// Why an auth operation failed, carrying exactly the text shown to the user.
/// Transport detail goes to the log, not to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AuthError {
    message: String,
}

impl AuthError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    fn from_api(err: ApiError, fallback: &str) -> Self {
        error!(error = %err, "{}", fallback);
        match err.server_message() {
            Some(message) => Self::new(message),
            None => Self::new(fallback),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Authentication state and the operations that drive it.
/// Generic over the identity provider so tests can stand in a double.
pub struct AuthStore<P = GoogleIdentity> {
    api: ApiClient,
    tokens: TokenStore,
    provider: Arc<P>,
    session: Session,
}

impl AuthStore {
    /// Build the production store from configuration.
    /// The API base URL and Google client id must both be configured; a
    /// token left behind by an earlier run restores that session.
    pub fn new(config: &Config) -> Result<Self> {
        let base_url = config
            .api_base_url
            .as_deref()
            .context("api_base_url is not configured (set WICKET_API_BASE_URL)")?;
        let client_id = config
            .google_client_id
            .as_deref()
            .context("google_client_id is not configured (set WICKET_GOOGLE_CLIENT_ID)")?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("Failed to build HTTP client")?;

        let api = ApiClient::with_client(http.clone(), base_url);
        let provider = GoogleIdentity::new(client_id, http);
        let tokens = TokenStore::new(SERVICE_NAME, Config::session_token_dir())?;

        Ok(Self::with_parts(api, tokens, provider))
    }
}

impl<P: IdentityProvider> AuthStore<P> {
    /// Assemble a store from its collaborators
    pub fn with_parts(api: ApiClient, tokens: TokenStore, provider: P) -> Self {
        let session = Session::from_token(tokens.load());
        Self {
            api,
            tokens,
            provider: Arc::new(provider),
            session,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Sign in with email and password. `remember` picks the durable token
    /// tier; otherwise the token lives only for the current OS session.
    pub async fn login(
        &mut self,
        email: &str,
        password: &str,
        remember: bool,
    ) -> Result<(), AuthError> {
        let payload = self
            .api
            .login(email, password)
            .await
            .map_err(|e| AuthError::from_api(e, LOGIN_FAILED))?;
        self.establish(payload, remember, LOGIN_FAILED)?;
        info!(email, "signed in");
        Ok(())
    }

    /// Create an account. On success the email is parked on the session so
    /// the verification screen can prefill it.
    pub async fn register(
        &mut self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<(), AuthError> {
        self.api
            .register(username, email, password)
            .await
            .map_err(|e| AuthError::from_api(e, REGISTRATION_FAILED))?;
        self.session.pending_email = Some(email.to_string());
        info!(email, "registration submitted");
        Ok(())
    }

    /// Confirm an email address with the mailed one-time passcode
    pub async fn verify_email(&mut self, email: &str, otp: &str) -> Result<(), AuthError> {
        self.api
            .verify_email(email, otp)
            .await
            .map_err(|e| AuthError::from_api(e, VERIFICATION_FAILED))?;
        info!(email, "email verified");
        Ok(())
    }

    /// Ask the server to mail a password-reset token
    pub async fn forgot_password(&mut self, email: &str) -> Result<(), AuthError> {
        self.api
            .forgot_password(email)
            .await
            .map_err(|e| AuthError::from_api(e, FORGOT_FAILED))?;
        info!(email, "password reset requested");
        Ok(())
    }

    /// Set a new password using the mailed reset token
    pub async fn reset_password(
        &mut self,
        email: &str,
        reset_token: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        self.api
            .reset_password(email, reset_token, new_password)
            .await
            .map_err(|e| AuthError::from_api(e, RESET_FAILED))?;
        info!(email, "password reset");
        Ok(())
    }

    /// Sign in with a Google ID token.
    /// Google sign-ins always persist to the durable tier.
    pub async fn google_login(&mut self, id_token: &str) -> Result<(), AuthError> {
        let payload = self
            .api
            .google_login(id_token)
            .await
            .map_err(|e| AuthError::from_api(e, GOOGLE_LOGIN_FAILED))?;
        self.establish(payload, true, GOOGLE_LOGIN_FAILED)?;
        info!("signed in with Google");
        Ok(())
    }

    /// Sign out. Clears the in-memory session and both token tiers;
    /// never fails from the caller's perspective.
    pub fn logout(&mut self) {
        self.session.clear();
        if let Err(e) = self.tokens.clear() {
            warn!(error = %e, "Failed to clear stored token");
        }
        info!("signed out");
    }

    /// Prepare Google sign-in. Safe to call repeatedly; the underlying
    /// readiness check runs once per process.
    pub async fn init_google_auth(&self) -> ProviderStatus {
        self.provider.ensure_ready().await
    }

    /// Shared handle to the identity provider, so a caller can drive the
    /// readiness check from a spawned task while the store stays usable.
    pub fn provider_handle(&self) -> Arc<P> {
        Arc::clone(&self.provider)
    }

    /// Authorization URL for a fresh Google sign-in attempt.
    /// `None` while the provider is unavailable.
    pub fn begin_google_sign_in(&self) -> Option<String> {
        self.provider.begin_sign_in()
    }

    /// Finish Google sign-in with the pasted authorization code
    pub async fn complete_google_sign_in(&mut self, code: &str) -> Result<(), AuthError> {
        let credential = self.provider.exchange_code(code).await.map_err(|e| {
            error!(error = %e, "{}", GOOGLE_LOGIN_FAILED);
            AuthError::new(GOOGLE_LOGIN_FAILED)
        })?;
        self.google_login(&credential.id_token).await
    }

    fn establish(
        &mut self,
        payload: AuthPayload,
        durable: bool,
        fallback: &str,
    ) -> Result<(), AuthError> {
        // A sign-in without a token would leave an unauthenticated "success"
        if payload.token.is_empty() {
            error!("sign-in response carried an empty token");
            return Err(AuthError::new(fallback));
        }

        if let Err(e) = self.tokens.save(&payload.token, durable) {
            warn!(error = %e, "Failed to persist token");
        }

        self.session.establish(
            payload.token,
            User {
                email: payload.email,
                username: payload.username,
                avatar_url: payload.avatar_url,
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_server_payload() {
        let err = AuthError::from_api(
            ApiError::Server {
                status: reqwest::StatusCode::UNAUTHORIZED,
                message: Some("Invalid credentials".to_string()),
            },
            LOGIN_FAILED,
        );
        assert_eq!(err.message(), "Invalid credentials");
        assert_eq!(err.to_string(), "Invalid credentials");
    }

    #[test]
    fn test_error_message_falls_back_per_operation() {
        let err = AuthError::from_api(
            ApiError::Server {
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                message: None,
            },
            REGISTRATION_FAILED,
        );
        assert_eq!(err.message(), "Registration failed");
    }

    #[test]
    fn test_transport_errors_use_the_fallback() {
        let err = AuthError::from_api(ApiError::Timeout, RESET_FAILED);
        assert_eq!(err.message(), "Reset password failed");

        let err = AuthError::from_api(
            ApiError::InvalidResponse("expected value at line 1".to_string()),
            GOOGLE_LOGIN_FAILED,
        );
        assert_eq!(err.message(), "Google login failed");
    }
}
