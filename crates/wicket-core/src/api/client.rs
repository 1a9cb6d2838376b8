//! API client for the remote identity service.
//!
//! This module provides the `ApiClient` struct wrapping the credential
//! endpoints: login, registration, email verification, password reset,
//! and Google sign-in.
//!
//! All endpoints are POSTs under the configured base URL. Success bodies
//! are decoded into typed payloads; non-success statuses are decoded as
//! `{"message": ...}` and reported as `ApiError::Server`.

use std::time::Duration;

use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use tracing::debug;

use super::ApiError;

/// Success payload for the login and google-login endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct AuthPayload {
    pub token: String,
    pub email: String,
    pub username: String,
    #[serde(rename = "avatarUrl")]
    pub avatar_url: Option<String>,
}

/// Error payload sent alongside non-success statuses
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Client for the identity API.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client with its own connection pool
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create a client sharing an existing connection pool.
    /// This is more efficient than building a second client for the same host.
    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Exchange email and password for a token and profile
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthPayload, ApiError> {
        debug!(email, "posting login request");
        let response = self
            .client
            .post(self.url("/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        Self::read_payload(response).await
    }

    /// Create a new account; verification happens separately via OTP
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<(), ApiError> {
        debug!(email, "posting registration request");
        let response = self
            .client
            .post(self.url("/register"))
            .json(&json!({ "username": username, "email": email, "password": password }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// Confirm an email address with the mailed one-time passcode.
    /// The endpoint takes query parameters and an empty body.
    pub async fn verify_email(&self, email: &str, otp: &str) -> Result<(), ApiError> {
        debug!(email, "posting email verification request");
        let response = self
            .client
            .post(self.url("/verify-email"))
            .query(&[("email", email), ("otp", otp)])
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// Request a password-reset token be mailed to the address
    pub async fn forgot_password(&self, email: &str) -> Result<(), ApiError> {
        debug!(email, "posting forgot-password request");
        let response = self
            .client
            .post(self.url("/forgot-password"))
            .json(&json!({ "email": email }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// Set a new password using a mailed reset token
    pub async fn reset_password(
        &self,
        email: &str,
        reset_token: &str,
        new_password: &str,
    ) -> Result<(), ApiError> {
        debug!(email, "posting reset-password request");
        let response = self
            .client
            .post(self.url("/reset-password"))
            .json(&json!({ "email": email, "token": reset_token, "newPassword": new_password }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// Exchange a Google ID token for a token and profile
    pub async fn google_login(&self, id_token: &str) -> Result<AuthPayload, ApiError> {
        debug!("posting google-login request");
        let response = self
            .client
            .post(self.url("/google-login"))
            .json(&json!({ "idToken": id_token }))
            .send()
            .await?;
        Self::read_payload(response).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn read_payload<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let response = Self::check(response).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.message);
            Err(ApiError::Server { status, message })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_auth_payload() {
        let json = r#"{"token":"t1","email":"a@x.com","username":"a","avatarUrl":"https://img.example.com/a.png"}"#;
        let payload: AuthPayload =
            serde_json::from_str(json).expect("Failed to parse auth payload JSON");
        assert_eq!(payload.token, "t1");
        assert_eq!(payload.email, "a@x.com");
        assert_eq!(payload.username, "a");
        assert_eq!(
            payload.avatar_url.as_deref(),
            Some("https://img.example.com/a.png")
        );
    }

    #[test]
    fn test_parse_auth_payload_without_avatar() {
        let json = r#"{"token":"t1","email":"a@x.com","username":"a"}"#;
        let payload: AuthPayload =
            serde_json::from_str(json).expect("Failed to parse auth payload JSON");
        assert!(payload.avatar_url.is_none());
    }

    #[test]
    fn test_parse_error_body() {
        let body: ErrorBody = serde_json::from_str(r#"{"message":"Invalid credentials"}"#)
            .expect("Failed to parse error body JSON");
        assert_eq!(body.message.as_deref(), Some("Invalid credentials"));

        // Payloads without a message field still parse
        let body: ErrorBody =
            serde_json::from_str(r#"{"code":42}"#).expect("Failed to parse error body JSON");
        assert!(body.message.is_none());

        // Non-JSON bodies simply yield no message
        assert!(serde_json::from_str::<ErrorBody>("<html>oops</html>").is_err());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ApiClient::with_client(Client::new(), "http://localhost:9000/");
        assert_eq!(client.url("/login"), "http://localhost:9000/login");

        let client = ApiClient::with_client(Client::new(), "http://localhost:9000");
        assert_eq!(client.url("/login"), "http://localhost:9000/login");
    }
}
