//! Google identity-provider client.
//!
//! Readiness is established by fetching Google's OpenID discovery document
//! exactly once per process; a failed fetch is memoized as unavailable and
//! sign-in stays disabled for the rest of the process rather than erroring.
//! Sign-in itself is the authorization-code flow with PKCE: the user visits
//! the authorization URL, pastes the code back, and the code is exchanged
//! for an ID token that the identity API accepts.
//!
//! The trait seam exists so UI and store logic can run against a test
//! double instead of Google.

use std::future::Future;
use std::sync::Mutex;

use anyhow::{Context, Result};
use base64::prelude::*;
use rand::Rng;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tokio::sync::OnceCell;
use tracing::{debug, warn};
use url::Url;

/// Google's OpenID discovery document, the provider's fixed entry point
pub const GOOGLE_DISCOVERY_URL: &str =
    "https://accounts.google.com/.well-known/openid-configuration";

/// Scopes requested at sign-in.
/// `openid email profile` yields an ID token carrying the profile claims
/// the identity API reads.
const SCOPES: &str = "openid email profile";

/// Out-of-band redirect: the provider displays the authorization code and
/// the user pastes it back into the app.
const REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

/// Outcome of preparing the identity provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderStatus {
    Ready,
    Unavailable,
}

/// Credential handed back by the provider once sign-in completes
#[derive(Debug, Clone)]
pub struct IdCredential {
    pub id_token: String,
}

/// A federated sign-in provider.
pub trait IdentityProvider {
    /// Prepare the provider. Idempotent: at most one network fetch per
    /// process lifetime, and concurrent callers share the in-flight attempt.
    fn ensure_ready(&self) -> impl Future<Output = ProviderStatus> + Send;

    /// Start a sign-in attempt, returning the authorization URL the user
    /// must visit. `None` while the provider is unavailable.
    fn begin_sign_in(&self) -> Option<String>;

    /// Exchange a pasted authorization code for an ID credential
    fn exchange_code(&self, code: &str) -> impl Future<Output = Result<IdCredential>> + Send;
}

/// Relevant endpoints from the discovery document
#[derive(Debug, Clone, Deserialize)]
struct Discovery {
    authorization_endpoint: String,
    token_endpoint: String,
}

/// PKCE code verifier and challenge (S256)
struct Pkce {
    verifier: String,
    challenge: String,
}

impl Pkce {
    fn generate() -> Self {
        let verifier_bytes: [u8; 32] = rand::thread_rng().gen();
        let verifier = BASE64_URL_SAFE_NO_PAD.encode(verifier_bytes);

        let mut hasher = Sha256::new();
        hasher.update(verifier.as_bytes());
        let challenge = BASE64_URL_SAFE_NO_PAD.encode(hasher.finalize());

        Self {
            verifier,
            challenge,
        }
    }
}

/// Google binding of `IdentityProvider`.
pub struct GoogleIdentity {
    http: reqwest::Client,
    client_id: String,
    discovery_url: String,
    /// One-shot readiness: `Some` = endpoints known, `None` = fetch failed
    discovery: OnceCell<Option<Discovery>>,
    /// Verifier for the sign-in attempt currently awaiting its code
    pending: Mutex<Option<Pkce>>,
}

impl GoogleIdentity {
    /// `http` should carry the application's request timeout; sharing it
    /// also shares the connection pool.
    pub fn new(client_id: &str, http: reqwest::Client) -> Self {
        Self {
            http,
            client_id: client_id.to_string(),
            discovery_url: GOOGLE_DISCOVERY_URL.to_string(),
            discovery: OnceCell::new(),
            pending: Mutex::new(None),
        }
    }

    /// Point discovery at a different endpoint (tests, staging)
    pub fn with_discovery_url(mut self, url: &str) -> Self {
        self.discovery_url = url.to_string();
        self
    }

    async fn fetch_discovery(&self) -> Result<Discovery> {
        let response = self
            .http
            .get(&self.discovery_url)
            .send()
            .await
            .context("Failed to fetch discovery document")?;

        if !response.status().is_success() {
            anyhow::bail!("Discovery endpoint returned HTTP {}", response.status());
        }

        response
            .json()
            .await
            .context("Failed to parse discovery document")
    }

    fn ready_discovery(&self) -> Option<&Discovery> {
        self.discovery.get().and_then(|d| d.as_ref())
    }

    fn take_pending(&self) -> Option<Pkce> {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
    }

    fn set_pending(&self, pkce: Pkce) {
        *self.pending.lock().unwrap_or_else(|e| e.into_inner()) = Some(pkce);
    }
}

impl IdentityProvider for GoogleIdentity {
    async fn ensure_ready(&self) -> ProviderStatus {
        let discovery = self
            .discovery
            .get_or_init(|| async {
                match self.fetch_discovery().await {
                    Ok(discovery) => {
                        debug!("identity provider ready");
                        Some(discovery)
                    }
                    Err(e) => {
                        warn!(error = %e, "identity provider unavailable");
                        None
                    }
                }
            })
            .await;

        if discovery.is_some() {
            ProviderStatus::Ready
        } else {
            ProviderStatus::Unavailable
        }
    }

    fn begin_sign_in(&self) -> Option<String> {
        let discovery = self.ready_discovery()?;
        let pkce = Pkce::generate();

        let mut url = Url::parse(&discovery.authorization_endpoint).ok()?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", REDIRECT_URI)
            .append_pair("scope", SCOPES)
            .append_pair("code_challenge", &pkce.challenge)
            .append_pair("code_challenge_method", "S256");

        self.set_pending(pkce);
        Some(url.to_string())
    }

    async fn exchange_code(&self, code: &str) -> Result<IdCredential> {
        let discovery = self
            .ready_discovery()
            .ok_or_else(|| anyhow::anyhow!("Identity provider is not ready"))?;
        let pkce = self
            .take_pending()
            .ok_or_else(|| anyhow::anyhow!("No sign-in attempt in progress"))?;

        let response = self
            .http
            .post(&discovery.token_endpoint)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", &self.client_id),
                ("redirect_uri", REDIRECT_URI),
                ("code_verifier", &pkce.verifier),
            ])
            .send()
            .await
            .context("Failed to send token exchange request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Token exchange failed (HTTP {}): {}", status, body);
        }

        let token: TokenResponse = response
            .json()
            .await
            .context("Failed to parse token response")?;

        match token.id_token {
            Some(id_token) if !id_token.is_empty() => Ok(IdCredential { id_token }),
            _ => anyhow::bail!("Token response did not include an ID token"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    id_token: Option<String>,
}
