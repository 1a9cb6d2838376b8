//! Google identity-provider tests against a mock discovery endpoint.
//!
//! Readiness is a one-shot network fetch, so these tests lean on wiremock's
//! `expect` counters to prove the fetch happens exactly once no matter how
//! many callers race it, and that a failed fetch is never retried.

use std::net::TcpListener;
use std::time::Duration;

use anyhow::{anyhow, Result};
use futures::future::join_all;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wicket_core::{GoogleIdentity, IdentityProvider, ProviderStatus};

const DISCOVERY_PATH: &str = "/.well-known/openid-configuration";

fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

fn provider_for(server: &MockServer) -> Result<GoogleIdentity> {
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()?;
    Ok(GoogleIdentity::new("client-123", http)
        .with_discovery_url(&format!("{}{}", server.uri(), DISCOVERY_PATH)))
}

fn discovery_body(server: &MockServer) -> serde_json::Value {
    json!({
        "issuer": server.uri(),
        "authorization_endpoint": format!("{}/auth", server.uri()),
        "token_endpoint": format!("{}/token", server.uri()),
    })
}

#[tokio::test]
async fn concurrent_readiness_checks_share_one_discovery_fetch() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(DISCOVERY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(discovery_body(&server)))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server)?;

    let statuses = join_all((0..8).map(|_| provider.ensure_ready())).await;
    assert!(statuses.iter().all(|s| *s == ProviderStatus::Ready));

    // Later callers reuse the memoized result
    assert_eq!(provider.ensure_ready().await, ProviderStatus::Ready);
    assert!(provider.begin_sign_in().is_some());
    Ok(())
}

#[tokio::test]
async fn failed_discovery_is_memoized_and_never_retried() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(DISCOVERY_PATH))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server)?;

    assert_eq!(provider.ensure_ready().await, ProviderStatus::Unavailable);
    // Degraded mode sticks for the life of the process
    assert_eq!(provider.ensure_ready().await, ProviderStatus::Unavailable);
    assert!(provider.begin_sign_in().is_none());

    let err = provider
        .exchange_code("code-1")
        .await
        .err()
        .ok_or_else(|| anyhow!("expected exchange to fail"))?;
    assert!(err.to_string().contains("not ready"));
    Ok(())
}

#[tokio::test]
async fn code_exchange_sends_the_verifier_behind_the_challenge() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(DISCOVERY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(discovery_body(&server)))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=code-1"))
        .and(body_string_contains("client_id=client-123"))
        .and(body_string_contains("code_verifier="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "at-1",
            "id_token": "jwt-1",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server)?;
    assert_eq!(provider.ensure_ready().await, ProviderStatus::Ready);

    let auth_url = provider
        .begin_sign_in()
        .ok_or_else(|| anyhow!("expected an authorization URL"))?;
    let parsed = url::Url::parse(&auth_url)?;
    let challenge = parsed
        .query_pairs()
        .find(|(k, _)| k == "code_challenge")
        .map(|(_, v)| v.to_string())
        .ok_or_else(|| anyhow!("missing code_challenge"))?;

    let credential = provider.exchange_code("code-1").await?;
    assert_eq!(credential.id_token, "jwt-1");

    // The verifier sent to the token endpoint must hash to the challenge
    // that went into the authorization URL (S256)
    let requests = server
        .received_requests()
        .await
        .ok_or_else(|| anyhow!("request recording disabled"))?;
    let token_request = requests
        .iter()
        .find(|r| r.url.path() == "/token")
        .ok_or_else(|| anyhow!("no token request recorded"))?;
    let body = String::from_utf8(token_request.body.clone())?;
    let verifier = url::form_urlencoded::parse(body.as_bytes())
        .find(|(k, _)| k == "code_verifier")
        .map(|(_, v)| v.to_string())
        .ok_or_else(|| anyhow!("missing code_verifier"))?;

    use base64::prelude::*;
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    assert_eq!(BASE64_URL_SAFE_NO_PAD.encode(hasher.finalize()), challenge);

    // The verifier is consumed by the exchange
    let err = provider
        .exchange_code("code-2")
        .await
        .err()
        .ok_or_else(|| anyhow!("expected exchange to fail"))?;
    assert!(err.to_string().contains("No sign-in attempt"));
    Ok(())
}

#[tokio::test]
async fn token_exchange_failures_surface_the_status() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(DISCOVERY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(discovery_body(&server)))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant"
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server)?;
    assert_eq!(provider.ensure_ready().await, ProviderStatus::Ready);
    provider
        .begin_sign_in()
        .ok_or_else(|| anyhow!("expected an authorization URL"))?;

    let err = provider
        .exchange_code("bad-code")
        .await
        .err()
        .ok_or_else(|| anyhow!("expected exchange to fail"))?;
    assert!(err.to_string().contains("400"));
    Ok(())
}

#[tokio::test]
async fn a_token_response_without_an_id_token_is_rejected() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(DISCOVERY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(discovery_body(&server)))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "at-1"
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server)?;
    assert_eq!(provider.ensure_ready().await, ProviderStatus::Ready);
    provider
        .begin_sign_in()
        .ok_or_else(|| anyhow!("expected an authorization URL"))?;

    let err = provider
        .exchange_code("code-1")
        .await
        .err()
        .ok_or_else(|| anyhow!("expected exchange to fail"))?;
    assert!(err.to_string().contains("ID token"));
    Ok(())
}
