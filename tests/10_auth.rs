mod common;

use anyhow::Result;
use common::*;
use profile_history::error::BEARER_CHALLENGE;
use profile_history::testing::StaticVerifier;
use reqwest::{header, StatusCode};
use serde_json::Value;

#[tokio::test]
async fn missing_token_gets_challenge() -> Result<()> {
    let server = standard_server().await?;

    let res = server.client.get(server.api("/profile")).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.headers()[header::WWW_AUTHENTICATE], BEARER_CHALLENGE);
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "UNAUTHORIZED");
    Ok(())
}

#[tokio::test]
async fn malformed_authorization_is_unauthorized() -> Result<()> {
    let server = standard_server().await?;

    for value in ["Basic YWxpY2U6c2VjcmV0", "Bearer", "Bearer not a token", "bearer alice-token"] {
        let res = server
            .client
            .get(server.api("/profile/alice"))
            .header(header::AUTHORIZATION, value)
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "header {:?}", value);
        assert!(res.headers().contains_key(header::WWW_AUTHENTICATE));
    }
    Ok(())
}

#[tokio::test]
async fn rejected_token_is_unauthorized() -> Result<()> {
    let server = standard_server().await?;

    let res = server.get("/profile/alice", "expired-token").await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.headers()[header::WWW_AUTHENTICATE], BEARER_CHALLENGE);
    Ok(())
}

#[tokio::test]
async fn provider_outage_is_internal_error() -> Result<()> {
    let server = TestServer::spawn(StaticVerifier::unavailable()).await?;

    let res = server.get("/profile/alice", ALICE_TOKEN).await?;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!res.headers().contains_key(header::WWW_AUTHENTICATE));
    let body: Value = res.json().await?;
    assert!(body["error"].as_str().unwrap_or_default().contains("connection refused"));
    Ok(())
}

#[tokio::test]
async fn install_needs_no_token() -> Result<()> {
    let server = TestServer::spawn_with_store(
        std::sync::Arc::new(profile_history::testing::MemoryVersionStore::uninstalled()),
        StaticVerifier::standard(),
    )
    .await?;

    let res = server.client.post(server.api("/install")).send().await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await?;
    assert_eq!(body["status"], "installed");

    let res = server.client.post(server.api("/install")).send().await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    Ok(())
}
