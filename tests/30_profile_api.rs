mod common;

use anyhow::Result;
use common::*;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn dark_then_light() -> Result<()> {
    let server = standard_server().await?;

    let res = server.post("/profile/alice/add", ALICE_TOKEN, r#"{"theme":"dark"}"#).await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let res = server.post("/profile/alice/add", ALICE_TOKEN, r#"{"theme":"light"}"#).await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let latest: Value = server.get("/profile/alice/latest", ALICE_TOKEN).await?.json().await?;
    assert_eq!(latest["author"], "alice");
    assert_eq!(latest["profile_content"], json!({ "theme": "light" }));

    let history: Value = server.get("/profile/alice", ALICE_TOKEN).await?.json().await?;
    let versions = history.as_array().expect("version list");
    assert_eq!(versions.len(), 2);
    assert!(versions[0]["profile_version"].as_str() < versions[1]["profile_version"].as_str());
    assert!(versions.iter().all(|v| v["author"] == "alice"));
    Ok(())
}

#[tokio::test]
async fn added_version_can_be_fetched_by_id() -> Result<()> {
    let server = standard_server().await?;
    let document = r#"{"layout":{"columns":3,"pinned":["inbox","later"]},"beta":true}"#;

    let res = server.post("/profile/alice/add", ALICE_TOKEN, document).await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = res.json().await?;
    let version = created["profile_version"].as_str().expect("version id").to_string();
    assert_eq!(created["author"], "alice");

    server.post("/profile/alice/add", ALICE_TOKEN, r#"{"beta":false}"#).await?;

    let res = server.get(&format!("/profile/alice/{}", version), ALICE_TOKEN).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let record: Value = res.json().await?;
    assert_eq!(record["profile_version"], version.as_str());
    assert_eq!(record["profile_content"], serde_json::from_str::<Value>(document)?);
    Ok(())
}

#[tokio::test]
async fn content_is_returned_byte_for_byte() -> Result<()> {
    let server = standard_server().await?;
    let document = r#"{"z": 1, "a": [1.50, "x"]}"#;

    server.post("/profile/alice/add", ALICE_TOKEN, document).await?;
    let text = server.get("/profile/alice/latest", ALICE_TOKEN).await?.text().await?;
    assert!(text.contains(r#""profile_content":{"z": 1, "a": [1.50, "x"]}"#), "{}", text);
    Ok(())
}

#[tokio::test]
async fn delete_is_idempotent() -> Result<()> {
    let server = standard_server().await?;

    server.post("/profile/alice/add", ALICE_TOKEN, "{}").await?;
    server.post("/profile/alice/add", ALICE_TOKEN, "[]").await?;

    for _ in 0..2 {
        let res = server.post("/profile/alice/delete", ALICE_TOKEN, "").await?;
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
    }

    let history: Value = server.get("/profile/alice", ALICE_TOKEN).await?.json().await?;
    assert_eq!(history, json!([]));

    let res = server.get("/profile/alice/latest", ALICE_TOKEN).await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn non_json_body_is_unsupported() -> Result<()> {
    let server = standard_server().await?;

    for body in ["", "theme=dark", r#"{"theme":"dark""#] {
        let res = server.post("/profile/alice/add", ALICE_TOKEN, body).await?;
        assert_eq!(res.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE, "body {:?}", body);
        let err: Value = res.json().await?;
        assert_eq!(err["code"], "UNSUPPORTED_MEDIA_TYPE");
    }
    assert_eq!(server.store.version_count(), 0);
    Ok(())
}

#[tokio::test]
async fn missing_versions_are_not_found() -> Result<()> {
    let server = standard_server().await?;

    let res = server.get("/profile/alice/latest", ALICE_TOKEN).await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server.get("/profile/alice/20200101T000000.000000Z", ALICE_TOKEN).await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server.get("/profile/alice/not-a-version", ALICE_TOKEN).await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let err: Value = res.json().await?;
    assert_eq!(err["error"], "Profile version not found");

    let history: Value = server.get("/profile/alice", ALICE_TOKEN).await?.json().await?;
    assert_eq!(history, json!([]));
    Ok(())
}

#[tokio::test]
async fn storage_failure_is_internal_error() -> Result<()> {
    let server = standard_server().await?;
    server.store.break_connection();

    let res = server.get("/profile/alice", ALICE_TOKEN).await?;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let err: Value = res.json().await?;
    assert_eq!(err["code"], "INTERNAL_SERVER_ERROR");
    assert!(!err["error"].as_str().unwrap_or_default().is_empty());
    Ok(())
}
