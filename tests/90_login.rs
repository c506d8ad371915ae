mod common;

use anyhow::Result;
use axum::{body::Body, http::{header, Request, StatusCode}};
use serde_json::json;

fn login_request(identifier: &str, password: &str) -> Result<Request<Body>> {
    Ok(Request::post("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "identifier": identifier, "password": password }).to_string()))?)
}

fn whoami_request(authorization: Option<&str>) -> Result<Request<Body>> {
    let mut builder = Request::get("/api/auth/whoami");
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    Ok(builder.body(Body::empty())?)
}

#[tokio::test]
async fn login_then_whoami() -> Result<()> {
    let (status, body) = common::send(common::test_app(), login_request("alice", "wonderland")?).await?;

    assert_eq!(status, StatusCode::OK, "body: {}", body);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["token_type"], "Bearer");
    assert_eq!(body["data"]["expires_in"], 3600);
    assert_eq!(body["data"]["user"]["subject"], "u1");

    let token = body["data"]["token"].as_str().expect("token string");
    let (status, body) = common::send(
        common::test_app(),
        whoami_request(Some(&format!("Bearer {}", token)))?,
    )
    .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["subject"], "u1");
    Ok(())
}

#[tokio::test]
async fn wrong_password_and_unknown_user_look_the_same() -> Result<()> {
    let (wrong_status, wrong_body) = common::send(common::test_app(), login_request("alice", "nope")?).await?;
    let (unknown_status, unknown_body) = common::send(common::test_app(), login_request("bob", "nope")?).await?;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_status, unknown_status);
    assert_eq!(wrong_body, unknown_body);
    Ok(())
}

#[tokio::test]
async fn blank_credentials_are_bad_requests() -> Result<()> {
    let (status, body) = common::send(common::test_app(), login_request("  ", "pw")?).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
    Ok(())
}

#[tokio::test]
async fn missing_token_is_unauthorized() -> Result<()> {
    let (status, body) = common::send(common::test_app(), whoami_request(None)?).await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Authentication required");
    Ok(())
}

#[tokio::test]
async fn rejection_body_does_not_reveal_the_failed_check() -> Result<()> {
    let expired = common::token_service()
        .issue(&hub_api::auth::Principal::new("u1"), chrono::DateTime::from_timestamp(1000, 0).unwrap())?
        .token;

    let mut bodies = Vec::new();
    for value in [
        None,
        Some("Bearer not-a-token".to_string()),
        Some(format!("Bearer {}", expired)),
        Some("Basic YWxpY2U6d29uZGVybGFuZA==".to_string()),
    ] {
        let (status, body) = common::send(common::test_app(), whoami_request(value.as_deref())?).await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        bodies.push(body);
    }

    assert!(bodies.windows(2).all(|pair| pair[0] == pair[1]));
    Ok(())
}
