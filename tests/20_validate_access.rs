mod common;

use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;

#[tokio::test]
async fn callers_reach_their_own_tenant() -> Result<()> {
    let (app, tenants) = common::seeded_app();
    let token = common::token_for(&tenants.acme);

    let (status, body) =
        common::get_auth(&app, "acme.platform.example", "/api/whoami", &token).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["tenant"]["routing_key"], "acme");
    assert_ne!(body["data"]["user_id"], Value::Null);
    Ok(())
}

#[tokio::test]
async fn callers_from_another_tenant_are_forbidden() -> Result<()> {
    let (app, tenants) = common::seeded_app();
    let token = common::token_for(&tenants.birch);

    let (status, body) =
        common::get_auth(&app, "acme.platform.example", "/api/whoami", &token).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], true);
    assert_eq!(body["message"], "Tenant access denied");
    Ok(())
}

#[tokio::test]
async fn anonymous_requests_pass_the_affiliation_check() -> Result<()> {
    let (app, _) = common::seeded_app();

    let (status, body) = common::get(&app, "acme.platform.example", "/api/whoami").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user_id"], Value::Null);
    Ok(())
}

#[tokio::test]
async fn unaffiliated_operators_pass_everywhere() -> Result<()> {
    let (app, _) = common::seeded_app();
    let token = common::operator_token();

    for host in ["acme.platform.example", "birch.platform.example", "platform.example"] {
        let (status, _) = common::get_auth(&app, host, "/api/whoami", &token).await;
        assert_eq!(status, StatusCode::OK, "host {}", host);
    }
    Ok(())
}

#[tokio::test]
async fn garbage_tokens_are_unauthorized() -> Result<()> {
    let (app, _) = common::seeded_app();

    let (status, body) =
        common::get_auth(&app, "acme.platform.example", "/api/whoami", "not-a-jwt").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
    Ok(())
}

#[tokio::test]
async fn non_bearer_authorization_is_unauthorized() -> Result<()> {
    let (app, _) = common::seeded_app();

    let request = Request::builder()
        .uri("/api/whoami")
        .header("host", "acme.platform.example")
        .header("authorization", "Basic dXNlcjpwYXNz")
        .body(Body::empty())?;
    let (status, _) = common::send(&app, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn tenant_callers_may_use_the_admin_domain() -> Result<()> {
    let (app, tenants) = common::seeded_app();
    let token = common::token_for(&tenants.acme);

    let (status, body) = common::get_auth(&app, "platform.example", "/api/whoami", &token).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["scope"], "administrative");
    Ok(())
}
