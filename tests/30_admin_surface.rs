mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn the_admin_domain_lists_every_tenant() -> Result<()> {
    let (app, _) = common::seeded_app();

    let (status, body) = common::get(&app, "platform.example", "/platform/tenants").await;

    assert_eq!(status, StatusCode::OK);
    let listed = body["data"].as_array().map(Vec::len);
    assert_eq!(listed, Some(5));
    assert_eq!(body["data"][0]["name"], "Acme Plumbing");
    Ok(())
}

#[tokio::test]
async fn the_platform_path_is_admin_from_any_host() -> Result<()> {
    let (app, _) = common::seeded_app();

    // The path allowlist runs before the registry lookup, so even a host
    // that resolves to nothing reaches the platform surface.
    for host in ["acme.platform.example", "ghost.platform.example"] {
        let (status, body) = common::get(&app, host, "/platform/tenants").await;
        assert_eq!(status, StatusCode::OK, "host {}", host);
        assert_eq!(body["data"].as_array().map(Vec::len), Some(5), "host {}", host);
    }
    Ok(())
}

#[tokio::test]
async fn writes_without_a_tenant_scope_fail_closed() -> Result<()> {
    let (app, _) = common::seeded_app();

    let (status, body) = common::post_json(
        &app,
        "platform.example",
        "/api/data/customers",
        json!({ "name": "Orphan Record" }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "INTERNAL_SERVER_ERROR");
    Ok(())
}

#[tokio::test]
async fn the_owning_tenant_cannot_be_set_through_the_api() -> Result<()> {
    let (app, tenants) = common::seeded_app();

    let (status, body) = common::post_json(
        &app,
        "acme.platform.example",
        "/api/data/customers",
        json!({ "name": "Spoofed", "tenant_id": tenants.birch.id }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["message"].as_str().unwrap_or_default();
    assert!(message.contains("tenant_id"), "message should name the field: {}", message);
    Ok(())
}

#[tokio::test]
async fn required_fields_are_checked_before_anything_is_written() -> Result<()> {
    let (app, _) = common::seeded_app();

    let (status, body) = common::post_json(
        &app,
        "acme.platform.example",
        "/api/data/customers",
        json!({ "notes": "no name given" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    Ok(())
}

#[tokio::test]
async fn empty_create_bodies_are_rejected() -> Result<()> {
    let (app, _) = common::seeded_app();

    let (status, _) =
        common::post_json(&app, "acme.platform.example", "/api/data/customers", json!([])).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn malformed_filters_are_rejected_before_any_query() -> Result<()> {
    let (app, _) = common::seeded_app();

    let (status, body) = common::post_json(
        &app,
        "acme.platform.example",
        "/api/find/customers",
        json!({ "where": "name = 'x'" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], true);
    Ok(())
}

#[tokio::test]
async fn whoami_under_admin_scope_reports_no_tenant() -> Result<()> {
    let (app, _) = common::seeded_app();

    let (status, body) = common::get(&app, "api.platform.example", "/api/whoami").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["scope"], "administrative");
    assert!(body["data"]["tenant"].is_null());
    Ok(())
}
