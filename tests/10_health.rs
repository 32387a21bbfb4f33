mod common;

use anyhow::Result;
use axum::http::StatusCode;

#[tokio::test]
async fn health_endpoint_is_public() -> Result<()> {
    let app = common::test_app();

    let (status, body) = app.get("/health", None).await?;

    assert_eq!(status, StatusCode::OK, "unexpected body: {}", body);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(app.oracle.calls(), 0, "health must not consult the oracle");
    Ok(())
}

#[tokio::test]
async fn root_describes_identity_header() -> Result<()> {
    let app = common::test_app();

    let (status, body) = app.get("/", None).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["identity_header"], common::IDENTITY_HEADER);
    Ok(())
}

#[tokio::test]
async fn health_reports_degraded_when_store_is_down() -> Result<()> {
    let app = common::test_app();
    app.store.set_unavailable(true);

    let (status, body) = app.get("/health", None).await?;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["success"], false);
    assert_eq!(body["data"]["status"], "degraded");
    Ok(())
}

#[tokio::test]
async fn store_outage_is_service_unavailable() -> Result<()> {
    let app = common::test_app();
    app.store.set_unavailable(true);

    let (status, body) = app.get("/profiles", Some("root")).await?;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(common::code(&body), "SERVICE_UNAVAILABLE");
    assert!(!body["message"].as_str().unwrap_or("").contains("simulated"));
    Ok(())
}
