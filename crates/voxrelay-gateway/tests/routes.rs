// SPDX-FileCopyrightText: 2026 Voxrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP routes exercised in-process.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;
use voxrelay_gateway::{router, AppState, TenantRegistry};
use voxrelay_relay::RelaySettings;

use common::ScriptedGateway;

async fn get(state: AppState, uri: &str) -> axum::response::Response {
    let request = Request::builder()
        .uri(uri)
        .header(header::HOST, "abc.ngrok.app")
        .body(Body::empty())
        .unwrap();
    router(state).oneshot(request).await.unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

#[tokio::test]
async fn index_reports_default_tenant_intro() {
    let response = get(common::state(ScriptedGateway::unreachable()), "/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["message"],
        "Thanks for calling Acme Motors."
    );
}

#[tokio::test]
async fn index_without_tenants_still_answers() {
    let state = AppState::new(
        TenantRegistry::new(),
        ScriptedGateway::unreachable(),
        RelaySettings::default(),
    );
    let json = body_json(get(state, "/").await).await;
    assert_eq!(json["message"], "Voxrelay media stream server is running");
}

#[tokio::test]
async fn health_reports_counts() {
    let response = get(common::state(ScriptedGateway::unreachable()), "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["active_calls"], 0);
    assert_eq!(json["tenants"], 2);
}

#[tokio::test]
async fn incoming_call_connects_to_the_tenant_stream() {
    let response = get(
        common::state(ScriptedGateway::unreachable()),
        "/incoming-call/acme",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/xml");

    let xml = body_text(response).await;
    assert!(xml.contains("<Say>Thanks for calling Acme Motors.</Say>"));
    assert!(xml.contains(r#"<Pause length="1"/>"#));
    assert!(xml.contains(r#"<Stream url="wss://abc.ngrok.app/media-stream/acme"/>"#));
}

#[tokio::test]
async fn incoming_call_accepts_post_and_public_url() {
    let state = common::state(ScriptedGateway::unreachable())
        .with_public_url(Some("https://voice.example.com".into()));
    let request = Request::builder()
        .method("POST")
        .uri("/incoming-call/globex")
        .header(header::HOST, "internal:8080")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("CallSid=CA123&From=%2B15550100"))
        .unwrap();
    let response = router(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let xml = body_text(response).await;
    assert!(!xml.contains("<Say>"));
    assert!(xml.contains(r#"<Stream url="wss://voice.example.com/media-stream/globex"/>"#));
}

#[tokio::test]
async fn unknown_tenant_is_not_found() {
    let state = common::state(ScriptedGateway::unreachable());
    let response = get(state.clone(), "/incoming-call/initech").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_json(response).await["error"]
        .as_str()
        .unwrap()
        .contains("initech"));

    let response = get(state, "/media-stream/initech").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn media_stream_requires_a_websocket_upgrade() {
    let response = get(
        common::state(ScriptedGateway::unreachable()),
        "/media-stream/acme",
    )
    .await;
    assert!(response.status().is_client_error());
    assert_ne!(response.status(), StatusCode::NOT_FOUND);
}
