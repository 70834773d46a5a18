//! Integration tests for the config portal router.
//!
//! These tests verify the HTTP API endpoints work correctly.

#![cfg(feature = "web")]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

use evse_display::services::{build_router, PortalHandler, PortalMailbox, WebServerConfig};
use evse_display::{PeerHost, ServiceRecord, WifiNetwork};

fn create_test_app() -> (axum::Router, Arc<PortalMailbox>) {
    let mailbox = Arc::new(PortalMailbox::new());
    let config = WebServerConfig::default();
    let router = build_router(PortalHandler::new(Arc::clone(&mailbox)), &config);
    (router, mailbox)
}

async fn body_string(response: axum::response::Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, json: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_wifi_list() {
    let (app, mailbox) = create_test_app();
    mailbox.publish_networks(vec![
        WifiNetwork::new("Home", -41, false),
        WifiNetwork::new("Cafe", -77, true),
    ]);

    let response = app.oneshot(get("/api/wifi")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json[0]["ssid"], "Home");
    assert_eq!(json[0]["rssi"], -41);
    assert_eq!(json[1]["open"], true);

    assert!(mailbox.take_requests().scan);
}

#[tokio::test]
async fn test_mdns_list() {
    let (app, mailbox) = create_test_app();
    mailbox.publish_peers(vec![PeerHost::from_record(
        ServiceRecord::new("SmartEVSE-555", None, 80),
        "SmartEVSE",
    )]);

    let response = app.oneshot(get("/api/mdns")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, r#"[{"host":"SmartEVSE-555"}]"#);
    assert!(mailbox.take_requests().discovery);
}

#[tokio::test]
async fn test_index_served() {
    let (app, _mailbox) = create_test_app();

    let response = app.oneshot(get("/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get(header::CONTENT_TYPE).unwrap(), "text/html");
    assert!(response.headers().contains_key(header::LAST_MODIFIED));
    assert!(body_string(response).await.contains("<form"));
}

#[tokio::test]
async fn test_static_asset_types() {
    let (app, _mailbox) = create_test_app();

    let css = app.clone().oneshot(get("/style.css")).await.unwrap();
    assert_eq!(css.status(), StatusCode::OK);
    assert_eq!(css.headers().get(header::CONTENT_TYPE).unwrap(), "text/css");

    let js = app.oneshot(get("/script.js")).await.unwrap();
    assert_eq!(js.status(), StatusCode::OK);
    let js_type = js.headers().get(header::CONTENT_TYPE).unwrap().to_str().unwrap();
    assert!(js_type.ends_with("/javascript"));
}

#[tokio::test]
async fn test_unknown_path_not_found() {
    let (app, _mailbox) = create_test_app();

    let response = app.oneshot(get("/generate_204")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_string(response).await, "Not found 404");
}

#[tokio::test]
async fn test_save_credentials() {
    let (app, mailbox) = create_test_app();

    let response = app
        .oneshot(post_json("/", r#"{"ssid":"Home","password":"hunter22"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_string(response).await, "OK");

    let credentials = mailbox.take_requests().credentials.unwrap();
    assert_eq!(credentials.ssid, "Home");
    assert_eq!(credentials.password, "hunter22");
}

#[tokio::test]
async fn test_save_credentials_rejects_bad_body() {
    let (app, mailbox) = create_test_app();

    let missing = app
        .clone()
        .oneshot(post_json("/", r#"{"password":"x"}"#))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

    let garbage = app.oneshot(post_json("/", "ssid=Home")).await.unwrap();
    assert_eq!(garbage.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_string(garbage).await, "Error");

    assert!(mailbox.take_requests().credentials.is_none());
}

#[tokio::test]
async fn test_reboot_query() {
    let (app, mailbox) = create_test_app();

    let response = app
        .oneshot(get("/success.html?reboot=true"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(mailbox.take_requests().reboot);
}
