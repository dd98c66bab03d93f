//! # HTTP API Tests
//!
//! Drives the router in-process with `tower::ServiceExt::oneshot`.

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use std::sync::Arc;

use holicard::card::ImageRef;
use holicard::form::GenerationRequest;
use holicard::generation::GenerationService;
use holicard::orchestrator::GENERATION_ERROR_MESSAGE;
use holicard::server::{AppState, ServerConfig, router};
use holicard::CardError;
use tower::ServiceExt;

const IPHONE: &str =
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 Mobile/15E148";
const DESKTOP: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 Chrome/120.0";

struct StubService {
    fail_text: bool,
}

#[async_trait]
impl GenerationService for StubService {
    async fn generate_text(&self, _request: &GenerationRequest) -> Result<String, CardError> {
        if self.fail_text {
            Err(CardError::TextGeneration("HTTP 503".into()))
        } else {
            Ok("Wishing you a cozy season.".into())
        }
    }

    async fn generate_image(&self, _request: &GenerationRequest) -> ImageRef {
        ImageRef::new("https://picsum.photos/800/600?random=1")
    }
}

fn app(fail_text: bool) -> Router {
    let state = AppState::new(
        ServerConfig {
            listen_addr: "127.0.0.1:0".into(),
            font_base_url: None,
        },
        Arc::new(StubService { fail_text }),
        reqwest::Client::new(),
    );
    router(Arc::new(state))
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    user_agent: Option<&str>,
) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(ua) = user_agent {
        builder = builder.header(header::USER_AGENT, ua);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, bytes.to_vec())
}

async fn send_json(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, _, bytes) = send(app, method, uri, body, None).await;
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn new_session(app: &Router) -> String {
    let (status, view) = send_json(app, "POST", "/api/sessions", None).await;
    assert_eq!(status, StatusCode::CREATED);
    view["id"].as_str().unwrap().to_string()
}

async fn generated_session(app: &Router) -> String {
    let id = new_session(app).await;
    let (status, _) = send_json(
        app,
        "POST",
        &format!("/api/sessions/{}/generate", id),
        Some(json!({
            "recipient": "Sam",
            "sender": "Ana",
            "holiday": "Christmas",
            "vibe": "Funny",
            "customMessage": "Merry Christmas, Sam!",
            "includeImage": false
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    id
}

#[tokio::test]
async fn index_embeds_form_options() {
    let app = app(false);
    let (status, _, bytes) = send(&app, "GET", "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(bytes).unwrap();
    assert!(html.contains("window.__CARD_OPTIONS="));
    assert!(html.contains("Winter Solstice"));
}

#[tokio::test]
async fn options_list_every_choice() {
    let app = app(false);
    let (status, options) = send_json(&app, "GET", "/api/options", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(options["holidays"].as_array().unwrap().len(), 6);
    assert_eq!(options["vibes"].as_array().unwrap().len(), 5);
    assert_eq!(options["fonts"][1]["value"], "Great Vibes");
    assert_eq!(options["fonts"][1]["label"], "Elegant");
}

#[tokio::test]
async fn new_session_is_idle() {
    let app = app(false);
    let id = new_session(&app).await;
    let (status, view) = send_json(&app, "GET", &format!("/api/sessions/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["status"], "IDLE");
    assert_eq!(view["label"], "Create Postcard");
    assert_eq!(view["busy"], false);
    assert!(view["record"].is_null());
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let app = app(false);
    let (status, _) = send_json(
        &app,
        "GET",
        "/api/sessions/00000000-0000-4000-8000-000000000000",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn generate_uses_custom_message() {
    let app = app(false);
    let id = generated_session(&app).await;
    let (_, view) = send_json(&app, "GET", &format!("/api/sessions/{}", id), None).await;
    assert_eq!(view["status"], "COMPLETE");
    assert_eq!(view["record"]["message"], "Merry Christmas, Sam!");
    assert_eq!(view["record"]["font"], "Nunito");
    assert!(view["record"].get("imageUrl").is_none());
    assert_eq!(view["flipped"], false);
}

#[tokio::test]
async fn blank_recipient_is_rejected() {
    let app = app(false);
    let id = new_session(&app).await;
    let (status, _) = send_json(
        &app,
        "POST",
        &format!("/api/sessions/{}/generate", id),
        Some(json!({ "recipient": "  ", "sender": "Ana" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn provider_failure_shows_banner() {
    let app = app(true);
    let id = new_session(&app).await;
    let (status, _, bytes) = send(
        &app,
        "POST",
        &format!("/api/sessions/{}/generate", id),
        Some(json!({ "recipient": "Sam", "sender": "Ana" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(String::from_utf8(bytes).unwrap(), GENERATION_ERROR_MESSAGE);

    let (_, view) = send_json(&app, "GET", &format!("/api/sessions/{}", id), None).await;
    assert_eq!(view["status"], "ERROR");
    assert_eq!(view["error"], GENERATION_ERROR_MESSAGE);
    assert!(view["record"].is_null());
}

#[tokio::test]
async fn export_requires_a_card() {
    let app = app(false);
    let id = new_session(&app).await;
    let (status, _) = send_json(&app, "GET", &format!("/api/sessions/{}/export/front", id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn export_downloads_png() {
    let app = app(false);
    let id = generated_session(&app).await;

    let (status, headers, bytes) = send(
        &app,
        "GET",
        &format!("/api/sessions/{}/export/back", id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "image/png");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"holiday-card-back-christmas.png\""
    );
    let image = image::load_from_memory(&bytes).unwrap();
    assert_eq!((image.width(), image.height()), (1600, 1200));

    let (status, headers, bytes) = send(
        &app,
        "GET",
        &format!("/api/sessions/{}/export/front?inline=true&density=1", id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_DISPOSITION].to_str().unwrap().starts_with("inline"));
    let image = image::load_from_memory(&bytes).unwrap();
    assert_eq!((image.width(), image.height()), (800, 600));
}

#[tokio::test]
async fn export_rejects_bad_face_and_density() {
    let app = app(false);
    let id = generated_session(&app).await;
    let (status, _) = send_json(&app, "GET", &format!("/api/sessions/{}/export/side", id), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send_json(
        &app,
        "GET",
        &format!("/api/sessions/{}/export/front?density=9", id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn font_change_flips_to_back() {
    let app = app(false);
    let id = generated_session(&app).await;
    let (status, view) = send_json(
        &app,
        "PUT",
        &format!("/api/sessions/{}/font", id),
        Some(json!({ "font": "Dancing Script" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["record"]["font"], "Dancing Script");
    assert_eq!(view["record"]["message"], "Merry Christmas, Sam!");
    assert_eq!(view["flipped"], true);

    let (_, view) = send_json(&app, "POST", &format!("/api/sessions/{}/flip", id), None).await;
    assert_eq!(view["flipped"], false);
}

#[tokio::test]
async fn whatsapp_share_on_desktop_opens_link() {
    let app = app(false);
    let id = generated_session(&app).await;
    let (status, _, bytes) = send(
        &app,
        "POST",
        &format!("/api/sessions/{}/share/whatsapp", id),
        Some(json!({ "nativeShare": false, "fileShare": false })),
        Some(DESKTOP),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let plan: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(plan["action"], "open");
    let url = plan["url"].as_str().unwrap();
    assert!(url.starts_with("https://wa.me/?text=*Holiday%20Wish%20from%20Ana*"));
}

#[tokio::test]
async fn whatsapp_share_on_phone_sends_both_faces() {
    let app = app(false);
    let id = generated_session(&app).await;
    let (status, plan) = send_json(
        &app,
        "POST",
        &format!("/api/sessions/{}/share/whatsapp", id),
        Some(json!({ "userAgent": IPHONE, "nativeShare": true, "fileShare": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(plan["action"], "native");
    let files = plan["files"].as_array().unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0]["name"], "holiday-card-front.png");
    assert_eq!(files[1]["name"], "holiday-card-back.png");
    assert!(!files[0]["data"].as_str().unwrap().is_empty());
    assert!(plan["fallbackUrl"].as_str().unwrap().starts_with("https://wa.me/"));
}

#[tokio::test]
async fn email_share_without_native_uses_mailto() {
    let app = app(false);
    let id = generated_session(&app).await;
    let (status, plan) = send_json(
        &app,
        "POST",
        &format!("/api/sessions/{}/share/email", id),
        Some(json!({ "userAgent": DESKTOP })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(plan["action"], "open");
    assert!(plan["url"].as_str().unwrap().starts_with("mailto:?subject="));
}

#[tokio::test]
async fn reset_returns_to_form() {
    let app = app(false);
    let id = generated_session(&app).await;
    let (status, view) = send_json(&app, "POST", &format!("/api/sessions/{}/reset", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["status"], "IDLE");
    assert!(view["record"].is_null());

    let (status, _) = send_json(&app, "POST", &format!("/api/sessions/{}/share/email", id), Some(json!({}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}
