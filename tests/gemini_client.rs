//! # Gemini Client Tests
//!
//! Runs [`GeminiService`] against a local mock of the `generateContent`
//! endpoint.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};

use holicard::form::{FormModel, GenerationRequest, Holiday, Vibe};
use holicard::generation::{GeminiConfig, GeminiService, GenerationService};
use holicard::{CardError, GenerationOrchestrator, GenerationStatus};

const PIXEL_PNG: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8BQDwAEhQGAhKmMIQAAAABJRU5ErkJggg==";

#[derive(Default)]
struct Mock {
    text_fails: bool,
    image_fails: bool,
    calls: Mutex<Vec<Call>>,
}

#[derive(Clone, Debug)]
struct Call {
    model: String,
    api_key: Option<String>,
    body: Value,
}

async fn generate_content(
    State(mock): State<Arc<Mock>>,
    Path(call): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let model = call.trim_end_matches(":generateContent").to_string();
    mock.calls.lock().unwrap().push(Call {
        model: model.clone(),
        api_key: headers
            .get("x-goog-api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    });

    if model.contains("image") {
        if mock.image_fails {
            return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
        }
        Json(json!({
            "candidates": [{ "content": { "parts": [
                { "text": "here you go" },
                { "inlineData": { "mimeType": "image/png", "data": PIXEL_PNG } }
            ]}}]
        }))
        .into_response()
    } else {
        if mock.text_fails {
            return (StatusCode::SERVICE_UNAVAILABLE, "overloaded").into_response();
        }
        Json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "  Jingle all the way, Sam!\n" }] } }]
        }))
        .into_response()
    }
}

/// Start the mock on an ephemeral port and return a service pointed at it.
async fn start(mock: Mock) -> (Arc<Mock>, GeminiService) {
    let mock = Arc::new(mock);
    let app = Router::new()
        .route("/v1beta/models/:call", post(generate_content))
        .with_state(mock.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = GeminiConfig {
        api_key: Some("test-key".into()),
        base_url: format!("http://{}", addr),
        ..Default::default()
    };
    (mock, GeminiService::new(reqwest::Client::new(), config))
}

fn request(include_image: bool) -> GenerationRequest {
    FormModel {
        recipient: "Sam".into(),
        sender: "Ana".into(),
        holiday: Holiday::Christmas,
        vibe: Vibe::Funny,
        theme: "Snowy Cabin".into(),
        include_image,
        ..Default::default()
    }
    .to_request()
    .unwrap()
}

#[tokio::test]
async fn text_call_sends_key_and_prompt() {
    let (mock, service) = start(Mock::default()).await;

    let text = service.generate_text(&request(false)).await.unwrap();
    assert_eq!(text, "Jingle all the way, Sam!");

    let calls = mock.calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].model, "gemini-3-flash-preview");
    assert_eq!(calls[0].api_key.as_deref(), Some("test-key"));
    assert_eq!(calls[0].body["generationConfig"]["maxOutputTokens"], 100);
    let prompt = calls[0].body["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(prompt.contains("Sam"));
    assert!(prompt.contains("Ana"));
    assert!(prompt.contains("Snowy Cabin"));
}

#[tokio::test]
async fn image_call_returns_inline_data() {
    let (mock, service) = start(Mock::default()).await;

    let image = service.generate_image(&request(true)).await;
    assert!(image.as_str().starts_with("data:image/png;base64,"));
    assert!(image.decode_data_uri().unwrap().is_ok());

    let calls = mock.calls.lock().unwrap().clone();
    assert_eq!(calls[0].model, "gemini-2.5-flash-image");
    assert_eq!(calls[0].body["generationConfig"]["imageConfig"]["aspectRatio"], "4:3");
}

#[tokio::test]
async fn text_provider_error_is_fatal() {
    let (_, service) = start(Mock {
        text_fails: true,
        ..Default::default()
    })
    .await;
    let orchestrator = GenerationOrchestrator::new(Arc::new(service));

    let result = orchestrator.submit(request(true)).await;
    assert!(matches!(result, Err(CardError::TextGeneration(_))));
    assert_eq!(orchestrator.status().await, GenerationStatus::Error);
}

#[tokio::test]
async fn image_provider_error_uses_placeholder() {
    let (mock, service) = start(Mock {
        image_fails: true,
        ..Default::default()
    })
    .await;
    let orchestrator = GenerationOrchestrator::new(Arc::new(service));

    let record = orchestrator.submit(request(true)).await.unwrap();

    let image = record.image.expect("placeholder");
    assert!(image.as_str().starts_with("https://picsum.photos/800/600?random="));
    let seed: u32 = image.as_str().rsplit('=').next().unwrap().parse().unwrap();
    assert!(seed < 1000);
    assert_eq!(orchestrator.status().await, GenerationStatus::Complete);
    // text first, then image
    let models: Vec<_> = mock.calls.lock().unwrap().iter().map(|c| c.model.clone()).collect();
    assert_eq!(models, ["gemini-3-flash-preview", "gemini-2.5-flash-image"]);
}
