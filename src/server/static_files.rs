//! Embedded web UI.
//!
//! `frontend/dist` is compiled into the binary. The index page gets two
//! rewrites on the way out: asset URLs carry the boot time so browsers drop
//! stale bundles after a restart, and the form choices are inlined as
//! `window.__CARD_OPTIONS` so the page can render before any API call.

use axum::{
    extract::{Path, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use include_dir::{Dir, include_dir};
use std::sync::Arc;

use super::handlers::session::card_options;
use super::state::AppState;

static FRONTEND_DIST: Dir = include_dir!("$CARGO_MANIFEST_DIR/frontend/dist");

/// One year; asset URLs change whenever the server restarts.
const ASSET_MAX_AGE: &str = "public, max-age=31536000, immutable";

/// GET / - The postcard maker page.
pub async fn index_handler(State(state): State<Arc<AppState>>) -> Response {
    let Some(file) = FRONTEND_DIST.get_file("index.html") else {
        return (StatusCode::NOT_FOUND, "Frontend not built").into_response();
    };
    let page = String::from_utf8_lossy(file.contents());
    Html(render_index(&page, state.boot_time)).into_response()
}

fn render_index(page: &str, version: u64) -> String {
    let options = serde_json::to_string(&card_options()).unwrap_or_else(|_| "{}".to_string());
    page.replace(".js\"", &format!(".js?v={}\"", version))
        .replace(".css\"", &format!(".css?v={}\"", version))
        .replace(
            "</head>",
            &format!("<script>window.__CARD_OPTIONS={}</script></head>", options),
        )
}

/// GET /assets/*path - Scripts, styles and icons.
pub async fn asset_handler(Path(path): Path<String>) -> Response {
    let name = path.split('?').next().unwrap_or_default();
    match FRONTEND_DIST.get_file(format!("assets/{}", name)) {
        Some(file) => {
            let mime = mime_guess::from_path(name).first_or_octet_stream();
            (
                [
                    (header::CONTENT_TYPE, mime.to_string()),
                    (header::CACHE_CONTROL, ASSET_MAX_AGE.to_string()),
                ],
                file.contents(),
            )
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, "Asset not found").into_response(),
    }
}
