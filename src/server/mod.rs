//! # HTTP Server for the Postcard Maker
//!
//! Serves the web UI and a JSON API for generating, previewing, downloading
//! and sharing postcards.
//!
//! ## Usage
//!
//! ```bash
//! GEMINI_API_KEY=... holicard serve --listen 0.0.0.0:8080
//! ```
//!
//! Then open http://localhost:8080 in a browser.
//!
//! Each browser tab gets its own session (postcard, preview and font cache).
//! Sessions idle for more than 30 minutes are dropped.

mod handlers;
mod state;
mod static_files;

pub use handlers::error_response;
pub use handlers::share::{ClientPlatform, SharePlan};
pub use state::{AppState, PreviewState, SESSION_EXPIRATION_SECS, ServerConfig, Session};

use axum::{
    Router,
    routing::{get, post, put},
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::CardError;
use crate::generation::GenerationService;

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Frontend
        .route("/", get(static_files::index_handler))
        .route("/assets/*path", get(static_files::asset_handler))
        // Form choices
        .route("/api/options", get(handlers::session::options))
        // Sessions
        .route("/api/sessions", post(handlers::session::create))
        .route("/api/sessions/:id", get(handlers::session::show))
        .route(
            "/api/sessions/:id/generate",
            post(handlers::session::generate),
        )
        .route("/api/sessions/:id/reset", post(handlers::session::reset))
        .route("/api/sessions/:id/font", put(handlers::session::set_font))
        .route("/api/sessions/:id/flip", post(handlers::session::flip))
        // Export and share
        .route(
            "/api/sessions/:id/export/:face",
            get(handlers::export::export_face),
        )
        .route(
            "/api/sessions/:id/share/:channel",
            post(handlers::share::share),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use std::sync::Arc;
/// use holicard::generation::{GeminiConfig, GeminiService};
/// use holicard::server::{serve, ServerConfig};
///
/// # async fn example() -> Result<(), holicard::CardError> {
/// let config = ServerConfig {
///     listen_addr: "0.0.0.0:8080".to_string(),
///     font_base_url: None,
/// };
/// let service = GeminiService::new(reqwest::Client::new(), GeminiConfig::from_env());
///
/// serve(config, Arc::new(service)).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(
    config: ServerConfig,
    service: Arc<dyn GenerationService>,
) -> Result<(), CardError> {
    let app_state = Arc::new(AppState::new(
        config.clone(),
        service,
        reqwest::Client::new(),
    ));

    // Spawn background session cleanup task
    tokio::spawn(cleanup_sessions(app_state.clone()));

    let app = router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| {
            CardError::Transport(format!("Failed to bind to {}: {}", config.listen_addr, e))
        })?;

    info!(listen = %config.listen_addr, "holicard HTTP server started");
    match &config.font_base_url {
        Some(url) => info!(font_source = %url, "card fonts load on first export"),
        None => info!("card fonts disabled, exports use the bitmap face"),
    }

    axum::serve(listener, app)
        .await
        .map_err(|e| CardError::Transport(format!("Server error: {}", e)))?;

    Ok(())
}

/// Background task to drop idle sessions.
async fn cleanup_sessions(state: Arc<AppState>) {
    let mut interval = tokio::time::interval(Duration::from_secs(60));
    let expiration = Duration::from_secs(SESSION_EXPIRATION_SECS);

    loop {
        interval.tick().await;
        let removed = state.expire_sessions(Instant::now(), expiration).await;
        if removed > 0 {
            let remaining = state.sessions.read().await.len();
            info!(removed, remaining, "cleaned up expired sessions");
        }
    }
}
