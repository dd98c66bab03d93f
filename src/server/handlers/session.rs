//! Session, generation and preview handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::card::{PostcardFont, PostcardRecord};
use crate::error::CardError;
use crate::form::{FormModel, Holiday, Vibe};
use crate::orchestrator::GenerationStatus;

use super::super::state::{AppState, Session};
use super::{error_response, find_session};

/// Session state as the browser sees it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: Uuid,
    pub status: GenerationStatus,
    /// Submit button caption for the current status.
    pub label: &'static str,
    pub busy: bool,
    pub record: Option<PostcardRecord>,
    pub error: Option<String>,
    pub flipped: bool,
}

async fn view(id: Uuid, session: &Session) -> SessionView {
    let snapshot = session.orchestrator.snapshot().await;
    let preview = *session.preview.read().await;
    SessionView {
        id,
        status: snapshot.status,
        label: snapshot.status.label(),
        busy: snapshot.status.is_busy(),
        record: snapshot.record,
        error: snapshot.error,
        flipped: preview.flipped,
    }
}

/// Font entry for the style picker.
#[derive(Debug, Serialize)]
pub struct FontOption {
    pub value: PostcardFont,
    pub label: &'static str,
    pub family: &'static str,
}

/// Theme placeholders, keyed by the artwork toggle.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeHints {
    pub with_image: &'static str,
    pub without_image: &'static str,
}

/// Choices offered by the form.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardOptions {
    pub holidays: Vec<Holiday>,
    pub vibes: Vec<Vibe>,
    pub fonts: Vec<FontOption>,
    pub theme_hints: ThemeHints,
}

pub fn card_options() -> CardOptions {
    CardOptions {
        holidays: Holiday::ALL.to_vec(),
        vibes: Vibe::ALL.to_vec(),
        fonts: PostcardFont::ALL
            .into_iter()
            .map(|font| FontOption {
                value: font,
                label: font.label(),
                family: font.css_family(),
            })
            .collect(),
        theme_hints: ThemeHints {
            with_image: FormModel::default().theme_hint(),
            without_image: FormModel {
                include_image: false,
                ..Default::default()
            }
            .theme_hint(),
        },
    }
}

/// GET /api/options - Holidays, vibes and fonts.
pub async fn options() -> Json<CardOptions> {
    Json(card_options())
}

/// POST /api/sessions - Start a browser session.
pub async fn create(State(state): State<Arc<AppState>>) -> (StatusCode, Json<SessionView>) {
    let (id, session) = state.create_session().await;
    (StatusCode::CREATED, Json(view(id, &session).await))
}

/// GET /api/sessions/:id - Current status, card and preview state.
pub async fn show(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, (StatusCode, String)> {
    let session = find_session(&state, id).await?;
    Ok(Json(view(id, &session).await))
}

/// POST /api/sessions/:id/generate - Submit the form.
pub async fn generate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(form): Json<FormModel>,
) -> Result<Json<SessionView>, (StatusCode, String)> {
    let session = find_session(&state, id).await?;
    let request = form.to_request().map_err(|e| error_response(&e))?;

    // Run detached so a dropped connection cannot leave the session stuck
    // in a generating state.
    let worker = session.clone();
    let result = tokio::spawn(async move { worker.orchestrator.submit(request).await })
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Task error: {}", e),
            )
        })?;

    match result {
        Ok(_) => {
            *session.preview.write().await = Default::default();
            Ok(Json(view(id, &session).await))
        }
        Err(e) => {
            if !matches!(e, CardError::Busy | CardError::Superseded) {
                warn!(session = %id, error = %e, "generation failed");
            }
            Err(error_response(&e))
        }
    }
}

/// POST /api/sessions/:id/reset - Start over.
pub async fn reset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, (StatusCode, String)> {
    let session = find_session(&state, id).await?;
    session.reset().await;
    Ok(Json(view(id, &session).await))
}

/// Request body for the font endpoint.
#[derive(Debug, Deserialize)]
pub struct FontRequest {
    pub font: PostcardFont,
}

/// PUT /api/sessions/:id/font - Restyle the message and show the back.
pub async fn set_font(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<FontRequest>,
) -> Result<Json<SessionView>, (StatusCode, String)> {
    let session = find_session(&state, id).await?;
    session
        .orchestrator
        .set_font(req.font)
        .await
        .map_err(|e| error_response(&e))?;
    session.preview.write().await.flipped = true;
    Ok(Json(view(id, &session).await))
}

/// POST /api/sessions/:id/flip - Turn the on-screen card over.
pub async fn flip(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, (StatusCode, String)> {
    let session = find_session(&state, id).await?;
    if session.orchestrator.record().await.is_none() {
        return Err(error_response(&CardError::NoPostcard));
    }
    {
        let mut preview = session.preview.write().await;
        preview.flipped = !preview.flipped;
    }
    Ok(Json(view(id, &session).await))
}
