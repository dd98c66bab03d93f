//! Card face download handler.

use axum::{
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::card::CardFace;
use crate::error::CardError;
use crate::export::MAX_PIXEL_DENSITY;

use super::super::state::AppState;
use super::{error_response, find_session};

/// Query parameters for an export.
#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    /// Show in the page instead of downloading.
    #[serde(default)]
    pub inline: bool,
    /// Device pixels per logical pixel (1 to 4).
    pub density: Option<u32>,
}

/// GET /api/sessions/:id/export/:face - Render one face as PNG.
pub async fn export_face(
    State(state): State<Arc<AppState>>,
    Path((id, face)): Path<(Uuid, String)>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, (StatusCode, String)> {
    let face: CardFace = face.parse().map_err(|e| error_response(&e))?;
    let session = find_session(&state, id).await?;
    let record = session
        .orchestrator
        .record()
        .await
        .ok_or_else(|| error_response(&CardError::NoPostcard))?;

    let mut options = *session.exporter.options();
    if let Some(density) = query.density {
        if density == 0 || density > MAX_PIXEL_DENSITY {
            return Err(error_response(&CardError::Validation(format!(
                "density must be between 1 and {}",
                MAX_PIXEL_DENSITY
            ))));
        }
        options.pixel_density = density;
    }
    // Artwork is fetched once per session; a preview never triggers the
    // first download with a cache-busting URL.
    if query.inline {
        options.cache_bust = false;
    }

    let image = session
        .exporter
        .export_face_with(&record, face, &options)
        .await
        .map_err(|e| {
            warn!(session = %id, face = face.name(), error = %e, "export failed");
            error_response(&e)
        })?;
    info!(
        session = %id,
        face = face.name(),
        width = image.width,
        height = image.height,
        "exported card face"
    );

    let disposition = if query.inline {
        format!("inline; filename=\"{}\"", image.file_name)
    } else {
        format!("attachment; filename=\"{}\"", image.file_name)
    };
    Ok((
        [
            (header::CONTENT_TYPE, image.mime_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CACHE_CONTROL, "no-store".to_string()),
        ],
        image.bytes,
    )
        .into_response())
}
