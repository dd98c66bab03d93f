//! Share handler.
//!
//! The share sheet and new tabs only exist in the browser, so the server runs
//! the dispatcher against a [`ClientPlatform`] built from the capabilities the
//! browser reports. The platform records what the browser should do next, and
//! the handler returns that as a [`SharePlan`].

use async_trait::async_trait;
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::info;
use uuid::Uuid;

use crate::card::PostcardRecord;
use crate::error::CardError;
use crate::share::{
    NativeShareError, ShareChannel, ShareFile, ShareOutcome, SharePayload, SharePlatform,
    ShareRoute, is_mobile_user_agent, mailto_link, message_body, share_title, whatsapp_link,
    whatsapp_text,
};

use super::super::state::AppState;
use super::{error_response, find_session};

/// Browser capabilities sent with a share request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareRequest {
    #[serde(default)]
    pub user_agent: String,
    /// `navigator.share` exists.
    #[serde(default)]
    pub native_share: bool,
    /// `navigator.canShare({ files })` returned true.
    #[serde(default)]
    pub file_share: bool,
}

/// A file for `navigator.share`, base64 encoded.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanFile {
    pub name: String,
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NativePlan {
    pub title: String,
    pub text: String,
    pub files: Vec<PlanFile>,
    /// Opened when the share sheet fails for any reason other than the user
    /// cancelling it.
    pub fallback_url: String,
}

/// What the browser should do to complete the share.
#[derive(Debug, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum SharePlan {
    Native(NativePlan),
    Open { url: String },
    None,
}

enum Handoff {
    Native(SharePayload),
    Open(String),
}

/// The requesting browser, as seen by the dispatcher.
pub struct ClientPlatform {
    mobile: bool,
    native_share: bool,
    file_share: bool,
    handoff: Mutex<Option<Handoff>>,
}

impl ClientPlatform {
    pub fn new(user_agent: &str, native_share: bool, file_share: bool) -> Self {
        Self {
            mobile: is_mobile_user_agent(user_agent),
            native_share,
            file_share,
            handoff: Mutex::new(None),
        }
    }

    fn set(&self, handoff: Handoff) {
        *self.handoff.lock().unwrap_or_else(|e| e.into_inner()) = Some(handoff);
    }

    fn take(&self) -> Option<Handoff> {
        self.handoff.lock().unwrap_or_else(|e| e.into_inner()).take()
    }
}

#[async_trait]
impl SharePlatform for ClientPlatform {
    fn is_mobile(&self) -> bool {
        self.mobile
    }

    fn supports_native_share(&self) -> bool {
        self.native_share
    }

    fn can_share_files(&self, files: &[ShareFile]) -> bool {
        self.file_share && !files.is_empty()
    }

    async fn share(&self, payload: SharePayload) -> Result<(), NativeShareError> {
        self.set(Handoff::Native(payload));
        Ok(())
    }

    async fn open_url(&self, url: &str) -> Result<(), CardError> {
        self.set(Handoff::Open(url.to_string()));
        Ok(())
    }
}

fn fallback_url(channel: ShareChannel, record: &PostcardRecord) -> String {
    match channel {
        ShareChannel::WhatsApp => whatsapp_link(&whatsapp_text(record)),
        ShareChannel::Email => mailto_link(&share_title(record), &message_body(record)),
    }
}

/// POST /api/sessions/:id/share/:channel - Plan a WhatsApp or email share.
pub async fn share(
    State(state): State<Arc<AppState>>,
    Path((id, channel)): Path<(Uuid, String)>,
    headers: HeaderMap,
    Json(req): Json<ShareRequest>,
) -> Result<Json<SharePlan>, (StatusCode, String)> {
    let channel: ShareChannel = channel.parse().map_err(|e| error_response(&e))?;
    let session = find_session(&state, id).await?;
    let record = session
        .orchestrator
        .record()
        .await
        .ok_or_else(|| error_response(&CardError::NoPostcard))?;

    let user_agent = if req.user_agent.trim().is_empty() {
        headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    } else {
        req.user_agent
    };
    let platform = ClientPlatform::new(&user_agent, req.native_share, req.file_share);

    let outcome = session
        .dispatcher
        .dispatch(channel, &record, &session.exporter, &platform)
        .await;

    let plan = match outcome {
        ShareOutcome::Done(route) => match (route, platform.take()) {
            (ShareRoute::Native, Some(Handoff::Native(payload))) => SharePlan::Native(NativePlan {
                title: payload.title,
                text: payload.text,
                files: payload
                    .files
                    .into_iter()
                    .map(|file| PlanFile {
                        data: STANDARD.encode(&file.bytes),
                        name: file.name,
                        mime_type: file.mime_type,
                    })
                    .collect(),
                fallback_url: fallback_url(channel, &record),
            }),
            (ShareRoute::Link(url), _) => SharePlan::Open { url },
            (ShareRoute::Native, _) => SharePlan::None,
        },
        ShareOutcome::Aborted => SharePlan::None,
        ShareOutcome::Ignored => {
            return Err((
                StatusCode::CONFLICT,
                "A share is already in progress".to_string(),
            ));
        }
        ShareOutcome::Failed(e) => return Err(error_response(&e)),
    };

    info!(session = %id, %channel, "planned share");
    Ok(Json(plan))
}
