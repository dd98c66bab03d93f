//! # Share Dispatcher
//!
//! Sends a finished card through WhatsApp, email or the platform share sheet.
//!
//! The platform (browser, terminal, test double) is abstracted behind
//! [`SharePlatform`]. The dispatcher decides the route:
//!
//! | Channel  | Native share attempted when             | Attachments      | Fallback            |
//! |----------|-----------------------------------------|------------------|---------------------|
//! | WhatsApp | mobile device with native file sharing  | front + back PNG | `https://wa.me/...` |
//! | Email    | native sharing available                | front PNG        | `mailto:...`        |
//!
//! Cancelling the share sheet ends the dispatch quietly. Any other native
//! failure falls through to the link. If the link cannot be opened either,
//! the failure is returned to the caller instead of being swallowed.
//!
//! One dispatch runs at a time; calls made while one is in flight are
//! ignored.

mod compose;

pub use compose::{
    encode_uri_component, is_mobile_user_agent, mailto_link, message_body, share_title,
    whatsapp_link, whatsapp_text,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::card::PostcardRecord;
use crate::error::CardError;
use crate::export::{CardExporter, ExportedImage, RenderOptions};

/// Where the user wants the card to go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareChannel {
    WhatsApp,
    Email,
}

impl fmt::Display for ShareChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShareChannel::WhatsApp => "whatsapp",
            ShareChannel::Email => "email",
        })
    }
}

impl FromStr for ShareChannel {
    type Err = CardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "whatsapp" => Ok(ShareChannel::WhatsApp),
            "email" | "mail" => Ok(ShareChannel::Email),
            _ => Err(CardError::Validation(format!("Unknown share channel '{}'", s))),
        }
    }
}

/// A file handed to the native share sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareFile {
    pub name: String,
    pub mime_type: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl ShareFile {
    fn from_export(image: ExportedImage, name: &str) -> Self {
        Self {
            name: name.to_string(),
            mime_type: image.mime_type.to_string(),
            bytes: image.bytes,
        }
    }
}

/// Contents of a native share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SharePayload {
    pub title: String,
    pub text: String,
    pub files: Vec<ShareFile>,
}

/// How a native share ended when it did not succeed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NativeShareError {
    /// The user dismissed the share sheet.
    #[error("share cancelled")]
    Aborted,
    #[error("native share failed: {0}")]
    Failed(String),
}

/// Capabilities and actions of the device doing the sharing.
#[async_trait]
pub trait SharePlatform: Send + Sync {
    /// Phone or tablet.
    fn is_mobile(&self) -> bool;

    /// A native share sheet exists.
    fn supports_native_share(&self) -> bool;

    /// The share sheet accepts these files.
    fn can_share_files(&self, files: &[ShareFile]) -> bool;

    async fn share(&self, payload: SharePayload) -> Result<(), NativeShareError>;

    /// Open a link (new tab for `https:`, mail client for `mailto:`).
    async fn open_url(&self, url: &str) -> Result<(), CardError>;
}

/// The route a completed share took.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "route", content = "url", rename_all = "lowercase")]
pub enum ShareRoute {
    Native,
    Link(String),
}

/// Result of one dispatch.
#[derive(Debug)]
pub enum ShareOutcome {
    Done(ShareRoute),
    /// The user cancelled; nothing to report.
    Aborted,
    /// Another dispatch was already in flight.
    Ignored,
    /// Neither native share nor the link fallback worked.
    Failed(CardError),
}

/// Attachment names used by the share sheet.
const WHATSAPP_FRONT_FILE: &str = "holiday-card-front.png";
const WHATSAPP_BACK_FILE: &str = "holiday-card-back.png";
const EMAIL_FILE: &str = "holiday-card.png";

/// Clears the in-flight flag however the dispatch ends.
struct SharingGuard<'a>(&'a AtomicBool);

impl Drop for SharingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Runs share dispatches, one at a time.
#[derive(Debug, Default)]
pub struct ShareDispatcher {
    sharing: AtomicBool,
}

impl ShareDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_sharing(&self) -> bool {
        self.sharing.load(Ordering::SeqCst)
    }

    pub async fn dispatch(
        &self,
        channel: ShareChannel,
        record: &PostcardRecord,
        exporter: &CardExporter,
        platform: &dyn SharePlatform,
    ) -> ShareOutcome {
        if self
            .sharing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!(%channel, "share already in progress, ignoring");
            return ShareOutcome::Ignored;
        }
        let _guard = SharingGuard(&self.sharing);

        let (native, fallback) = match channel {
            ShareChannel::WhatsApp => {
                let text = whatsapp_text(record);
                let native = if platform.is_mobile() && platform.supports_native_share() {
                    Some(share_whatsapp_native(record, &text, exporter, platform).await)
                } else {
                    None
                };
                (native, whatsapp_link(&text))
            }
            ShareChannel::Email => {
                let subject = share_title(record);
                let body = message_body(record);
                let native = if platform.supports_native_share() {
                    Some(share_email_native(record, &subject, &body, exporter, platform).await)
                } else {
                    None
                };
                (native, mailto_link(&subject, &body))
            }
        };

        match native {
            Some(Ok(())) => {
                info!(%channel, "shared through native share sheet");
                return ShareOutcome::Done(ShareRoute::Native);
            }
            Some(Err(NativeShareError::Aborted)) => {
                debug!(%channel, "share cancelled by user");
                return ShareOutcome::Aborted;
            }
            Some(Err(NativeShareError::Failed(e))) => {
                warn!(%channel, error = %e, "native sharing failed, falling back to link");
            }
            None => {}
        }

        match platform.open_url(&fallback).await {
            Ok(()) => {
                info!(%channel, "opened share link");
                ShareOutcome::Done(ShareRoute::Link(fallback))
            }
            Err(e) => {
                warn!(%channel, error = %e, "share link fallback failed");
                ShareOutcome::Failed(e)
            }
        }
    }
}

async fn share_whatsapp_native(
    record: &PostcardRecord,
    text: &str,
    exporter: &CardExporter,
    platform: &dyn SharePlatform,
) -> Result<(), NativeShareError> {
    let (front, back) = exporter
        .export_faces(record, &RenderOptions::for_share())
        .await
        .map_err(|e| NativeShareError::Failed(e.to_string()))?;
    let files = vec![
        ShareFile::from_export(front, WHATSAPP_FRONT_FILE),
        ShareFile::from_export(back, WHATSAPP_BACK_FILE),
    ];
    if !platform.can_share_files(&files) {
        return Err(NativeShareError::Failed(
            "platform cannot share image files".to_string(),
        ));
    }
    platform
        .share(SharePayload {
            title: share_title(record),
            text: text.to_string(),
            files,
        })
        .await
}

async fn share_email_native(
    record: &PostcardRecord,
    subject: &str,
    body: &str,
    exporter: &CardExporter,
    platform: &dyn SharePlatform,
) -> Result<(), NativeShareError> {
    let front = exporter
        .export_face_with(record, crate::card::CardFace::Front, &RenderOptions::for_share())
        .await
        .map_err(|e| NativeShareError::Failed(format!("could not prepare image: {}", e)))?;
    let files = vec![ShareFile::from_export(front, EMAIL_FILE)];
    if !platform.can_share_files(&files) {
        return Err(NativeShareError::Failed(
            "platform cannot share image files".to_string(),
        ));
    }
    platform
        .share(SharePayload {
            title: subject.to_string(),
            text: body.to_string(),
            files,
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_parsing() {
        assert_eq!("WhatsApp".parse::<ShareChannel>().unwrap(), ShareChannel::WhatsApp);
        assert_eq!("mail".parse::<ShareChannel>().unwrap(), ShareChannel::Email);
        assert!("sms".parse::<ShareChannel>().is_err());
    }

    #[test]
    fn test_route_serialization() {
        let link = serde_json::to_value(ShareRoute::Link("mailto:?x".into())).unwrap();
        assert_eq!(link["route"], "link");
        assert_eq!(link["url"], "mailto:?x");
        let native = serde_json::to_value(ShareRoute::Native).unwrap();
        assert_eq!(native["route"], "native");
    }

    #[test]
    fn test_guard_clears_flag() {
        let dispatcher = ShareDispatcher::new();
        dispatcher.sharing.store(true, Ordering::SeqCst);
        {
            let _guard = SharingGuard(&dispatcher.sharing);
            assert!(dispatcher.is_sharing());
        }
        assert!(!dispatcher.is_sharing());
    }
}
