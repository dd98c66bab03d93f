//! # Generation Orchestrator
//!
//! Drives one postcard from request to record:
//!
//! ```text
//! Idle ─submit─▶ GeneratingText ─(include_image)─▶ GeneratingImage ─▶ Complete
//!                      │                                                   ▲
//!                      └──────────────(no image)───────────────────────────┘
//!                      └─text failure─▶ Error
//! ```
//!
//! Only one submission runs at a time. The status, the record and the error
//! banner live behind one lock; the lock is taken around each transition and
//! never held across a provider call.
//!
//! Every `submit` and `reset` bumps an epoch. A submission only writes state
//! while its epoch is still current, so a slow reply that lands after the user
//! pressed "Start Over" is dropped instead of resurrecting the old card.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::card::{PostcardFont, PostcardRecord};
use crate::error::CardError;
use crate::form::GenerationRequest;
use crate::generation::GenerationService;

/// Banner shown when a submission fails.
pub const GENERATION_ERROR_MESSAGE: &str =
    "Oops! The elves dropped the connection. Please try again.";

/// Where the current submission is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GenerationStatus {
    #[default]
    Idle,
    GeneratingText,
    GeneratingImage,
    Complete,
    Error,
}

impl GenerationStatus {
    /// A provider call is in flight.
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            GenerationStatus::GeneratingText | GenerationStatus::GeneratingImage
        )
    }

    pub fn accepts_submission(self) -> bool {
        !self.is_busy()
    }

    /// Submit button caption.
    pub fn label(self) -> &'static str {
        match self {
            GenerationStatus::GeneratingText => "Writing Wish...",
            GenerationStatus::GeneratingImage => "Painting Card...",
            _ => "Create Postcard",
        }
    }
}

/// Read-only view of the orchestrator state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrchestratorSnapshot {
    pub status: GenerationStatus,
    pub record: Option<PostcardRecord>,
    pub error: Option<String>,
    pub epoch: u64,
}

#[derive(Debug, Default)]
struct State {
    status: GenerationStatus,
    record: Option<PostcardRecord>,
    error: Option<String>,
    epoch: u64,
}

/// Owner of the single status/record pair.
pub struct GenerationOrchestrator {
    service: Arc<dyn GenerationService>,
    state: RwLock<State>,
}

impl GenerationOrchestrator {
    pub fn new(service: Arc<dyn GenerationService>) -> Self {
        Self {
            service,
            state: RwLock::new(State::default()),
        }
    }

    pub async fn snapshot(&self) -> OrchestratorSnapshot {
        let state = self.state.read().await;
        OrchestratorSnapshot {
            status: state.status,
            record: state.record.clone(),
            error: state.error.clone(),
            epoch: state.epoch,
        }
    }

    pub async fn status(&self) -> GenerationStatus {
        self.state.read().await.status
    }

    /// Generate a postcard.
    ///
    /// Rejected with [`CardError::Busy`] while another submission runs, and
    /// resolves to [`CardError::Superseded`] if a reset or newer submission
    /// took over in the meantime.
    pub async fn submit(&self, request: GenerationRequest) -> Result<PostcardRecord, CardError> {
        let epoch = {
            let mut state = self.state.write().await;
            if !state.status.accepts_submission() {
                return Err(CardError::Busy);
            }
            state.epoch += 1;
            state.status = GenerationStatus::GeneratingText;
            state.record = None;
            state.error = None;
            state.epoch
        };
        info!(
            epoch,
            holiday = %request.holiday(),
            include_image = request.include_image(),
            "generating postcard"
        );

        let result = self.run(epoch, &request).await;

        let mut state = self.state.write().await;
        if state.epoch != epoch {
            debug!(epoch, current = state.epoch, "discarding stale generation result");
            return Err(CardError::Superseded);
        }
        match result {
            Ok(record) => {
                state.status = GenerationStatus::Complete;
                state.record = Some(record.clone());
                info!(epoch, "postcard complete");
                Ok(record)
            }
            Err(e) => {
                warn!(epoch, error = %e, "postcard generation failed");
                state.status = GenerationStatus::Error;
                state.record = None;
                state.error = Some(GENERATION_ERROR_MESSAGE.to_string());
                Err(e)
            }
        }
    }

    async fn run(&self, epoch: u64, request: &GenerationRequest) -> Result<PostcardRecord, CardError> {
        let message = match request.custom_message() {
            Some(message) => message.to_string(),
            None => self.service.generate_text(request).await?,
        };

        let image = if request.include_image() {
            if !self.transition(epoch, GenerationStatus::GeneratingImage).await {
                return Err(CardError::Superseded);
            }
            Some(self.service.generate_image(request).await)
        } else {
            None
        };

        Ok(PostcardRecord::new(request, message, image))
    }

    /// Move to `status` if `epoch` is still current.
    async fn transition(&self, epoch: u64, status: GenerationStatus) -> bool {
        let mut state = self.state.write().await;
        if state.epoch != epoch {
            return false;
        }
        state.status = status;
        true
    }

    /// Start over: drop the card and invalidate any in-flight submission.
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        state.epoch += 1;
        state.status = GenerationStatus::Idle;
        state.record = None;
        state.error = None;
    }

    /// Restyle the finished card without regenerating it.
    pub async fn set_font(&self, font: PostcardFont) -> Result<PostcardRecord, CardError> {
        let mut state = self.state.write().await;
        let record = state.record.as_mut().ok_or(CardError::NoPostcard)?;
        record.font = font;
        Ok(record.clone())
    }

    /// The finished card, if any.
    pub async fn record(&self) -> Option<PostcardRecord> {
        self.state.read().await.record.clone()
    }
}
