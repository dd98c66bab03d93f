//! # Holicard - Holiday Postcard Generator
//!
//! Holicard turns a short form (who, from whom, which holiday, which tone)
//! into a two-sided postcard:
//!
//! - **Generation**: a wish written by Gemini (or the user's own words) and
//!   optional AI artwork, with a placeholder when the artwork fails
//! - **Export**: both faces rendered at a fixed 800×600 canvas, 2× density
//! - **Sharing**: native share sheet on phones, WhatsApp and `mailto:` links
//!   everywhere else
//! - **Server**: a small web UI and JSON API around all of the above
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use holicard::{
//!     card::CardFace,
//!     export::CardExporter,
//!     form::{FormModel, Holiday},
//!     generation::{GeminiConfig, GeminiService},
//!     orchestrator::GenerationOrchestrator,
//! };
//!
//! # async fn example() -> Result<(), holicard::CardError> {
//! let service = GeminiService::new(reqwest::Client::new(), GeminiConfig::from_env());
//! let orchestrator = GenerationOrchestrator::new(Arc::new(service));
//!
//! let form = FormModel {
//!     recipient: "Sam".into(),
//!     sender: "Ana".into(),
//!     holiday: Holiday::Christmas,
//!     ..Default::default()
//! };
//! let record = orchestrator.submit(form.to_request()?).await?;
//!
//! let front = CardExporter::offline().export_face(&record, CardFace::Front).await?;
//! front.save(std::path::Path::new("."))?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`form`] | Form state, holidays, vibes, validated requests |
//! | [`generation`] | AI provider facade and Gemini client |
//! | [`orchestrator`] | Text → image generation state machine |
//! | [`card`] | The finished postcard record |
//! | [`export`] | Card face rasterization and encoding |
//! | [`share`] | WhatsApp / email / native share dispatch |
//! | [`server`] | HTTP server and web UI |
//! | [`error`] | Error types |

pub mod card;
pub mod error;
pub mod export;
pub mod form;
pub mod generation;
pub mod orchestrator;
pub mod server;
pub mod share;

// Re-exports for convenience
pub use card::{CardFace, PostcardFont, PostcardRecord};
pub use error::CardError;
pub use form::{FormModel, GenerationRequest};
pub use orchestrator::{GenerationOrchestrator, GenerationStatus};
