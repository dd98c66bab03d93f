//! # Generation Service
//!
//! Facade over the generative-AI provider. Two calls, with deliberately
//! different failure contracts:
//!
//! - [`GenerationService::generate_text`] fails loudly. There is no fallback
//!   wish; the submission fails and the user tries again.
//! - [`GenerationService::generate_image`] never fails. On any provider
//!   problem it returns a [placeholder](fallback::placeholder_image) so the
//!   card can still be finished.
//!
//! [`GeminiService`] is the production implementation. Tests plug in fakes.

mod fallback;
mod gemini;

pub use fallback::{PLACEHOLDER_BASE, placeholder_image, placeholder_with_seed};
pub use gemini::{GeminiConfig, GeminiService};

use async_trait::async_trait;

use crate::card::ImageRef;
use crate::error::CardError;
use crate::form::{GenerationRequest, Vibe};

/// Reply used when the provider answers with an empty wish.
pub const DEFAULT_WISH: &str = "Happy Holidays!";

/// Stateless text and image generation.
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Write the holiday wish.
    async fn generate_text(&self, request: &GenerationRequest) -> Result<String, CardError>;

    /// Paint the background artwork, substituting a placeholder on failure.
    async fn generate_image(&self, request: &GenerationRequest) -> ImageRef;
}

/// Prompt for the wish text.
pub fn text_prompt(request: &GenerationRequest) -> String {
    format!(
        "Write a personalized, short holiday wish (max 40 words).\n\
         Recipient: {}\n\
         Sender: {}\n\
         Holiday: {}\n\
         Vibe/Tone: {}\n\
         Specific Theme: {}\n\
         \n\
         Output only the message text itself. Do not include quotes or \"Message:\" prefixes.",
        request.recipient(),
        request.sender(),
        request.holiday(),
        request.vibe(),
        request.theme().unwrap_or("General Holiday"),
    )
}

/// Prompt for the background artwork. Never asks for text in the image.
pub fn image_prompt(request: &GenerationRequest) -> String {
    let style = match request.vibe() {
        Vibe::Funny => "Cartoonish, whimsical, colorful",
        _ => "Elegant, cinematic, detailed, cozy lighting",
    };
    format!(
        "A high-quality, magical, digital art postcard background for {}.\n\
         Theme: {}.\n\
         Style: {}.\n\
         No text, no words, just artwork.",
        request.holiday(),
        request.theme().unwrap_or("Festive and warm"),
        style,
    )
}
