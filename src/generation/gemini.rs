//! Google Gemini `generateContent` client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{DEFAULT_WISH, GenerationService, fallback, image_prompt, text_prompt};
use crate::card::ImageRef;
use crate::error::CardError;
use crate::form::GenerationRequest;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";

/// Connection settings for the Gemini API.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key. Without one, text generation fails and images fall back.
    pub api_key: Option<String>,
    pub base_url: String,
    pub text_model: String,
    pub image_model: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
        }
    }
}

impl GeminiConfig {
    /// Defaults with the key taken from `GEMINI_API_KEY` or `API_KEY`.
    pub fn from_env() -> Self {
        let api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("API_KEY"))
            .ok()
            .filter(|k| !k.trim().is_empty());
        Self {
            api_key,
            ..Default::default()
        }
    }
}

// ============================================================================
// WIRE FORMAT
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    data: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_config: Option<ImageConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageConfig {
    aspect_ratio: String,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

impl GenerateContentRequest {
    fn prompt(prompt: String, generation_config: GenerationConfig) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(prompt),
                    inline_data: None,
                }],
            }],
            generation_config,
        }
    }
}

impl GenerateContentResponse {
    fn first_parts(&self) -> &[Part] {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.as_slice())
            .unwrap_or_default()
    }

    /// Concatenated text of the first candidate, trimmed.
    fn text(&self) -> Option<String> {
        let text: String = self
            .first_parts()
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }

    /// First inline image of the first candidate.
    fn inline_image(&self) -> Option<ImageRef> {
        self.first_parts()
            .iter()
            .filter_map(|p| p.inline_data.as_ref())
            .find(|d| !d.data.is_empty())
            .map(|d| {
                let mime = if d.mime_type.is_empty() {
                    "image/png"
                } else {
                    d.mime_type.as_str()
                };
                ImageRef::from_base64(mime, &d.data)
            })
    }
}

// ============================================================================
// CLIENT
// ============================================================================

/// [`GenerationService`] backed by the Gemini REST API.
pub struct GeminiService {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiService {
    pub fn new(client: reqwest::Client, config: GeminiConfig) -> Self {
        Self { client, config }
    }

    async fn generate_content(
        &self,
        model: &str,
        body: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| "no API key configured".to_string())?;
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            model
        );
        debug!(model, "calling generateContent");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| format!("request to {} failed: {}", model, e))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            let detail: String = detail.chars().take(200).collect();
            return Err(format!("{} returned HTTP {}: {}", model, status, detail));
        }

        response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| format!("invalid response from {}: {}", model, e))
    }
}

#[async_trait]
impl GenerationService for GeminiService {
    async fn generate_text(&self, request: &GenerationRequest) -> Result<String, CardError> {
        let body = GenerateContentRequest::prompt(
            text_prompt(request),
            GenerationConfig {
                max_output_tokens: Some(100),
                temperature: Some(0.8),
                ..Default::default()
            },
        );

        match self.generate_content(&self.config.text_model, &body).await {
            Ok(response) => Ok(response.text().unwrap_or_else(|| DEFAULT_WISH.to_string())),
            Err(e) => {
                warn!(error = %e, "text generation failed");
                Err(CardError::TextGeneration(e))
            }
        }
    }

    async fn generate_image(&self, request: &GenerationRequest) -> ImageRef {
        let body = GenerateContentRequest::prompt(
            image_prompt(request),
            GenerationConfig {
                image_config: Some(ImageConfig {
                    aspect_ratio: "4:3".to_string(),
                }),
                ..Default::default()
            },
        );

        let result = self
            .generate_content(&self.config.image_model, &body)
            .await
            .and_then(|r| {
                r.inline_image()
                    .ok_or_else(|| "no image data found in response".to_string())
            });

        match result {
            Ok(image) => image,
            Err(e) => {
                let error = CardError::ImageGeneration(e);
                warn!(%error, "using placeholder artwork");
                fallback::placeholder_image()
            }
        }
    }
}
