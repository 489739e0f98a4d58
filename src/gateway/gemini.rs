//! Gemini REST client for the poster workflow
//!
//! Image operations go to the image model with the source image as an inline
//! part; concept suggestion goes to the text model. The API key travels in the
//! `x-goog-api-key` header and is never logged.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

use super::{GatewayError, GatewayResult, PosterService};
use crate::config::AppConfig;
use crate::media::codec::InlineImage;
use crate::state::data::AspectRatio;

const REMOVE_BACKGROUND_PROMPT: &str = "Remove the background from this product photo. \
Keep the product exactly as it is, with its shape, colors, labels and lighting untouched, \
and place it on a clean transparent or plain white background. Return only the edited image.";

const SUGGEST_CONCEPT_PROMPT: &str = "You are a creative director for product advertising. \
Study these product photos and propose one vivid poster concept in two or three sentences: \
describe the scene, mood, lighting and visual style that would sell this product. \
Reply with the concept text only, without a title or preamble.";

/// Gemini API client
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    api_base: String,
    image_model: String,
    text_model: String,
}

/// generateContent request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

/// Either a text part or an inline image part
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "inline_data")]
    inline_data: Option<Blob>,
}

impl Part {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    fn image(image: InlineImage) -> Self {
        Self {
            text: None,
            inline_data: Some(Blob {
                mime_type: image.mime_type,
                data: image.data,
            }),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Blob {
    #[serde(alias = "mime_type")]
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_config: Option<ImageConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageConfig {
    aspect_ratio: String,
}

/// generateContent response body
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

/// Google error envelope: {"error": {"code": 400, "message": "..."}}
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

impl GeminiClient {
    /// Create a new Gemini client
    ///
    /// A missing API key is not an error here; calls report it instead.
    pub fn new(config: &AppConfig) -> GatewayResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            api_base: config.api_base.clone(),
            image_model: config.image_model.clone(),
            text_model: config.text_model.clone(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/{}:generateContent", self.api_base, model)
    }

    /// POST a generateContent request and parse the body
    async fn generate(&self, model: &str, request: &GenerateRequest) -> GatewayResult<GenerateResponse> {
        let api_key = self.api_key.as_deref().ok_or(GatewayError::MissingApiKey)?;
        let url = self.endpoint(model);

        debug!(%url, "Sending generateContent request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        debug!(status = status.as_u16(), bytes = body.len(), "generateContent response");

        if !status.is_success() {
            error!(status = status.as_u16(), "Gemini API error");
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            error!("Failed to parse Gemini response: {}", e);
            GatewayError::InvalidResponse(format!("malformed JSON: {}", e))
        })
    }

    /// Single-image edit on the image model
    async fn edit_image(&self, source: InlineImage, instruction: String, aspect_ratio: Option<AspectRatio>) -> GatewayResult<InlineImage> {
        let request = GenerateRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part::image(source), Part::text(instruction)],
            }],
            generation_config: Some(GenerationConfig {
                response_modalities: Some(vec!["IMAGE".to_string(), "TEXT".to_string()]),
                image_config: aspect_ratio.map(|ratio| ImageConfig {
                    aspect_ratio: ratio.as_str().to_string(),
                }),
            }),
        };

        let response = self.generate(&self.image_model, &request).await?;
        extract_image(response)
    }
}

#[async_trait]
impl PosterService for GeminiClient {
    async fn remove_background(&self, image: InlineImage) -> GatewayResult<InlineImage> {
        info!(mime = %image.mime_type, "Requesting background removal");
        self.edit_image(image, REMOVE_BACKGROUND_PROMPT.to_string(), None).await
    }

    async fn suggest_concept(&self, images: Vec<InlineImage>) -> GatewayResult<String> {
        info!(count = images.len(), "Requesting concept suggestion");

        let mut parts: Vec<Part> = images.into_iter().map(Part::image).collect();
        parts.push(Part::text(SUGGEST_CONCEPT_PROMPT));

        let request = GenerateRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
            generation_config: None,
        };

        let response = self.generate(&self.text_model, &request).await?;
        extract_text(response)
    }

    async fn create_poster(&self, source: InlineImage, concept: &str, aspect_ratio: AspectRatio) -> GatewayResult<InlineImage> {
        info!(%aspect_ratio, "Requesting poster");
        self.edit_image(source, poster_prompt(concept, aspect_ratio), Some(aspect_ratio)).await
    }

    async fn refine_poster(&self, source: InlineImage, refinement: &str, aspect_ratio: AspectRatio) -> GatewayResult<InlineImage> {
        info!(%aspect_ratio, "Requesting refinement");
        self.edit_image(source, refinement_prompt(refinement, aspect_ratio), Some(aspect_ratio)).await
    }
}

// Manual Debug so the API key never lands in logs
impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_base", &self.api_base)
            .field("image_model", &self.image_model)
            .field("text_model", &self.text_model)
            .finish()
    }
}

fn poster_prompt(concept: &str, aspect_ratio: AspectRatio) -> String {
    format!(
        "Create a professional advertising poster featuring the product in this image. \
Concept: {}. Compose the poster for a {} aspect ratio. \
Keep the product faithful to the original: same shape, colors and label.",
        concept.trim(),
        aspect_ratio
    )
}

fn refinement_prompt(refinement: &str, aspect_ratio: AspectRatio) -> String {
    format!(
        "Edit this poster: {}. Keep everything else about the composition and the product unchanged, \
and keep the {} aspect ratio.",
        refinement.trim(),
        aspect_ratio
    )
}

/// Pull the first inline image out of a response
fn extract_image(response: GenerateResponse) -> GatewayResult<InlineImage> {
    check_blocked(&response)?;

    let mut texts = Vec::new();
    for candidate in response.candidates {
        let Some(content) = candidate.content else {
            continue;
        };
        for part in content.parts {
            if let Some(blob) = part.inline_data {
                if !blob.data.is_empty() {
                    return Ok(InlineImage::new(blob.mime_type, blob.data));
                }
            }
            if let Some(text) = part.text {
                texts.push(text);
            }
        }
    }

    let said = texts.join(" ");
    let said = said.trim();
    if said.is_empty() {
        Err(GatewayError::InvalidResponse("no image in response".to_string()))
    } else {
        Err(GatewayError::InvalidResponse(format!("model replied without an image: {}", said)))
    }
}

/// Concatenate the text parts of the first candidate
fn extract_text(response: GenerateResponse) -> GatewayResult<String> {
    check_blocked(&response)?;

    let text = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    let text = text.trim();
    if text.is_empty() {
        return Err(GatewayError::InvalidResponse("no text in response".to_string()));
    }
    Ok(text.to_string())
}

fn check_blocked(response: &GenerateResponse) -> GatewayResult<()> {
    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_ref())
    {
        return Err(GatewayError::Blocked(reason.clone()));
    }

    // A lone candidate stopped by the safety filter carries no content
    if let [candidate] = response.candidates.as_slice() {
        let empty = candidate.content.as_ref().map_or(true, |c| c.parts.is_empty());
        if let (true, Some(reason)) = (empty, candidate.finish_reason.as_deref()) {
            if reason != "STOP" {
                return Err(GatewayError::Blocked(reason.to_string()));
            }
        }
    }
    Ok(())
}

/// Best human-readable message from an error body
fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) if !envelope.error.message.is_empty() => envelope.error.message,
        _ => {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "empty response body".to_string()
            } else {
                trimmed.chars().take(300).collect()
            }
        }
    }
}
