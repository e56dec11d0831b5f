//! Gemini (Google) image generation provider.

use crate::config::Credential;
use crate::error::{sanitize_error_message, Error, Result};
use crate::image::provider::ImageProvider;
use crate::image::types::{GeneratedImage, GenerationMetadata, GenerationRequest};
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini image model variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GeminiModel {
    /// Gemini 2.5 Flash Image (fast, economical).
    #[default]
    FlashImage,
    /// The preview release of Gemini 2.5 Flash Image.
    FlashImagePreview,
    /// Gemini 3 Pro Image (highest quality).
    ProImage,
}

impl GeminiModel {
    /// Returns the API model identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FlashImage => "gemini-2.5-flash-image",
            Self::FlashImagePreview => "gemini-2.5-flash-image-preview",
            Self::ProImage => "gemini-3-pro-image-preview",
        }
    }
}

/// Builder for GeminiProvider.
#[derive(Debug, Clone, Default)]
pub struct GeminiProviderBuilder {
    credential: Option<Credential>,
    model: GeminiModel,
    base_url: Option<String>,
}

impl GeminiProviderBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key used to authorize requests.
    pub fn credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Sets the Gemini model variant.
    pub fn model(mut self, model: GeminiModel) -> Self {
        self.model = model;
        self
    }

    /// Points the provider at a different API root.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Builds the provider. Fails if no credential was given.
    pub fn build(self) -> Result<GeminiProvider> {
        let credential = self
            .credential
            .ok_or_else(|| Error::Config("no API key provided to Gemini provider".into()))?;

        Ok(GeminiProvider {
            client: reqwest::Client::new(),
            credential,
            model: self.model,
            base_url: self
                .base_url
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        })
    }
}

/// Gemini image generation provider.
pub struct GeminiProvider {
    client: reqwest::Client,
    credential: Credential,
    model: GeminiModel,
    base_url: String,
}

impl GeminiProvider {
    /// Creates a new `GeminiProviderBuilder`.
    pub fn builder() -> GeminiProviderBuilder {
        GeminiProviderBuilder::new()
    }

    /// Returns the configured model.
    pub fn model(&self) -> GeminiModel {
        self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url,
            self.model.as_str(),
        )
    }

    async fn generate_impl(&self, request: &GenerationRequest) -> Result<GeneratedImage> {
        let start = Instant::now();
        let url = self.endpoint();
        let body = GeminiRequest::from_generation_request(request);

        tracing::debug!(
            url = %url,
            prompt_len = request.prompt.len(),
            image_bytes = request.image.data.len(),
            mime_type = request.image.format.mime_type(),
            "sending Gemini generateContent request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.credential.expose())
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), &text));
        }

        let gemini_response: GeminiResponse = response.json().await?;
        let inline_data = extract_inline_data(gemini_response)?;

        let data = base64::engine::general_purpose::STANDARD
            .decode(inline_data.data.trim())
            .map_err(|e| Error::Decode(e.to_string()))?;
        if data.is_empty() {
            return Err(Error::UnexpectedResponse(
                "Gemini returned an empty image payload".into(),
            ));
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        tracing::debug!(
            bytes = data.len(),
            mime_type = %inline_data.mime_type,
            duration_ms,
            "Gemini generation complete"
        );

        Ok(GeneratedImage::new(
            data,
            GenerationMetadata {
                model: Some(self.model.as_str().to_string()),
                mime_type: Some(inline_data.mime_type).filter(|m| !m.is_empty()),
                duration_ms: Some(duration_ms),
            },
        ))
    }
}

#[async_trait]
impl ImageProvider for GeminiProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedImage> {
        self.generate_impl(request).await
    }

    fn name(&self) -> &str {
        "Gemini (Google)"
    }
}

fn parse_error(status: u16, text: &str) -> Error {
    let text = sanitize_error_message(text);
    if status == 401 || status == 403 {
        return Error::Auth(text);
    }
    if status == 404 {
        return Error::Api {
            status,
            message: format!("model not found: {text}"),
        };
    }
    let lower = text.to_lowercase();
    if lower.contains("safety") || lower.contains("blocked") || lower.contains("prohibited") {
        return Error::ContentBlocked(text);
    }
    Error::Api {
        status,
        message: text,
    }
}

/// Pulls the inline image out of the first part of the first candidate.
fn extract_inline_data(response: GeminiResponse) -> Result<InlineData> {
    // Prompt blocks come back as HTTP 200
    if let Some(ref feedback) = response.prompt_feedback {
        if let Some(ref reason) = feedback.block_reason {
            let msg = feedback
                .block_reason_message
                .clone()
                .unwrap_or_else(|| format!("Prompt blocked: {}", reason));
            return Err(Error::ContentBlocked(msg));
        }
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| Error::UnexpectedResponse("No candidates in Gemini response".into()))?;

    if let Some(ref finish_reason) = candidate.finish_reason {
        match finish_reason.as_str() {
            "SAFETY"
            | "IMAGE_SAFETY"
            | "IMAGE_PROHIBITED_CONTENT"
            | "IMAGE_RECITATION"
            | "RECITATION"
            | "PROHIBITED_CONTENT"
            | "BLOCKLIST" => {
                return Err(Error::ContentBlocked(format!(
                    "Content blocked by Gemini safety filter: {}",
                    finish_reason
                )));
            }
            _ => {}
        }
    }

    let content = candidate
        .content
        .ok_or_else(|| Error::UnexpectedResponse("No content in Gemini candidate".into()))?;

    content
        .parts
        .into_iter()
        .next()
        .and_then(|part| part.inline_data)
        .filter(|inline| !inline.data.trim().is_empty())
        .ok_or_else(|| {
            Error::UnexpectedResponse(
                "Could not find generated image data in the API response".into(),
            )
        })
}

// Request/Response types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiRequestPart>,
}

/// A part in a Gemini request - can be text or inline image data.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiRequestPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiInlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiConfig {
    response_modalities: Vec<String>,
}

impl GeminiRequest {
    fn from_generation_request(req: &GenerationRequest) -> Self {
        let parts = vec![
            GeminiRequestPart::Text {
                text: req.prompt.clone(),
            },
            GeminiRequestPart::InlineData {
                inline_data: GeminiInlineData {
                    mime_type: req.image.format.mime_type().to_string(),
                    data: req.image.to_base64(),
                },
            },
        ];

        Self {
            contents: vec![GeminiContent { parts }],
            generation_config: GeminiConfig {
                response_modalities: vec!["IMAGE".to_string()],
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContentResponse>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
    #[serde(default)]
    block_reason_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPartResponse {
    #[serde(default)]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: String,
    data: String,
}
