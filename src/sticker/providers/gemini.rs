//! Gemini (Google) sticker generation provider.

use crate::error::{parse_retry_after, sanitize_error_message, Result, StickerError};
use crate::sticker::prompt::StickerPrompt;
use crate::sticker::provider::StickerProvider;
use crate::sticker::types::{GeneratedSticker, ImageFormat, StickerMetadata, StickerRequest};
use async_trait::async_trait;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Default per-request deadline. The upstream web client had none; one call
/// can otherwise hang a session indefinitely.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Gemini image model variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GeminiModel {
    /// Gemini 2.5 Flash Image (fast, economical).
    #[default]
    Flash,
    /// Gemini 3 Pro Image (highest quality).
    Pro,
}

impl GeminiModel {
    /// Returns the API model identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flash => "gemini-2.5-flash-image",
            Self::Pro => "gemini-3-pro-image-preview",
        }
    }
}

/// Builder for [`GeminiSticker`].
#[derive(Debug, Clone, Default)]
pub struct GeminiStickerBuilder {
    api_key: Option<String>,
    model: GeminiModel,
    timeout: Option<Duration>,
}

impl GeminiStickerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to `GEMINI_API_KEY` env var.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the Gemini model variant.
    pub fn model(mut self, model: GeminiModel) -> Self {
        self.model = model;
        self
    }

    /// Sets the per-request deadline. Defaults to [`DEFAULT_TIMEOUT`].
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the provider, resolving the API key.
    pub fn build(self) -> Result<GeminiSticker> {
        let api_key = self
            .api_key
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .ok_or_else(|| {
                StickerError::Auth("GEMINI_API_KEY not set and no API key provided".into())
            })?;

        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(GeminiSticker {
            client,
            api_key,
            model: self.model,
            timeout,
        })
    }
}

/// Gemini sticker generation provider.
pub struct GeminiSticker {
    client: reqwest::Client,
    api_key: String,
    model: GeminiModel,
    timeout: Duration,
}

impl GeminiSticker {
    /// Creates a new `GeminiStickerBuilder`.
    pub fn builder() -> GeminiStickerBuilder {
        GeminiStickerBuilder::new()
    }

    async fn generate_impl(&self, request: &StickerRequest) -> Result<GeneratedSticker> {
        let start = Instant::now();

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model.as_str(),
        );

        let body = GeminiRequest::from_sticker_request(request);

        tracing::debug!(
            model = self.model.as_str(),
            image_bytes = request.image.len(),
            subject = request.subject.is_some(),
            "sending sticker generation request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    StickerError::Timeout(self.timeout)
                } else {
                    StickerError::Network(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(self.parse_error(status.as_u16(), &text, &headers));
        }

        let gemini_response: GeminiResponse = response.json().await?;
        let inline_data = extract_inline_image(gemini_response)?;

        let data = base64::engine::general_purpose::STANDARD
            .decode(&inline_data.data)
            .map_err(|e| StickerError::Decode(e.to_string()))?;

        let format = ImageFormat::from_mime_type(&inline_data.mime_type).unwrap_or_default();
        let duration_ms = start.elapsed().as_millis() as u64;

        Ok(GeneratedSticker::new(
            data,
            format,
            StickerMetadata {
                model: Some(self.model.as_str().to_string()),
                duration_ms: Some(duration_ms),
            },
        ))
    }

    fn parse_error(
        &self,
        status: u16,
        text: &str,
        headers: &reqwest::header::HeaderMap,
    ) -> StickerError {
        let text = sanitize_error_message(text);
        if status == 429 {
            let retry_after = parse_retry_after(headers).map(Duration::from_secs);
            return StickerError::RateLimited { retry_after };
        }
        if status == 401 || status == 403 {
            return StickerError::Auth(text);
        }
        if status == 404 {
            return StickerError::InvalidRequest(
                "Model not found. Verify the model name is correct.".into(),
            );
        }
        let lower = text.to_lowercase();
        if lower.contains("safety")
            || lower.contains("blocked")
            || lower.contains("content_policy")
            || lower.contains("prohibited")
        {
            return StickerError::ContentBlocked(text);
        }
        StickerError::Api {
            status,
            message: text,
        }
    }
}

#[async_trait]
impl StickerProvider for GeminiSticker {
    async fn generate(&self, request: &StickerRequest) -> Result<GeneratedSticker> {
        self.generate_impl(request).await
    }

    fn name(&self) -> &str {
        "Gemini (Google)"
    }

    async fn health_check(&self) -> Result<()> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}",
            self.model.as_str(),
        );

        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;

        match response.status().as_u16() {
            401 | 403 => Err(StickerError::Auth("Invalid API key".into())),
            404 => Err(StickerError::InvalidRequest(
                "Model not found. Verify the model name is correct.".into(),
            )),
            s if !(200..300).contains(&s) => Err(StickerError::Api {
                status: s,
                message: "Health check failed".into(),
            }),
            _ => Ok(()),
        }
    }
}

/// Pulls the sticker bytes out of a Gemini response.
///
/// Scans the first candidate's parts in their original order and takes the
/// first one carrying inline image data; every other part (text commentary,
/// empty parts) is ignored. A response with zero image parts is a failure,
/// never an empty success.
fn extract_inline_image(response: GeminiResponse) -> Result<InlineData> {
    // Prompt-level blocks come back as HTTP 200 with feedback attached.
    if let Some(feedback) = response.prompt_feedback {
        if let Some(reason) = feedback.block_reason {
            let msg = feedback
                .block_reason_message
                .unwrap_or_else(|| format!("Prompt blocked: {}", reason));
            return Err(StickerError::ContentBlocked(msg));
        }
    }

    let candidate = response.candidates.into_iter().next().ok_or_else(|| {
        StickerError::UnexpectedResponse("No candidates in Gemini response".into())
    })?;

    if let Some(ref finish_reason) = candidate.finish_reason {
        match finish_reason.as_str() {
            "SAFETY"
            | "IMAGE_SAFETY"
            | "IMAGE_PROHIBITED_CONTENT"
            | "IMAGE_RECITATION"
            | "RECITATION"
            | "PROHIBITED_CONTENT"
            | "BLOCKLIST" => {
                return Err(StickerError::ContentBlocked(format!(
                    "Content blocked by Gemini safety filter: {}",
                    finish_reason
                )));
            }
            "IMAGE_OTHER" | "NO_IMAGE" => {
                return Err(StickerError::NoImage);
            }
            _ => {} // STOP, MAX_TOKENS, etc. are normal
        }
    }

    let content = candidate.content.ok_or_else(|| {
        StickerError::UnexpectedResponse("No content in Gemini candidate".into())
    })?;

    // Parts with an empty data field count as no image, like text parts.
    content
        .parts
        .into_iter()
        .find_map(|p| p.inline_data.filter(|d| !d.data.is_empty()))
        .ok_or(StickerError::NoImage)
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
    fn from_sticker_request(req: &StickerRequest) -> Self {
        let instruction = StickerPrompt::new(&req.emotion)
            .with_subject(req.subject.as_deref())
            .compose();

        // Character image first, instruction second; the MIME type reflects
        // the payload's actual bytes rather than assuming PNG.
        let parts = vec![
            GeminiRequestPart::InlineData {
                inline_data: GeminiInlineData {
                    mime_type: req.image.mime_type().to_string(),
                    data: req.image.to_base64(),
                },
            },
            GeminiRequestPart::Text { text: instruction },
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
    mime_type: String,
    data: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sticker::types::ImagePayload;

    const PNG_MAGIC: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    const JPEG_MAGIC: [u8; 12] = [0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0, 0, 0, 0, 0];

    fn sample_request() -> StickerRequest {
        let image = ImagePayload::from_bytes(PNG_MAGIC.to_vec()).unwrap();
        StickerRequest::new(image, "Crying with waterfall tears")
    }

    #[test]
    fn test_gemini_model_as_str() {
        assert_eq!(GeminiModel::Flash.as_str(), "gemini-2.5-flash-image");
        assert_eq!(GeminiModel::Pro.as_str(), "gemini-3-pro-image-preview");
        assert_eq!(GeminiModel::default(), GeminiModel::Flash);
    }

    #[test]
    fn test_builder_with_explicit_key() {
        let provider = GeminiStickerBuilder::new()
            .api_key("test-key")
            .model(GeminiModel::Flash)
            .timeout(Duration::from_secs(5))
            .build();
        assert!(provider.is_ok());
    }

    #[test]
    fn test_request_construction_image_first_then_instruction() {
        let gemini_req = GeminiRequest::from_sticker_request(&sample_request());

        assert_eq!(gemini_req.contents.len(), 1);
        let parts = &gemini_req.contents[0].parts;
        assert_eq!(parts.len(), 2);
        assert!(matches!(parts[0], GeminiRequestPart::InlineData { .. }));
        match &parts[1] {
            GeminiRequestPart::Text { text } => {
                assert!(text.contains("Crying with waterfall tears"));
                assert!(text.contains("central or most prominent character"));
            }
            other => panic!("expected text part, got {other:?}"),
        }
        assert_eq!(
            gemini_req.generation_config.response_modalities,
            vec!["IMAGE"]
        );
    }

    #[test]
    fn test_request_construction_with_subject() {
        let request = sample_request().with_subject("boy in blue shirt");
        let gemini_req = GeminiRequest::from_sticker_request(&request);

        match &gemini_req.contents[0].parts[1] {
            GeminiRequestPart::Text { text } => {
                assert!(text.contains("\"boy in blue shirt\""));
                assert!(text.contains("focus ONLY on this character"));
            }
            other => panic!("expected text part, got {other:?}"),
        }
    }

    #[test]
    fn test_request_mime_type_matches_payload_bytes() {
        let image = ImagePayload::from_bytes(JPEG_MAGIC.to_vec()).unwrap();
        let request = StickerRequest::new(image, "Happy");
        let gemini_req = GeminiRequest::from_sticker_request(&request);

        match &gemini_req.contents[0].parts[0] {
            GeminiRequestPart::InlineData { inline_data } => {
                assert_eq!(inline_data.mime_type, "image/jpeg");
                assert!(!inline_data.data.contains("data:"));
            }
            other => panic!("expected inline data part, got {other:?}"),
        }
    }

    #[test]
    fn test_request_serialization_uses_camel_case() {
        let gemini_req = GeminiRequest::from_sticker_request(&sample_request());
        let json = serde_json::to_value(&gemini_req).unwrap();

        assert!(json.get("generationConfig").is_some());
        assert!(json.get("generation_config").is_none());
        assert!(json["contents"][0]["parts"][0].get("inlineData").is_some());
        assert!(json["contents"][0]["parts"][0].get("inline_data").is_none());
        assert!(json["contents"][0]["parts"][0]["inlineData"]
            .get("mimeType")
            .is_some());
    }

    #[test]
    fn test_extract_first_inline_image_in_order() {
        let json = r#"{
            "candidates": [{
                "content": {
                    "parts": [
                        {"text": "Here is your sticker!"},
                        {"inlineData": {"mimeType": "image/png", "data": "Zmlyc3Q="}},
                        {"inlineData": {"mimeType": "image/png", "data": "c2Vjb25k"}}
                    ]
                },
                "finishReason": "STOP"
            }]
        }"#;
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        let inline = extract_inline_image(resp).unwrap();
        assert_eq!(inline.data, "Zmlyc3Q=");
        assert_eq!(inline.mime_type, "image/png");
    }

    #[test]
    fn test_extract_skips_inline_parts_with_empty_data() {
        let json = r#"{
            "candidates": [{
                "content": {
                    "parts": [
                        {"inlineData": {"mimeType": "image/png", "data": ""}},
                        {"inlineData": {"mimeType": "image/png", "data": "cmVhbA=="}}
                    ]
                }
            }]
        }"#;
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        let inline = extract_inline_image(resp).unwrap();
        assert_eq!(inline.data, "cmVhbA==");
    }

    #[test]
    fn test_extract_fails_when_all_inline_parts_are_empty() {
        let json = r#"{
            "candidates": [{
                "content": {
                    "parts": [{"inlineData": {"mimeType": "image/png", "data": ""}}]
                }
            }]
        }"#;
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        let err = extract_inline_image(resp).unwrap_err();
        assert!(matches!(err, StickerError::NoImage));
    }

    #[test]
    fn test_extract_fails_with_no_image_parts() {
        let json = r#"{
            "candidates": [{
                "content": {
                    "parts": [{"text": "sorry, words only"}, {}]
                }
            }]
        }"#;
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        let err = extract_inline_image(resp).unwrap_err();
        assert!(matches!(err, StickerError::NoImage));
    }

    #[test]
    fn test_extract_fails_with_no_candidates() {
        let resp: GeminiResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        let err = extract_inline_image(resp).unwrap_err();
        assert!(matches!(err, StickerError::UnexpectedResponse(_)));
    }

    #[test]
    fn test_extract_prompt_feedback_block() {
        let json = r#"{
            "candidates": [],
            "promptFeedback": {
                "blockReason": "SAFETY",
                "blockReasonMessage": "Prompt was blocked due to safety"
            }
        }"#;
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        match extract_inline_image(resp).unwrap_err() {
            StickerError::ContentBlocked(msg) => {
                assert_eq!(msg, "Prompt was blocked due to safety");
            }
            other => panic!("expected ContentBlocked, got {other:?}"),
        }
    }

    #[test]
    fn test_extract_safety_finish_reason() {
        let json = r#"{
            "candidates": [{
                "finishReason": "IMAGE_SAFETY"
            }]
        }"#;
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        let err = extract_inline_image(resp).unwrap_err();
        assert!(matches!(err, StickerError::ContentBlocked(_)));
    }

    #[test]
    fn test_extract_no_image_finish_reason() {
        let json = r#"{
            "candidates": [{
                "finishReason": "NO_IMAGE"
            }]
        }"#;
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        let err = extract_inline_image(resp).unwrap_err();
        assert!(matches!(err, StickerError::NoImage));
    }

    #[test]
    fn test_parse_error_taxonomy() {
        let provider = GeminiStickerBuilder::new().api_key("k").build().unwrap();

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(reqwest::header::RETRY_AFTER, "30".parse().unwrap());
        match provider.parse_error(429, "slow down", &headers) {
            StickerError::RateLimited { retry_after } => {
                assert_eq!(retry_after, Some(Duration::from_secs(30)));
            }
            other => panic!("expected RateLimited, got {other:?}"),
        }

        let empty = reqwest::header::HeaderMap::new();
        assert!(matches!(
            provider.parse_error(403, "bad key", &empty),
            StickerError::Auth(_)
        ));
        assert!(matches!(
            provider.parse_error(404, "nope", &empty),
            StickerError::InvalidRequest(_)
        ));
        assert!(matches!(
            provider.parse_error(400, "request violates safety policy", &empty),
            StickerError::ContentBlocked(_)
        ));
        assert!(matches!(
            provider.parse_error(500, "boom", &empty),
            StickerError::Api { status: 500, .. }
        ));
    }
}
