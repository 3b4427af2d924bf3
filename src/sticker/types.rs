//! Core types for sticker generation.

use crate::error::{Result, StickerError};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    #[default]
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format (modern, efficient).
    WebP,
}

impl ImageFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    /// Attempts to parse a MIME type (e.g. from a data URL descriptor).
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 12 {
            return None;
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }
}

/// A user-supplied character image, validated and held as raw bytes.
///
/// The payload always stores decoded bytes, so wire encoding never carries a
/// media-type prefix: [`ImagePayload::to_base64`] yields bare base64 and
/// [`ImagePayload::to_data_url`] adds the descriptor back for display.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    data: Vec<u8>,
    format: ImageFormat,
}

impl ImagePayload {
    /// Creates a payload from raw bytes, rejecting anything that is not a
    /// recognizable image.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let format = ImageFormat::from_magic_bytes(&data)
            .ok_or_else(|| StickerError::InvalidRequest("not a supported image".into()))?;
        Ok(Self { data, format })
    }

    /// Reads and validates an image file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_bytes(std::fs::read(path)?)
    }

    /// Decodes a bare base64 string into a payload.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let data = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| StickerError::Decode(e.to_string()))?;
        Self::from_bytes(data)
    }

    /// Parses a `data:image/<fmt>;base64,<data>` URI, stripping the
    /// media-type descriptor before decoding.
    ///
    /// Non-image media types are rejected.
    pub fn from_data_url(url: &str) -> Result<Self> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| StickerError::Decode("missing data: scheme".into()))?;
        let (descriptor, encoded) = rest
            .split_once(";base64,")
            .ok_or_else(|| StickerError::Decode("missing base64 descriptor".into()))?;

        if !descriptor.starts_with("image/") {
            return Err(StickerError::InvalidRequest(format!(
                "not an image media type: {descriptor}"
            )));
        }

        Self::from_base64(encoded)
    }

    /// The detected format.
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// The MIME type matching the detected format.
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// Raw image bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Payload size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the payload holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bare base64 of the image bytes, with no media-type prefix.
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }

    /// The payload as a data URL for display surfaces.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type(), self.to_base64())
    }
}

/// A request to generate one sticker.
#[derive(Debug, Clone)]
pub struct StickerRequest {
    /// The character image to restyle.
    pub image: ImagePayload,
    /// The requested emotion or action, already resolved from the input mode.
    pub emotion: String,
    /// Which character to focus on when the photo shows several.
    pub subject: Option<String>,
}

impl StickerRequest {
    /// Creates a request for the given image and emotion.
    pub fn new(image: ImagePayload, emotion: impl Into<String>) -> Self {
        Self {
            image,
            emotion: emotion.into(),
            subject: None,
        }
    }

    /// Restricts generation to the character matching this description.
    /// Blank descriptions are treated as absent.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        let subject = subject.into();
        let trimmed = subject.trim();
        self.subject = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        self
    }
}

/// Metadata about the generation round trip.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StickerMetadata {
    /// Model used for generation.
    pub model: Option<String>,
    /// Round-trip duration in milliseconds.
    pub duration_ms: Option<u64>,
}

/// A generated sticker with its data and metadata.
#[derive(Debug, Clone)]
#[must_use = "generated sticker should be saved or processed"]
pub struct GeneratedSticker {
    /// Raw image bytes.
    pub data: Vec<u8>,
    /// Image format.
    pub format: ImageFormat,
    /// Generation metadata.
    pub metadata: StickerMetadata,
}

impl GeneratedSticker {
    /// Creates a new generated sticker.
    pub fn new(data: Vec<u8>, format: ImageFormat, metadata: StickerMetadata) -> Self {
        Self {
            data,
            format,
            metadata,
        }
    }

    /// Returns the size of the sticker data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Saves the sticker to the specified path.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, &self.data)?;
        Ok(())
    }

    /// Saves the sticker into `dir` under a generation-time file name,
    /// returning the path written.
    pub fn save_timestamped(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let path = dir.as_ref().join(self.timestamped_name());
        self.save(&path)?;
        Ok(path)
    }

    /// A file name of the form `q-meme-<millis>.<ext>`.
    pub fn timestamped_name(&self) -> String {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        format!("q-meme-{millis}.{}", self.format.extension())
    }

    /// Encodes the sticker data as base64.
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }

    /// Returns the sticker as a data URL.
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.format.mime_type(),
            self.to_base64()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    const JPEG_MAGIC: [u8; 12] = [0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0, 0, 0, 0, 0];
    const WEBP_MAGIC: [u8; 12] = *b"RIFF\x00\x00\x00\x00WEBP";

    #[test]
    fn test_format_from_magic_bytes() {
        assert_eq!(
            ImageFormat::from_magic_bytes(&PNG_MAGIC),
            Some(ImageFormat::Png)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&JPEG_MAGIC),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&WEBP_MAGIC),
            Some(ImageFormat::WebP)
        );
        assert_eq!(ImageFormat::from_magic_bytes(b"not an image"), None);
    }

    #[test]
    fn test_format_from_mime_type() {
        assert_eq!(ImageFormat::from_mime_type("image/png"), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_mime_type("image/jpg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_mime_type("text/plain"), None);
    }

    #[test]
    fn test_payload_rejects_non_image_bytes() {
        let err = ImagePayload::from_bytes(b"hello world, not an image".to_vec()).unwrap_err();
        assert!(matches!(err, StickerError::InvalidRequest(_)));
    }

    #[test]
    fn test_payload_base64_round_trip() {
        let payload = ImagePayload::from_bytes(PNG_MAGIC.to_vec()).unwrap();
        let encoded = payload.to_base64();
        assert!(!encoded.contains("data:"));

        let decoded = base64::engine::general_purpose::STANDARD
            .decode(&encoded)
            .unwrap();
        assert_eq!(decoded, PNG_MAGIC.to_vec());
    }

    #[test]
    fn test_payload_data_url_round_trip() {
        let payload = ImagePayload::from_bytes(JPEG_MAGIC.to_vec()).unwrap();
        let url = payload.to_data_url();
        assert!(url.starts_with("data:image/jpeg;base64,"));

        let reparsed = ImagePayload::from_data_url(&url).unwrap();
        assert_eq!(reparsed.bytes(), payload.bytes());
        assert_eq!(reparsed.format(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_payload_from_data_url_strips_descriptor() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(PNG_MAGIC);
        let payload = ImagePayload::from_data_url(&format!("data:image/png;base64,{encoded}"))
            .unwrap();
        assert_eq!(payload.to_base64(), encoded);
    }

    #[test]
    fn test_payload_rejects_non_image_data_url() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(b"plain text");
        let err = ImagePayload::from_data_url(&format!("data:text/plain;base64,{encoded}"))
            .unwrap_err();
        assert!(matches!(err, StickerError::InvalidRequest(_)));
    }

    #[test]
    fn test_payload_rejects_malformed_data_url() {
        assert!(ImagePayload::from_data_url("image/png;base64,abcd").is_err());
        assert!(ImagePayload::from_data_url("data:image/png,abcd").is_err());
        assert!(ImagePayload::from_data_url("data:image/png;base64,!!!").is_err());
    }

    #[test]
    fn test_request_subject_blank_is_absent() {
        let image = ImagePayload::from_bytes(PNG_MAGIC.to_vec()).unwrap();
        let request = StickerRequest::new(image, "Happy").with_subject("   ");
        assert_eq!(request.subject, None);

        let request = request.with_subject("  boy in blue shirt ");
        assert_eq!(request.subject.as_deref(), Some("boy in blue shirt"));
    }

    #[test]
    fn test_sticker_timestamped_name() {
        let sticker = GeneratedSticker::new(
            PNG_MAGIC.to_vec(),
            ImageFormat::Png,
            StickerMetadata::default(),
        );
        let name = sticker.timestamped_name();
        assert!(name.starts_with("q-meme-"));
        assert!(name.ends_with(".png"));
    }

    #[test]
    fn test_sticker_data_url() {
        let sticker = GeneratedSticker::new(
            vec![1, 2, 3],
            ImageFormat::Png,
            StickerMetadata::default(),
        );
        assert_eq!(sticker.to_data_url(), "data:image/png;base64,AQID");
        assert_eq!(sticker.size(), 3);
    }
}
