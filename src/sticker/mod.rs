//! Sticker generation module: payloads, prompts, and providers.

mod prompt;
mod provider;
pub mod providers;
mod types;

pub use prompt::{StickerPrompt, KEEP_ORIGINAL_EXPRESSION, SUGGESTED_PROMPTS};
pub use provider::{StickerProvider, StickerProviderExt};
pub use types::{
    GeneratedSticker, ImageFormat, ImagePayload, StickerMetadata, StickerRequest,
};
