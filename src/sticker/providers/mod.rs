//! Sticker provider implementations.

mod gemini;

pub use gemini::{GeminiModel, GeminiSticker, GeminiStickerBuilder, DEFAULT_TIMEOUT};
