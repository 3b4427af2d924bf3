#![warn(missing_docs)]
//! Stickergen - chibi sticker generation from character photos.
//!
//! Takes a user-supplied character image plus a desired emotion or action and
//! produces a "Q-version" (chibi) sticker via the Gemini image API: one
//! outbound call per attempt, with the round trip tracked by a small session
//! state machine.
//!
//! # Quick Start
//!
//! ```no_run
//! use stickergen::{GeminiSticker, ImagePayload, StickerProvider, StickerRequest};
//!
//! #[tokio::main]
//! async fn main() -> stickergen::Result<()> {
//!     let provider = GeminiSticker::builder().build()?;
//!     let image = ImagePayload::from_file("character.png")?;
//!     let request = StickerRequest::new(image, "Crying with waterfall tears");
//!     let sticker = provider.generate(&request).await?;
//!     sticker.save("sticker.png")?;
//!     Ok(())
//! }
//! ```
//!
//! # Session-driven flow
//!
//! ```no_run
//! use stickergen::{GeminiSticker, GenerationStatus, ImagePayload, StickerSession};
//!
//! #[tokio::main]
//! async fn main() -> stickergen::Result<()> {
//!     let provider = GeminiSticker::builder().build()?;
//!     let mut session = StickerSession::new();
//!     session.set_image(ImagePayload::from_file("character.png")?);
//!     session.set_prompt("Thumbs up with sparkling eyes");
//!
//!     if let GenerationStatus::Success(sticker) = session.generate_with(&provider, 2).await {
//!         sticker.save_timestamped(".")?;
//!     }
//!     Ok(())
//! }
//! ```

mod error;
mod session;
pub mod sticker;

pub use error::{Result, StickerError};
pub use session::{
    ExpressionMode, GenerationStatus, PendingGeneration, StickerSession, GENERIC_FAILURE_MESSAGE,
};
pub use sticker::providers::{GeminiModel, GeminiSticker, GeminiStickerBuilder, DEFAULT_TIMEOUT};
pub use sticker::{
    GeneratedSticker, ImageFormat, ImagePayload, StickerMetadata, StickerPrompt, StickerProvider,
    StickerProviderExt, StickerRequest, KEEP_ORIGINAL_EXPRESSION, SUGGESTED_PROMPTS,
};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{Result, StickerError};
    pub use crate::session::{ExpressionMode, GenerationStatus, StickerSession};
    pub use crate::sticker::providers::GeminiSticker;
    pub use crate::sticker::{
        GeneratedSticker, ImagePayload, StickerProvider, StickerProviderExt, StickerRequest,
    };
}
