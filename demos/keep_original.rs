//! Session-driven example - keeps the character's original expression.
//!
//! Run with: `cargo run --example keep_original -- <character.png>`
//!
//! Requires `GEMINI_API_KEY` environment variable.

use stickergen::{
    ExpressionMode, GeminiSticker, GenerationStatus, ImagePayload, StickerSession,
};

#[tokio::main]
async fn main() -> stickergen::Result<()> {
    let input_path = std::env::args()
        .nth(1)
        .expect("Usage: keep_original <character.png>");

    let provider = GeminiSticker::builder().build()?;

    let mut session = StickerSession::new();
    session.set_image(ImagePayload::from_file(&input_path)?);
    session.set_mode(ExpressionMode::KeepOriginal);

    match session.generate_with(&provider, 2).await {
        GenerationStatus::Success(sticker) => {
            let path = sticker.save_timestamped(".")?;
            println!("Sticker saved to {}", path.display());
        }
        GenerationStatus::Error(message) => eprintln!("{message}"),
        _ => unreachable!("session resolves to success or error"),
    }

    Ok(())
}
