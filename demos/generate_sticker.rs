//! Sticker generation example - direct provider use.
//!
//! Run with: `cargo run --example generate_sticker -- <character.png>`
//!
//! Requires `GEMINI_API_KEY` environment variable.

use stickergen::{GeminiSticker, ImagePayload, StickerProvider, StickerRequest};

#[tokio::main]
async fn main() -> stickergen::Result<()> {
    let input_path = std::env::args()
        .nth(1)
        .expect("Usage: generate_sticker <character.png>");

    let provider = GeminiSticker::builder().build()?;

    let image = ImagePayload::from_file(&input_path)?;
    let request = StickerRequest::new(image, "Eating a giant burger happily")
        .with_subject("the boy in the blue shirt on the left");

    let sticker = provider.generate(&request).await?;
    let path = sticker.save_timestamped(".")?;
    println!("Sticker saved to {} ({} bytes)", path.display(), sticker.size());

    Ok(())
}
