//! Sticker provider trait and retry utilities.

use crate::error::Result;
use crate::sticker::types::{GeneratedSticker, StickerRequest};
use async_trait::async_trait;

/// Trait for services that turn a character image into a sticker.
#[async_trait]
pub trait StickerProvider: Send + Sync {
    /// Generates a sticker from the given request.
    async fn generate(&self, request: &StickerRequest) -> Result<GeneratedSticker>;

    /// Returns the name of this provider for display.
    fn name(&self) -> &str;

    /// Checks if the provider is reachable and authenticated.
    async fn health_check(&self) -> Result<()>;
}

/// Extension trait for providers with retry logic.
#[async_trait]
pub trait StickerProviderExt: StickerProvider {
    /// Generates with automatic retries on transient failures.
    async fn generate_with_retries(
        &self,
        request: &StickerRequest,
        max_retries: u32,
    ) -> Result<GeneratedSticker> {
        let mut last_error = None;

        for attempt in 0..=max_retries {
            match self.generate(request).await {
                Ok(sticker) => return Ok(sticker),
                Err(e) if e.is_retryable() && attempt < max_retries => {
                    let delay = e.retry_after().unwrap_or(std::time::Duration::from_secs(1));
                    tracing::warn!(
                        attempt = attempt + 1,
                        max_retries,
                        delay_ms = delay.as_millis(),
                        "retrying after transient error: {e}"
                    );
                    tokio::time::sleep(delay).await;
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.expect("should have error after retries"))
    }
}

impl<T: StickerProvider + ?Sized> StickerProviderExt for T {}
