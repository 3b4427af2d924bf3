//! Generation session state machine.
//!
//! A [`StickerSession`] owns the transient state of one sticker workflow: the
//! captured image, the emotion inputs, and the current [`GenerationStatus`].
//! Status is a single tagged variant, so "loading and errored at once" or a
//! success without a sticker cannot be represented.

use crate::error::{Result, StickerError};
use crate::sticker::{
    GeneratedSticker, ImagePayload, StickerProvider, StickerProviderExt, StickerRequest,
    KEEP_ORIGINAL_EXPRESSION,
};

/// The single user-visible failure message. Provider errors keep their typed
/// detail in the trace log; the session surface stays generic.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "Something went wrong while generating the sticker. Please try again.";

/// Where the requested emotion comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpressionMode {
    /// The user types the emotion/action prompt.
    #[default]
    Custom,
    /// Keep the expression and pose from the original image.
    KeepOriginal,
}

/// Current state of the generation round trip. Exactly one variant is active
/// at any observation point.
#[derive(Debug, Clone, Default)]
pub enum GenerationStatus {
    /// Nothing in flight, no result yet.
    #[default]
    Idle,
    /// One request in flight.
    Loading,
    /// The last request produced a sticker.
    Success(GeneratedSticker),
    /// The last request failed.
    Error(String),
}

impl GenerationStatus {
    /// Returns true while a request is in flight.
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

/// One-shot token tying a completion back to the request that started it.
///
/// Tokens issued before a [`StickerSession::reset`] no longer match the
/// session and their resolutions are discarded, so an abandoned in-flight
/// call cannot mutate a fresh session.
#[derive(Debug)]
pub struct PendingGeneration {
    epoch: u64,
}

/// Transient state for one sticker workflow.
#[derive(Debug, Default)]
pub struct StickerSession {
    status: GenerationStatus,
    image: Option<ImagePayload>,
    prompt: String,
    subject: String,
    mode: ExpressionMode,
    epoch: u64,
}

impl StickerSession {
    /// Creates an empty session in the idle state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current status.
    pub fn status(&self) -> &GenerationStatus {
        &self.status
    }

    /// The captured character image, if any.
    pub fn image(&self) -> Option<&ImagePayload> {
        self.image.as_ref()
    }

    /// Publishes a captured image to the session.
    pub fn set_image(&mut self, image: ImagePayload) {
        self.image = Some(image);
    }

    /// Discards the captured image.
    pub fn clear_image(&mut self) {
        self.image = None;
    }

    /// Sets the free-text emotion/action prompt.
    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    /// Sets the subject-disambiguation text for group photos.
    pub fn set_subject(&mut self, subject: impl Into<String>) {
        self.subject = subject.into();
    }

    /// Switches between custom-prompt and keep-original modes.
    pub fn set_mode(&mut self, mode: ExpressionMode) {
        self.mode = mode;
    }

    /// The prompt that would actually be sent, resolved from the mode.
    ///
    /// `None` means the inputs are incomplete (custom mode with a blank
    /// prompt).
    pub fn effective_prompt(&self) -> Option<String> {
        match self.mode {
            ExpressionMode::KeepOriginal => Some(KEEP_ORIGINAL_EXPRESSION.to_string()),
            ExpressionMode::Custom => {
                let trimmed = self.prompt.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
        }
    }

    /// Whether the generate trigger should be enabled: an image is present,
    /// the effective prompt is non-empty, and nothing is in flight.
    pub fn can_generate(&self) -> bool {
        self.image.is_some() && self.effective_prompt().is_some() && !self.status.is_loading()
    }

    /// Moves the session into `Loading` and returns the completion token plus
    /// the request to send.
    ///
    /// Refuses while a request is already in flight, so a second trigger
    /// never issues a second outbound call.
    pub fn begin(&mut self) -> Result<(PendingGeneration, StickerRequest)> {
        if self.status.is_loading() {
            return Err(StickerError::InvalidRequest(
                "a generation is already in flight".into(),
            ));
        }

        let (image, emotion) = match (self.image.as_ref(), self.effective_prompt()) {
            (Some(image), Some(emotion)) => (image.clone(), emotion),
            _ => {
                return Err(StickerError::InvalidRequest(
                    "an image and a non-empty prompt are required".into(),
                ))
            }
        };

        let request = StickerRequest::new(image, emotion).with_subject(self.subject.clone());

        self.epoch += 1;
        self.status = GenerationStatus::Loading;
        Ok((PendingGeneration { epoch: self.epoch }, request))
    }

    /// Records a successful generation. Stale tokens are discarded.
    pub fn complete(&mut self, pending: PendingGeneration, sticker: GeneratedSticker) {
        if pending.epoch != self.epoch {
            tracing::debug!("discarding stale generation result");
            return;
        }
        self.status = GenerationStatus::Success(sticker);
    }

    /// Records a failed generation. Stale tokens are discarded.
    pub fn fail(&mut self, pending: PendingGeneration, message: impl Into<String>) {
        if pending.epoch != self.epoch {
            tracing::debug!("discarding stale generation failure");
            return;
        }
        self.status = GenerationStatus::Error(message.into());
    }

    /// Clears image, result, prompt, subject, and mode back to their initial
    /// defaults in one step, and invalidates any outstanding token.
    pub fn reset(&mut self) {
        let epoch = self.epoch + 1;
        *self = Self {
            epoch,
            ..Self::default()
        };
    }

    /// Runs one full generation round trip against `provider`.
    ///
    /// Input-validation failures leave the status untouched; provider errors
    /// land as the generic error message, with the typed error traced.
    pub async fn generate_with<P>(&mut self, provider: &P, max_retries: u32) -> &GenerationStatus
    where
        P: StickerProvider + ?Sized,
    {
        let (pending, request) = match self.begin() {
            Ok(started) => started,
            Err(e) => {
                tracing::debug!("generate refused: {e}");
                return &self.status;
            }
        };

        match provider.generate_with_retries(&request, max_retries).await {
            Ok(sticker) => self.complete(pending, sticker),
            Err(e) => {
                tracing::error!(provider = provider.name(), "sticker generation failed: {e}");
                self.fail(pending, GENERIC_FAILURE_MESSAGE);
            }
        }

        &self.status
    }
}
