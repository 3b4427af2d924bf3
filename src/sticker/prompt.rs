//! Instruction composition for the image model.
//!
//! The sticker style is fixed; only the targeting clause and the requested
//! emotion vary per request.

/// Effective prompt used when the user asks to keep the original expression
/// instead of describing a new one.
pub const KEEP_ORIGINAL_EXPRESSION: &str =
    "Keep the character's exact facial expression, emotion, and pose from the original image.";

/// Starter emotion/action prompts offered to the user.
pub const SUGGESTED_PROMPTS: [&str; 6] = [
    "Eating a giant burger happily",
    "Crying with waterfall tears",
    "Thumbs up with sparkling eyes",
    "Angry with fire background",
    "Confused with question marks",
    "Sleeping with a snot bubble",
];

/// The instruction sent alongside the character image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StickerPrompt {
    emotion: String,
    subject: Option<String>,
}

impl StickerPrompt {
    /// Creates a prompt for the given emotion or action.
    pub fn new(emotion: impl Into<String>) -> Self {
        Self {
            emotion: emotion.into(),
            subject: None,
        }
    }

    /// Targets a specific character description. Blank descriptions are
    /// treated as absent.
    pub fn with_subject(mut self, subject: Option<impl Into<String>>) -> Self {
        self.subject = subject
            .map(Into::into)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        self
    }

    /// Composes the full instruction: fixed chibi style rules, a targeting
    /// clause, and the requested emotion verbatim.
    pub fn compose(&self) -> String {
        let targeting = match &self.subject {
            Some(subject) => format!(
                "Target Subject: The user has identified the specific character to process as: \
                 \"{subject}\". You MUST focus ONLY on this character and ignore everyone else \
                 in the image."
            ),
            None => {
                "Target Subject: Focus on the central or most prominent character in the image."
                    .to_string()
            }
        };

        format!(
            "You are an expert character designer specializing in \"Q-version\" (Chibi) \
             stickers and emojis.\n\
             \n\
             Task:\n\
             1. Analyze the provided image. {targeting}\n\
             2. Identify this specific character's key features (hair, eyes, outfit, accessories).\n\
             3. Redraw this character as a high-quality vector-style sticker.\n\
             4. Apply the specific emotion or action requested: \"{emotion}\".\n\
             \n\
             Style Requirements:\n\
             - Cute, Chibi/Q-version proportions (large head, small body).\n\
             - Expressive facial features.\n\
             - Clean, bold lines with flat, vibrant colors.\n\
             - A thick white outline around the character (sticker die-cut style).\n\
             - White or transparent background.\n\
             - High fidelity and artistic quality.\n\
             - DO NOT include multiple characters unless specifically asked in the emotion prompt.",
            emotion = self.emotion,
        )
    }
}
