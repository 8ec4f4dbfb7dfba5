/// Fallback shown to the user when a provider fails without a usable message.
pub const GENERIC_SYNTHESIS_FAILURE: &str = "Failed to generate speech. Please try again.";

/// Failure of the speech synthesis pipeline for a single quote.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SynthesisError {
    #[error("Invalid or missing API Key.")]
    Credentials,
    #[error("Network error while contacting the speech service: {0}")]
    Network(String),
    #[error("The speech service returned no audio.")]
    EmptyResponse,
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error("{0}")]
    Provider(String),
}

impl SynthesisError {
    /// Message surfaced to the user as the session's `last_error`.
    pub fn user_message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            GENERIC_SYNTHESIS_FAILURE.to_string()
        } else {
            message
        }
    }
}
