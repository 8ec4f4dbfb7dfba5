use crate::domain::tts::{LanguageCode, SynthesisError};
use async_trait::async_trait;

/// Repository for TTS synthesis operations.
/// Abstracts the underlying TTS provider (OpenAI, AWS Polly, ...)
///
/// Implementations are responsible for:
/// - Handling provider-specific text length limitations
/// - Splitting text into batches if needed
/// - Concatenating the PCM of every batch in order
/// - Provider-specific voice selection
#[async_trait]
pub trait TtsRepository: Send + Sync {
    /// Synthesize text to speech for a given language
    ///
    /// Returns raw signed 16-bit little-endian mono PCM at `sample_rate()`
    ///
    /// # Errors
    /// Returns `SynthesisError::Credentials` when the provider rejects or is
    /// missing its credentials, `SynthesisError::Network` when it cannot be
    /// reached, and `SynthesisError::Provider` for anything else.
    async fn synthesize(&self, text: &str, language: LanguageCode)
        -> Result<Vec<u8>, SynthesisError>;

    /// Sample rate of the PCM returned by `synthesize`
    fn sample_rate(&self) -> u32;

    /// Short provider name for logs and health reporting
    fn provider(&self) -> &'static str;
}
