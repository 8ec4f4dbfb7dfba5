use super::batching::split_into_batches;
use super::tts_repository::TtsRepository;
use crate::domain::tts::{LanguageCode, SynthesisError};
use async_trait::async_trait;
use aws_sdk_polly::{
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    types::{Engine, OutputFormat, VoiceId},
    Client as PollyClient,
};
use std::sync::Arc;

/// AWS Polly has a limit of 3000 characters per request
const MAX_BATCH_SIZE: usize = 3000;

/// Polly PCM output is mono s16le; 16kHz is the highest rate it offers for PCM
const PCM_SAMPLE_RATE: u32 = 16_000;

/// Service error codes AWS answers with when credentials are rejected
const AUTH_ERROR_CODES: &[&str] = &[
    "UnrecognizedClientException",
    "InvalidSignatureException",
    "IncompleteSignature",
    "InvalidClientTokenId",
    "MissingAuthenticationToken",
    "ExpiredTokenException",
    "AccessDeniedException",
];

/// AWS Polly implementation of TTS repository
pub struct PollyTtsRepository {
    polly_client: Arc<PollyClient>,
}

impl PollyTtsRepository {
    pub fn new(polly_client: Arc<PollyClient>) -> Self {
        Self { polly_client }
    }

    /// Select the appropriate Polly neural voice for a language
    fn get_voice_for_language(language: LanguageCode) -> &'static str {
        match language {
            LanguageCode::English => "Joanna",
            LanguageCode::Spanish => "Lupe",
            LanguageCode::French => "Lea",
            LanguageCode::German => "Vicki",
            LanguageCode::Italian => "Bianca",
            LanguageCode::Portuguese => "Ines",
        }
    }

    /// Call AWS Polly to synthesize a single text batch
    async fn call_polly(
        &self,
        text: &str,
        language_code: LanguageCode,
    ) -> Result<Vec<u8>, SynthesisError> {
        let voice_name = Self::get_voice_for_language(language_code);

        tracing::info!(
            language = %language_code,
            voice = voice_name,
            output_format = "Pcm",
            text_length = text.len(),
            "Calling AWS Polly synthesize_speech"
        );

        let result = self
            .polly_client
            .synthesize_speech()
            .text(text)
            .voice_id(VoiceId::from(voice_name))
            .output_format(OutputFormat::Pcm)
            .sample_rate(PCM_SAMPLE_RATE.to_string())
            .engine(Engine::Neural)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %DisplayErrorContext(&e),
                    language = %language_code,
                    voice = voice_name,
                    text_length = text.len(),
                    "AWS Polly synthesize_speech failed"
                );
                map_polly_error(&e)
            })?;

        let audio_stream = result.audio_stream.collect().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to collect audio stream from Polly response");
            SynthesisError::Network(format!("Failed to read audio stream: {}", e))
        })?;

        let audio_bytes = audio_stream.into_bytes().to_vec();
        tracing::debug!(audio_size = audio_bytes.len(), "Audio stream collected");

        Ok(audio_bytes)
    }
}

fn map_polly_error<E, R>(err: &SdkError<E, R>) -> SynthesisError
where
    E: std::error::Error + ProvideErrorMetadata + 'static,
    R: std::fmt::Debug,
{
    if err
        .code()
        .is_some_and(|code| AUTH_ERROR_CODES.contains(&code))
    {
        return SynthesisError::Credentials;
    }

    let detail = DisplayErrorContext(err);
    match err {
        // Unresolvable credentials fail before transmit as an `other` dispatch failure
        SdkError::DispatchFailure(failure) if failure.is_other() => SynthesisError::Credentials,
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => {
            SynthesisError::Network(format!("AWS Polly unreachable: {}", detail))
        }
        _ => SynthesisError::Provider(format!("AWS Polly error: {}", detail)),
    }
}

#[async_trait]
impl TtsRepository for PollyTtsRepository {
    async fn synthesize(
        &self,
        text: &str,
        language: LanguageCode,
    ) -> Result<Vec<u8>, SynthesisError> {
        let start_time = std::time::Instant::now();

        let batches = split_into_batches(text, MAX_BATCH_SIZE);
        let mut audio_data = Vec::new();
        for (index, batch) in batches.iter().enumerate() {
            let pcm = self.call_polly(batch, language).await?;
            tracing::debug!(batch_index = index, batch_audio_size = pcm.len(), "Batch synthesized");
            audio_data.extend(pcm);
        }

        tracing::info!(
            provider = "polly",
            language = %language,
            latency_ms = start_time.elapsed().as_millis(),
            characters_count = text.len(),
            batch_count = batches.len(),
            audio_size_bytes = audio_data.len(),
            "TTS synthesis completed"
        );

        Ok(audio_data)
    }

    fn sample_rate(&self) -> u32 {
        PCM_SAMPLE_RATE
    }

    fn provider(&self) -> &'static str {
        "polly"
    }
}
