use super::batching::split_into_batches;
use super::tts_repository::TtsRepository;
use crate::domain::tts::{LanguageCode, SynthesisError};
use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{CreateSpeechRequest, SpeechModel, SpeechResponseFormat, Voice},
    Client,
};
use async_trait::async_trait;

/// OpenAI has a limit of 4096 characters per request
const MAX_BATCH_SIZE: usize = 4096;

/// Raw PCM from the speech endpoint is 24kHz mono s16le
const PCM_SAMPLE_RATE: u32 = 24_000;

/// OpenAI TTS implementation of TTS repository
pub struct OpenAiTtsRepository {
    client: Client<OpenAIConfig>,
    has_api_key: bool,
    model: String,
    default_voice: String,
}

impl OpenAiTtsRepository {
    pub fn new(api_key: String, model: String, default_voice: String) -> Self {
        let has_api_key = !api_key.trim().is_empty();
        let client = Client::with_config(OpenAIConfig::new().with_api_key(api_key));
        Self {
            client,
            has_api_key,
            model,
            default_voice,
        }
    }

    /// Select the appropriate OpenAI voice for a language
    fn get_voice_for_language(language: LanguageCode) -> &'static str {
        match language {
            LanguageCode::English => "alloy",
            LanguageCode::Spanish => "echo",
            LanguageCode::French => "nova",
            LanguageCode::German => "onyx",
            LanguageCode::Italian => "fable",
            LanguageCode::Portuguese => "shimmer",
        }
    }

    fn parse_voice(voice: &str) -> Voice {
        match voice.to_lowercase().as_str() {
            "echo" => Voice::Echo,
            "fable" => Voice::Fable,
            "onyx" => Voice::Onyx,
            "nova" => Voice::Nova,
            "shimmer" => Voice::Shimmer,
            _ => Voice::Alloy,
        }
    }

    /// Call OpenAI TTS API to synthesize a single text batch
    async fn call_openai(&self, text: &str, voice: &str) -> Result<Vec<u8>, SynthesisError> {
        tracing::info!(
            model = %self.model,
            voice = voice,
            text_length = text.len(),
            "Calling OpenAI TTS API"
        );

        let model = match self.model.as_str() {
            "tts-1" => SpeechModel::Tts1,
            "tts-1-hd" => SpeechModel::Tts1Hd,
            other => SpeechModel::Other(other.to_string()),
        };

        let request = CreateSpeechRequest {
            model,
            input: text.to_string(),
            voice: Self::parse_voice(voice),
            response_format: Some(SpeechResponseFormat::Pcm),
            speed: None,
        };

        let response = self
            .client
            .audio()
            .speech(request)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    model = %self.model,
                    voice = voice,
                    text_length = text.len(),
                    "OpenAI TTS API call failed"
                );
                map_openai_error(e)
            })?;

        let audio_bytes = response.bytes.to_vec();
        tracing::debug!(audio_size = audio_bytes.len(), "OpenAI TTS audio received");

        Ok(audio_bytes)
    }
}

fn map_openai_error(err: OpenAIError) -> SynthesisError {
    match err {
        OpenAIError::ApiError(api) if api.message.to_lowercase().contains("api key") => {
            SynthesisError::Credentials
        }
        OpenAIError::ApiError(api) => {
            SynthesisError::Provider(format!("OpenAI TTS error: {}", api.message))
        }
        OpenAIError::Reqwest(e) => SynthesisError::Network(e.to_string()),
        other => SynthesisError::Provider(format!("OpenAI TTS error: {}", other)),
    }
}

#[async_trait]
impl TtsRepository for OpenAiTtsRepository {
    async fn synthesize(
        &self,
        text: &str,
        language: LanguageCode,
    ) -> Result<Vec<u8>, SynthesisError> {
        if !self.has_api_key {
            tracing::warn!("OpenAI API key is not configured");
            return Err(SynthesisError::Credentials);
        }

        let start_time = std::time::Instant::now();

        let voice = if self.default_voice.is_empty() {
            Self::get_voice_for_language(language)
        } else {
            self.default_voice.as_str()
        };

        let batches = split_into_batches(text, MAX_BATCH_SIZE);
        let mut audio_data = Vec::new();
        for (index, batch) in batches.iter().enumerate() {
            let pcm = self.call_openai(batch, voice).await?;
            tracing::debug!(batch_index = index, batch_audio_size = pcm.len(), "Batch synthesized");
            audio_data.extend(pcm);
        }

        tracing::info!(
            provider = "openai",
            model = %self.model,
            voice = %voice,
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
        "openai"
    }
}
