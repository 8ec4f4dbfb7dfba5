use super::audio::AudioSamples;
use super::error::SynthesisError;
use super::language::{build_detector, detect_language};
use crate::infrastructure::repositories::TtsRepository;
use async_trait::async_trait;
use lingua::LanguageDetector;
use moka::future::Cache;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;

static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

pub struct TtsService {
    tts_repo: Arc<dyn TtsRepository>,
    language_detector: LanguageDetector,
    cache: Option<Cache<String, AudioSamples>>,
}

impl TtsService {
    pub fn new(tts_repo: Arc<dyn TtsRepository>, cache_enabled: bool) -> Self {
        let cache = if cache_enabled {
            Some(
                Cache::builder()
                    .max_capacity(100)
                    .time_to_idle(Duration::from_secs(30 * 60)) // 30 minutes, refreshes on access
                    .build(),
            )
        } else {
            None
        };

        Self {
            tts_repo,
            language_detector: build_detector(),
            cache,
        }
    }

    pub fn provider(&self) -> &'static str {
        self.tts_repo.provider()
    }
}

/// Speech synthesis as seen by the playback scheduler
#[async_trait]
pub trait TtsServiceApi: Send + Sync {
    /// Convert one quote to decoded audio.
    ///
    /// This operation:
    /// - Normalizes whitespace and rejects empty text
    /// - Serves repeated quotes from the cache when enabled
    /// - Detects the quote's language to pick a voice
    /// - Decodes the provider's PCM into samples
    async fn synthesize(&self, text: &str) -> Result<AudioSamples, SynthesisError>;
}

#[async_trait]
impl TtsServiceApi for TtsService {
    async fn synthesize(&self, text: &str) -> Result<AudioSamples, SynthesisError> {
        let cleaned_text = clean_text(text);
        if cleaned_text.is_empty() {
            return Err(SynthesisError::Invalid("Text cannot be empty".to_string()));
        }

        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get(&cleaned_text).await {
                tracing::info!(
                    text_length = cleaned_text.len(),
                    duration_ms = cached.duration().as_millis(),
                    "TTS cache hit - returning cached audio"
                );
                return Ok(cached);
            }
        }

        let language = detect_language(&self.language_detector, &cleaned_text);
        tracing::debug!(language_detected = %language, "Language detected for quote");

        let pcm = self.tts_repo.synthesize(&cleaned_text, language).await?;
        let audio = AudioSamples::from_pcm_s16le(&pcm, self.tts_repo.sample_rate(), 1);
        if audio.is_empty() {
            tracing::warn!(provider = self.tts_repo.provider(), "TTS provider returned no audio");
            return Err(SynthesisError::EmptyResponse);
        }

        if let Some(cache) = &self.cache {
            cache.insert(cleaned_text, audio.clone()).await;
        }

        Ok(audio)
    }
}

/// Collapse runs of whitespace and trim
fn clean_text(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}
