use anyhow::Context;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub log_format: LogFormat,
    // Speech synthesis
    pub tts_provider: TtsProvider,
    pub openai_api_key: String,
    pub openai_tts_model: String,
    pub openai_tts_voice: String,
    pub aws_region: String,
    pub tts_cache_enabled: bool,
    // Scheduler
    pub tick_interval_ms: u64,
    pub max_quotes: usize,
    pub min_interval_hours: u32,
    pub max_interval_hours: u32,
    // Audio output
    pub audio_spool_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum TtsProvider {
    OpenAi,
    Polly,
}

impl TtsProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            TtsProvider::OpenAi => "openai",
            TtsProvider::Polly => "polly",
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid port number")?,
            environment: match env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string())
                .as_str()
            {
                "production" => Environment::Production,
                _ => Environment::Development,
            },
            log_format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
            tts_provider: match env::var("TTS_PROVIDER")
                .unwrap_or_else(|_| "openai".to_string())
                .to_lowercase()
                .as_str()
            {
                "polly" => TtsProvider::Polly,
                _ => TtsProvider::OpenAi,
            },
            openai_api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
            openai_tts_model: env::var("OPENAI_TTS_MODEL").unwrap_or_else(|_| "tts-1".to_string()),
            openai_tts_voice: env::var("OPENAI_TTS_VOICE").unwrap_or_default(),
            aws_region: env::var("AWS_REGION").unwrap_or_else(|_| "eu-west-1".to_string()),
            tts_cache_enabled: env::var("TTS_CACHE_ENABLED")
                .map(|s| s.to_lowercase() != "false")
                .unwrap_or(true),
            tick_interval_ms: env::var("TICK_INTERVAL_MS")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .context("TICK_INTERVAL_MS must be a positive integer")?,
            max_quotes: env::var("MAX_QUOTES")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .context("MAX_QUOTES must be a positive integer")?,
            min_interval_hours: env::var("MIN_INTERVAL_HOURS")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .context("MIN_INTERVAL_HOURS must be a positive integer")?,
            max_interval_hours: env::var("MAX_INTERVAL_HOURS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("MAX_INTERVAL_HOURS must be a positive integer")?,
            audio_spool_dir: env::var("AUDIO_SPOOL_DIR")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
        };

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.tick_interval_ms > 0, "TICK_INTERVAL_MS must be greater than 0");
        anyhow::ensure!(self.max_quotes > 0, "MAX_QUOTES must be greater than 0");
        anyhow::ensure!(
            self.min_interval_hours > 0 && self.min_interval_hours <= self.max_interval_hours,
            "interval bounds must satisfy 0 < MIN_INTERVAL_HOURS <= MAX_INTERVAL_HOURS"
        );
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}
