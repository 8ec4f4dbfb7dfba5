use anyhow::Context;
use quotecast::controllers::{health::HealthState, session::SessionController};
use quotecast::domain::playback::{PlaybackService, SessionLimits};
use quotecast::domain::tts::TtsService;
use quotecast::infrastructure::audio::ClockedAudioSink;
use quotecast::infrastructure::config::{Config, LogFormat, TtsProvider};
use quotecast::infrastructure::http::{
    build_router, shutdown_signal, start_http_server, stop_scheduler_on,
};
use quotecast::infrastructure::repositories::{
    OpenAiTtsRepository, PollyTtsRepository, TtsRepository,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    init_logging(&config);

    tracing::info!(
        environment = ?config.environment,
        tts_provider = config.tts_provider.as_str(),
        "Starting Quotecast on {}:{}",
        config.host,
        config.port
    );

    // === DEPENDENCY INJECTION SETUP ===
    // 1. Speech provider
    let tts_repo = build_tts_repository(&config).await;

    // 2. Services
    let tts_service = Arc::new(TtsService::new(tts_repo, config.tts_cache_enabled));
    let tts_provider = tts_service.provider();

    let sink = Arc::new(ClockedAudioSink::new(config.audio_spool_dir.clone()));
    if let Some(dir) = &config.audio_spool_dir {
        tracing::info!(spool_dir = %dir.display(), "Audio clips will be spooled as WAV");
    }

    let limits = SessionLimits {
        max_quotes: config.max_quotes,
        min_interval_hours: config.min_interval_hours,
        max_interval_hours: config.max_interval_hours,
    };
    let playback_service = Arc::new(PlaybackService::spawn(
        tts_service,
        sink,
        config.tick_interval(),
        limits,
    ));

    // 3. Controllers
    let session_controller = Arc::new(SessionController::new(playback_service.clone()));
    let health_state = HealthState {
        playback_service: playback_service.clone(),
        tts_provider,
    };

    let app = build_router(health_state, session_controller);
    let shutdown = stop_scheduler_on(shutdown_signal(), playback_service);
    start_http_server(&config, app, shutdown).await?;

    tracing::info!("Shutdown complete");

    Ok(())
}

async fn build_tts_repository(config: &Config) -> Arc<dyn TtsRepository> {
    match config.tts_provider {
        TtsProvider::OpenAi => {
            if config.openai_api_key.trim().is_empty() {
                tracing::warn!("OPENAI_API_KEY is not set; every synthesis will fail until it is");
            }
            Arc::new(OpenAiTtsRepository::new(
                config.openai_api_key.clone(),
                config.openai_tts_model.clone(),
                config.openai_tts_voice.clone(),
            ))
        }
        TtsProvider::Polly => {
            let has_access_key = std::env::var("AWS_ACCESS_KEY_ID").is_ok();
            let has_secret_key = std::env::var("AWS_SECRET_ACCESS_KEY").is_ok();
            tracing::info!(
                region = %config.aws_region,
                has_access_key_id = has_access_key,
                has_secret_access_key = has_secret_key,
                "Initializing AWS Polly client"
            );

            let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
                .region(aws_config::Region::new(config.aws_region.clone()))
                .load()
                .await;
            let polly_client = Arc::new(aws_sdk_polly::Client::new(&aws_config));
            Arc::new(PollyTtsRepository::new(polly_client))
        }
    }
}

fn init_logging(config: &Config) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "quotecast=debug,tower_http=debug".into());

    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
