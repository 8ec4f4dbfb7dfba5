use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

use crate::domain::playback::{PlaybackService, PlaybackServiceApi};

#[derive(Clone)]
pub struct HealthState {
    pub playback_service: Arc<PlaybackService>,
    pub tts_provider: &'static str,
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub async fn health_ready(State(state): State<HealthState>) -> impl IntoResponse {
    if state.playback_service.is_running() {
        (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "scheduler": "running",
                "tts": state.tts_provider
            })),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "not_ready",
                "scheduler": "stopped",
                "tts": state.tts_provider
            })),
        )
    }
}
