use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Extension, Json,
};
use futures::stream::Stream;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::{wrappers::WatchStream, StreamExt};

use crate::{
    domain::playback::{PlaybackService, PlaybackServiceApi, SessionSnapshot, StartSessionRequest},
    error::AppResult,
    infrastructure::http::RequestId,
};

pub struct SessionController {
    playback_service: Arc<PlaybackService>,
}

impl SessionController {
    pub fn new(playback_service: Arc<PlaybackService>) -> Self {
        Self { playback_service }
    }

    /// GET /api/session - Current session snapshot
    pub async fn get_session(
        State(controller): State<Arc<SessionController>>,
    ) -> AppResult<Json<SessionSnapshot>> {
        Ok(Json(controller.playback_service.observe()))
    }

    /// POST /api/session/start - Start a session, replacing any running one
    pub async fn start(
        State(controller): State<Arc<SessionController>>,
        Extension(request_id): Extension<RequestId>,
        Json(request): Json<StartSessionRequest>,
    ) -> AppResult<Json<SessionSnapshot>> {
        tracing::info!(
            request_id = %request_id.0,
            quotes_count = request.quotes.len(),
            interval_hours = request.interval_hours,
            "Start session requested"
        );

        let snapshot = controller.playback_service.start_session(request).await?;
        Ok(Json(snapshot))
    }

    /// POST /api/session/toggle - Pause, resume, or retry after a failure
    pub async fn toggle(
        State(controller): State<Arc<SessionController>>,
    ) -> AppResult<Json<SessionSnapshot>> {
        let snapshot = controller.playback_service.toggle_pause_resume().await?;
        Ok(Json(snapshot))
    }

    /// POST /api/session/reset - Back to idle
    pub async fn reset(
        State(controller): State<Arc<SessionController>>,
    ) -> AppResult<Json<SessionSnapshot>> {
        let snapshot = controller.playback_service.reset().await?;
        Ok(Json(snapshot))
    }

    /// GET /api/session/events - Stream snapshots as they change.
    ///
    /// The current snapshot is sent first, then one `snapshot` event per change.
    pub async fn events(
        State(controller): State<Arc<SessionController>>,
    ) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
        tracing::info!("Session event stream opened");

        let stream = WatchStream::new(controller.playback_service.subscribe())
            .map(|snapshot| Ok(snapshot_event(&snapshot)));

        Sse::new(stream).keep_alive(
            KeepAlive::new()
                .interval(Duration::from_secs(15))
                .text("ping"),
        )
    }
}

fn snapshot_event(snapshot: &SessionSnapshot) -> Event {
    match Event::default().event("snapshot").json_data(snapshot) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to encode session snapshot");
            Event::default().event("error").data(e.to_string())
        }
    }
}
