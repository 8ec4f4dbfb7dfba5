pub mod request_id;

pub use request_id::{request_id_middleware, RequestId, X_REQUEST_ID};

use anyhow::Context;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::controllers::{
    health::{self, HealthState},
    session::SessionController,
};
use crate::domain::playback::{PlaybackService, PlaybackServiceApi};
use crate::infrastructure::config::Config;

/// Build the application router with every route and middleware layer
pub fn build_router(health_state: HealthState, session_controller: Arc<SessionController>) -> Router {
    let session_routes = Router::new()
        .route("/api/session", get(SessionController::get_session))
        .route("/api/session/start", post(SessionController::start))
        .route("/api/session/toggle", post(SessionController::toggle))
        .route("/api/session/reset", post(SessionController::reset))
        .route("/api/session/events", get(SessionController::events))
        .with_state(session_controller);

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::health_ready))
        .with_state(health_state)
        .merge(session_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(request_id_middleware)),
        )
}

/// Serve the router until `shutdown` resolves
pub async fn start_http_server<F>(config: &Config, app: Router, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    serve(listener, app, shutdown).await
}

/// Serve the router on a bound listener until `shutdown` resolves and every
/// open connection has drained
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("Server error")?;

    Ok(())
}

/// Wait for `signal`, then stop the scheduler.
///
/// Event streams end when the scheduler stops, so this must run inside the
/// graceful shutdown future rather than after the server returns.
pub async fn stop_scheduler_on<F>(signal: F, playback_service: Arc<PlaybackService>)
where
    F: Future<Output = ()>,
{
    signal.await;
    match playback_service.shutdown().await {
        Ok(()) => tracing::info!("Playback scheduler shut down"),
        Err(e) => tracing::warn!(error = %e, "Scheduler already stopped"),
    }
}

/// Resolves on Ctrl-C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
