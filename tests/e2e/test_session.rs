use crate::e2e::helpers;

use helpers::{aws_mocks, TestContext};
use http_body_util::BodyExt;
use hyper::StatusCode;
use pretty_assertions::assert_eq;
use quotecast::domain::playback::{PlaybackMode, PlaybackServiceApi, SessionSnapshot};
use quotecast::infrastructure::repositories::{OpenAiTtsRepository, PollyTtsRepository};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use test_context::test_context;

const WAIT: Duration = Duration::from_secs(10);

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_be_idle_before_start(ctx: &TestContext) {
    let response = ctx.client.get("/api/session").await.unwrap();

    response.assert_status(StatusCode::OK);
    let snapshot: SessionSnapshot = response.json().unwrap();
    assert_eq!(snapshot, SessionSnapshot::idle());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_start_session_and_play_first_quote(ctx: &TestContext) {
    let response = ctx
        .client
        .post(
            "/api/session/start",
            &json!({
                "quotes": ["  The obstacle is the way.  ", "", "Amor fati."],
                "interval_hours": 1
            }),
        )
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    let started: SessionSnapshot = response.json().unwrap();
    assert_eq!(started.mode, PlaybackMode::Playing);
    assert_eq!(started.current_index, 0);
    assert_eq!(started.total_quotes, 2);
    assert_eq!(started.interval_seconds, Some(3600));
    assert_eq!(
        started.current_quote.map(|q| q.text).as_deref(),
        Some("The obstacle is the way.")
    );

    // The 200ms clip plays, then the countdown starts
    let snapshot = ctx
        .wait_for(WAIT, |s| {
            !s.is_synthesizing && !s.is_audio_playing && s.remaining_seconds > 0
        })
        .await;
    assert_eq!(snapshot.current_index, 0);
    assert_eq!(snapshot.remaining_seconds, 3600);
    assert_eq!(snapshot.last_error, None);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_list_without_quotes(ctx: &TestContext) {
    let response = ctx
        .client
        .post(
            "/api/session/start",
            &json!({ "quotes": ["", "   "], "interval_hours": 1 }),
        )
        .await
        .unwrap();

    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_message("non-empty quote");
    assert_eq!(ctx.client.session().await.unwrap(), SessionSnapshot::idle());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_too_many_quotes(ctx: &TestContext) {
    let quotes: Vec<String> = (0..21).map(|i| format!("Quote number {}", i)).collect();

    let response = ctx
        .client
        .post(
            "/api/session/start",
            &json!({ "quotes": quotes, "interval_hours": 1 }),
        )
        .await
        .unwrap();

    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_message("At most 20 quotes");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_interval_out_of_range(ctx: &TestContext) {
    for hours in [0, 6] {
        let response = ctx
            .client
            .post(
                "/api/session/start",
                &json!({ "quotes": ["Carpe diem."], "interval_hours": hours }),
            )
            .await
            .unwrap();

        response
            .assert_status(StatusCode::BAD_REQUEST)
            .assert_error_message("between 1 and 5 hours");
    }
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_malformed_body(ctx: &TestContext) {
    let response = ctx
        .client
        .post("/api/session/start", &json!({ "quotes": ["Missing interval"] }))
        .await
        .unwrap();

    assert!(response.status.is_client_error());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_pause_and_resume_countdown(ctx: &TestContext) {
    ctx.client
        .post(
            "/api/session/start",
            &json!({ "quotes": ["Festina lente."], "interval_hours": 2 }),
        )
        .await
        .unwrap()
        .assert_status(StatusCode::OK);
    ctx.wait_for(WAIT, |s| s.remaining_seconds > 0).await;

    let response = ctx.client.post_empty("/api/session/toggle").await.unwrap();
    response.assert_status(StatusCode::OK);
    let paused: SessionSnapshot = response.json().unwrap();
    assert_eq!(paused.mode, PlaybackMode::Paused);

    tokio::time::sleep(Duration::from_millis(1_500)).await;
    let still_paused = ctx.client.session().await.unwrap();
    assert_eq!(still_paused.remaining_seconds, paused.remaining_seconds);

    let response = ctx.client.post_empty("/api/session/toggle").await.unwrap();
    let resumed: SessionSnapshot = response.json().unwrap();
    assert_eq!(resumed.mode, PlaybackMode::Playing);
    assert_eq!(resumed.remaining_seconds, paused.remaining_seconds);
    assert_eq!(resumed.current_index, 0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reset_to_idle(ctx: &TestContext) {
    ctx.client
        .post(
            "/api/session/start",
            &json!({ "quotes": ["Memento mori."], "interval_hours": 1 }),
        )
        .await
        .unwrap()
        .assert_status(StatusCode::OK);

    let response = ctx.client.post_empty("/api/session/reset").await.unwrap();

    response.assert_status(StatusCode::OK);
    let snapshot: SessionSnapshot = response.json().unwrap();
    assert_eq!(snapshot, SessionSnapshot::idle());
    assert_eq!(ctx.client.session().await.unwrap(), SessionSnapshot::idle());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_ignore_toggle_without_session(ctx: &TestContext) {
    let response = ctx.client.post_empty("/api/session/toggle").await.unwrap();

    response.assert_status(StatusCode::OK);
    let snapshot: SessionSnapshot = response.json().unwrap();
    assert_eq!(snapshot, SessionSnapshot::idle());
}

#[tokio::test]
async fn it_should_surface_missing_api_key_as_last_error() {
    let repo = Arc::new(OpenAiTtsRepository::new(
        String::new(),
        "tts-1".to_string(),
        String::new(),
    ));
    let ctx = TestContext::with_repository(repo).await;

    ctx.client
        .post(
            "/api/session/start",
            &json!({ "quotes": ["Hello world"], "interval_hours": 1 }),
        )
        .await
        .unwrap()
        .assert_status(StatusCode::OK);

    let snapshot = ctx.wait_for(WAIT, |s| s.last_error.is_some()).await;
    assert_eq!(snapshot.mode, PlaybackMode::Paused);
    assert_eq!(
        snapshot.last_error.as_deref(),
        Some("Invalid or missing API Key.")
    );
    assert!(!snapshot.is_synthesizing);
    assert!(!snapshot.is_audio_playing);

    // Resuming retries the same quote and fails the same way
    let response = ctx.client.post_empty("/api/session/toggle").await.unwrap();
    let retried: SessionSnapshot = response.json().unwrap();
    assert_eq!(retried.last_error, None);
    assert_eq!(retried.current_index, 0);

    let snapshot = ctx.wait_for(WAIT, |s| s.last_error.is_some()).await;
    assert_eq!(snapshot.current_index, 0);
}

#[tokio::test]
async fn it_should_surface_unreachable_polly_as_last_error() {
    let polly_client = Arc::new(aws_mocks::create_unreachable_polly_client());
    let ctx = TestContext::with_repository(Arc::new(PollyTtsRepository::new(polly_client))).await;

    ctx.client
        .post(
            "/api/session/start",
            &json!({ "quotes": ["Hola mundo, ¿qué tal?"], "interval_hours": 1 }),
        )
        .await
        .unwrap()
        .assert_status(StatusCode::OK);

    let snapshot = ctx.wait_for(WAIT, |s| s.last_error.is_some()).await;
    assert_eq!(snapshot.mode, PlaybackMode::Paused);
    assert!(!snapshot.last_error.unwrap_or_default().trim().is_empty());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_stream_snapshots_over_sse(ctx: &TestContext) {
    let response = ctx.client.stream("/api/session/events").await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok()),
        Some("text/event-stream")
    );

    let mut body = response.into_body();
    let first = tokio::time::timeout(WAIT, next_data(&mut body))
        .await
        .expect("No initial snapshot event");
    assert!(first.contains("event: snapshot"), "Unexpected event: {}", first);
    assert!(first.contains("\"mode\":\"idle\""), "Unexpected event: {}", first);

    ctx.client
        .post(
            "/api/session/start",
            &json!({ "quotes": ["Streamed quote."], "interval_hours": 1 }),
        )
        .await
        .unwrap()
        .assert_status(StatusCode::OK);

    let next = tokio::time::timeout(WAIT, next_data(&mut body))
        .await
        .expect("No snapshot event after start");
    assert!(next.contains("\"mode\":\"playing\""), "Unexpected event: {}", next);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_shut_down_while_event_stream_is_open(ctx: &mut TestContext) {
    let response = ctx.client.stream("/api/session/events").await.unwrap();
    let mut body = response.into_body();
    let first = tokio::time::timeout(WAIT, next_data(&mut body))
        .await
        .expect("No initial snapshot event");
    assert!(first.contains("event: snapshot"), "Unexpected event: {}", first);

    let server = ctx.begin_shutdown().expect("Server already stopped");
    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("Server kept waiting on the open event stream")
        .expect("Server task failed");

    assert!(!ctx.playback_service.is_running());
    drop(body);
}

/// Read body frames until one carries data
async fn next_data(body: &mut hyper::body::Incoming) -> String {
    loop {
        let frame = body
            .frame()
            .await
            .expect("Stream ended")
            .expect("Stream failed");
        if let Ok(data) = frame.into_data() {
            return String::from_utf8_lossy(&data).to_string();
        }
    }
}
