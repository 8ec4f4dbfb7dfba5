//! Single-task owner of the playback session.
//!
//! Commands, synthesis results, clip completions and countdown ticks are all
//! handled on one task, so transitions never interleave. Every asynchronous
//! step carries a token; results whose token is no longer current are dropped.

use super::model::{PlaybackMode, Quote, Session, SessionSnapshot};
use crate::domain::tts::{AudioSamples, SynthesisError, TtsServiceApi};
use crate::infrastructure::audio::{AudioSink, PlaybackHandle};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, Interval, MissedTickBehavior};

pub(crate) enum Command {
    Start {
        quotes: Vec<Quote>,
        interval: Duration,
        reply: oneshot::Sender<SessionSnapshot>,
    },
    TogglePauseResume {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    Reset {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

enum Event {
    Synthesized {
        token: u64,
        result: Result<AudioSamples, SynthesisError>,
    },
    PlaybackFinished {
        token: u64,
    },
}

struct ActiveClip {
    token: u64,
    handle: Box<dyn PlaybackHandle>,
}

pub(crate) struct Scheduler {
    synthesizer: Arc<dyn TtsServiceApi>,
    sink: Arc<dyn AudioSink>,
    tick_period: Duration,
    session: Option<Session>,
    ticker: Option<Interval>,
    active_clip: Option<ActiveClip>,
    pending_synthesis: Option<u64>,
    last_token: u64,
    events_tx: mpsc::UnboundedSender<Event>,
    events_rx: mpsc::UnboundedReceiver<Event>,
    snapshots: watch::Sender<SessionSnapshot>,
}

impl Scheduler {
    pub(crate) fn new(
        synthesizer: Arc<dyn TtsServiceApi>,
        sink: Arc<dyn AudioSink>,
        tick_period: Duration,
    ) -> (Self, watch::Receiver<SessionSnapshot>) {
        let (snapshots, snapshots_rx) = watch::channel(SessionSnapshot::idle());
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let scheduler = Self {
            synthesizer,
            sink,
            tick_period,
            session: None,
            ticker: None,
            active_clip: None,
            pending_synthesis: None,
            last_token: 0,
            events_tx,
            events_rx,
            snapshots,
        };

        (scheduler, snapshots_rx)
    }

    pub(crate) async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        tracing::info!(
            tick_ms = self.tick_period.as_millis(),
            "Playback scheduler started"
        );

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Shutdown { reply }) => {
                        self.teardown();
                        self.publish();
                        let _ = reply.send(());
                        break;
                    }
                    Some(command) => self.handle_command(command),
                    None => {
                        self.teardown();
                        self.publish();
                        break;
                    }
                },
                Some(event) = self.events_rx.recv() => self.handle_event(event),
                _ = next_tick(&mut self.ticker) => self.on_tick(),
            }
            self.publish();
        }

        tracing::info!("Playback scheduler stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Start {
                quotes,
                interval,
                reply,
            } => {
                self.start(quotes, interval);
                let _ = reply.send(self.snapshot());
            }
            Command::TogglePauseResume { reply } => {
                self.toggle_pause_resume();
                let _ = reply.send(self.snapshot());
            }
            Command::Reset { reply } => {
                self.reset();
                let _ = reply.send(self.snapshot());
            }
            // Handled by the run loop
            Command::Shutdown { reply } => {
                let _ = reply.send(());
            }
        }
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Synthesized { token, result } => self.on_synthesized(token, result),
            Event::PlaybackFinished { token } => self.on_playback_finished(token),
        }
    }

    fn start(&mut self, quotes: Vec<Quote>, interval: Duration) {
        let Some(session) = Session::new(quotes, interval) else {
            tracing::debug!("Start ignored: no eligible quotes");
            return;
        };

        self.teardown();
        tracing::info!(
            session_id = %session.id,
            total_quotes = session.total_quotes(),
            interval_secs = interval.as_secs(),
            "Playback session started"
        );
        self.session = Some(session);
        self.begin_cycle();
    }

    fn toggle_pause_resume(&mut self) {
        let now = Instant::now();
        let Some(session) = self.session.as_mut() else {
            tracing::debug!("Toggle ignored: no active session");
            return;
        };

        match session.mode {
            PlaybackMode::Playing => {
                session.pause(now);
                if self.pending_synthesis.take().is_some() {
                    session.is_synthesizing = false;
                }
                self.ticker = None;
                self.sink.suspend();
                tracing::info!(
                    session_id = %session.id,
                    remaining_seconds = session.remaining_seconds,
                    "Playback paused"
                );
            }
            PlaybackMode::Paused => {
                session.resume(now);
                self.sink.resume();
                let retry = session.last_error.take().is_some();
                let countdown = !session.is_audio_playing && session.has_deadline();
                tracing::info!(session_id = %session.id, retry, "Playback resumed");

                if retry {
                    self.begin_cycle();
                } else if countdown {
                    self.arm_ticker();
                } else {
                    // Restarts an interrupted synthesis, no-op while a clip plays
                    self.begin_cycle();
                }
            }
            PlaybackMode::Idle => {}
        }
    }

    fn reset(&mut self) {
        if self.session.is_none() {
            tracing::debug!("Reset ignored: no active session");
            return;
        }
        self.teardown();
    }

    /// Stop everything tied to the current session and drop it
    fn teardown(&mut self) {
        self.pending_synthesis = None;
        self.ticker = None;
        if let Some(mut clip) = self.active_clip.take() {
            clip.handle.stop();
        }
        if let Some(session) = self.session.take() {
            if session.mode == PlaybackMode::Paused {
                self.sink.resume();
            }
            tracing::info!(
                session_id = %session.id,
                current_index = session.current_index,
                "Playback session ended"
            );
        }
    }

    /// Synthesize and play the current quote if the session is ready for it
    fn begin_cycle(&mut self) {
        if !self.session.as_ref().is_some_and(Session::ready_for_cycle) {
            return;
        }
        let token = self.issue_token();
        let Some(session) = self.session.as_mut() else {
            return;
        };

        session.is_synthesizing = true;
        self.pending_synthesis = Some(token);
        let text = session.current_quote().text.clone();
        tracing::info!(
            session_id = %session.id,
            current_index = session.current_index,
            token,
            "Synthesizing quote"
        );

        let synthesizer = self.synthesizer.clone();
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let result = synthesizer.synthesize(&text).await;
            let _ = events.send(Event::Synthesized { token, result });
        });
    }

    fn on_synthesized(&mut self, token: u64, result: Result<AudioSamples, SynthesisError>) {
        if self.pending_synthesis != Some(token) {
            tracing::debug!(token, "Discarding stale synthesis result");
            return;
        }
        self.pending_synthesis = None;

        let now = Instant::now();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.is_synthesizing = false;

        let samples = match result {
            Ok(samples) => samples,
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    current_index = session.current_index,
                    "Quote synthesis failed"
                );
                session.fail(err.user_message(), now);
                return;
            }
        };

        if let Some(mut previous) = self.active_clip.take() {
            previous.handle.stop();
        }
        let (finished_tx, finished_rx) = oneshot::channel();
        match self.sink.play(samples, finished_tx) {
            Ok(handle) => {
                session.is_audio_playing = true;
                self.active_clip = Some(ActiveClip { token, handle });
                tracing::debug!(current_index = session.current_index, token, "Quote playing");

                let events = self.events_tx.clone();
                tokio::spawn(async move {
                    // Err means the clip was stopped
                    if finished_rx.await.is_ok() {
                        let _ = events.send(Event::PlaybackFinished { token });
                    }
                });
            }
            Err(err) => {
                tracing::warn!(error = %err, "Audio playback failed to start");
                session.fail(err.to_string(), now);
            }
        }
    }

    fn on_playback_finished(&mut self, token: u64) {
        if self.active_clip.as_ref().map(|clip| clip.token) != Some(token) {
            tracing::debug!(token, "Discarding stale playback completion");
            return;
        }
        self.active_clip = None;

        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.is_audio_playing = false;
        session.arm_deadline(Instant::now());
        tracing::debug!(
            current_index = session.current_index,
            remaining_seconds = session.remaining_seconds,
            "Quote finished, countdown armed"
        );

        if session.mode == PlaybackMode::Playing {
            self.arm_ticker();
        }
    }

    fn on_tick(&mut self) {
        let now = Instant::now();
        let Some(session) = self.session.as_mut() else {
            self.ticker = None;
            return;
        };
        if !session.refresh_countdown(now) {
            return;
        }

        self.ticker = None;
        session.advance();
        tracing::info!(
            session_id = %session.id,
            current_index = session.current_index,
            "Interval elapsed, advancing to next quote"
        );
        self.begin_cycle();
    }

    fn arm_ticker(&mut self) {
        let mut ticker =
            tokio::time::interval_at(Instant::now() + self.tick_period, self.tick_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.ticker = Some(ticker);
    }

    fn issue_token(&mut self) -> u64 {
        self.last_token += 1;
        self.last_token
    }

    fn snapshot(&self) -> SessionSnapshot {
        self.session
            .as_ref()
            .map(Session::snapshot)
            .unwrap_or_else(SessionSnapshot::idle)
    }

    fn publish(&self) {
        let next = self.snapshot();
        self.snapshots.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}

/// Resolves on the next tick, or never when no countdown is running
async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}
