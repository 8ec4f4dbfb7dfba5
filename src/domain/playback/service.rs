use super::error::PlaybackServiceError;
use super::model::{eligible_quotes, Quote, SessionSnapshot};
use super::scheduler::{Command, Scheduler};
use super::{SessionLimits, StartSessionRequest};
use crate::domain::tts::TtsServiceApi;
use crate::infrastructure::audio::AudioSink;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};

const COMMAND_BUFFER: usize = 32;
const SECONDS_PER_HOUR: u64 = 3600;

/// Handle to the playback scheduler task. Cheap to clone.
#[derive(Clone)]
pub struct PlaybackService {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<SessionSnapshot>,
    limits: SessionLimits,
}

impl PlaybackService {
    /// Spawn the scheduler on the current runtime
    pub fn spawn(
        synthesizer: Arc<dyn TtsServiceApi>,
        sink: Arc<dyn AudioSink>,
        tick_period: Duration,
        limits: SessionLimits,
    ) -> Self {
        let (commands, commands_rx) = mpsc::channel(COMMAND_BUFFER);
        let (scheduler, snapshots) = Scheduler::new(synthesizer, sink, tick_period);
        tokio::spawn(scheduler.run(commands_rx));

        Self {
            commands,
            snapshots,
            limits,
        }
    }

    pub fn limits(&self) -> SessionLimits {
        self.limits
    }

    fn validate(
        &self,
        request: StartSessionRequest,
    ) -> Result<(Vec<Quote>, Duration), PlaybackServiceError> {
        let quotes = eligible_quotes(request.quotes.into_iter().map(Quote::new).collect());
        if quotes.is_empty() {
            return Err(PlaybackServiceError::Invalid(
                "At least one non-empty quote is required".to_string(),
            ));
        }
        if quotes.len() > self.limits.max_quotes {
            return Err(PlaybackServiceError::Invalid(format!(
                "At most {} quotes are allowed",
                self.limits.max_quotes
            )));
        }

        let hours = request.interval_hours;
        if hours < self.limits.min_interval_hours || hours > self.limits.max_interval_hours {
            return Err(PlaybackServiceError::Invalid(format!(
                "Interval must be between {} and {} hours",
                self.limits.min_interval_hours, self.limits.max_interval_hours
            )));
        }

        Ok((
            quotes,
            Duration::from_secs(u64::from(hours) * SECONDS_PER_HOUR),
        ))
    }

    async fn request<T>(
        &self,
        command: Command,
        reply: oneshot::Receiver<T>,
    ) -> Result<T, PlaybackServiceError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| PlaybackServiceError::Unavailable)?;
        reply.await.map_err(|_| PlaybackServiceError::Unavailable)
    }
}

#[async_trait]
pub trait PlaybackServiceApi: Send + Sync {
    /// Validate a control-surface request against the session limits and start it
    async fn start_session(
        &self,
        request: StartSessionRequest,
    ) -> Result<SessionSnapshot, PlaybackServiceError>;

    /// Replace any running session and play the first eligible quote.
    ///
    /// A list with no eligible quote leaves the scheduler untouched.
    async fn start(
        &self,
        quotes: Vec<Quote>,
        interval: Duration,
    ) -> Result<SessionSnapshot, PlaybackServiceError>;

    /// Pause a playing session, or resume a paused one.
    ///
    /// Resuming a session halted by a failure retries the same quote.
    async fn toggle_pause_resume(&self) -> Result<SessionSnapshot, PlaybackServiceError>;

    /// Stop audio, cancel the countdown and return to idle
    async fn reset(&self) -> Result<SessionSnapshot, PlaybackServiceError>;

    /// Tear the session down and stop the scheduler task
    async fn shutdown(&self) -> Result<(), PlaybackServiceError>;

    fn observe(&self) -> SessionSnapshot;

    fn subscribe(&self) -> watch::Receiver<SessionSnapshot>;

    fn is_running(&self) -> bool;
}

#[async_trait]
impl PlaybackServiceApi for PlaybackService {
    async fn start_session(
        &self,
        request: StartSessionRequest,
    ) -> Result<SessionSnapshot, PlaybackServiceError> {
        let (quotes, interval) = self.validate(request)?;
        self.start(quotes, interval).await
    }

    async fn start(
        &self,
        quotes: Vec<Quote>,
        interval: Duration,
    ) -> Result<SessionSnapshot, PlaybackServiceError> {
        let (reply, rx) = oneshot::channel();
        self.request(
            Command::Start {
                quotes,
                interval,
                reply,
            },
            rx,
        )
        .await
    }

    async fn toggle_pause_resume(&self) -> Result<SessionSnapshot, PlaybackServiceError> {
        let (reply, rx) = oneshot::channel();
        self.request(Command::TogglePauseResume { reply }, rx).await
    }

    async fn reset(&self) -> Result<SessionSnapshot, PlaybackServiceError> {
        let (reply, rx) = oneshot::channel();
        self.request(Command::Reset { reply }, rx).await
    }

    async fn shutdown(&self) -> Result<(), PlaybackServiceError> {
        let (reply, rx) = oneshot::channel();
        self.request(Command::Shutdown { reply }, rx).await
    }

    fn observe(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }
}
