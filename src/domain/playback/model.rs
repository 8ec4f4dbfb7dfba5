use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackMode {
    #[default]
    Idle,
    Playing,
    Paused,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub id: String,
    pub text: String,
}

impl Quote {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
        }
    }

    /// A quote is playable only if it has text after trimming
    pub fn is_eligible(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// Keep eligible quotes in order, trimmed
pub fn eligible_quotes(quotes: Vec<Quote>) -> Vec<Quote> {
    quotes
        .into_iter()
        .filter(Quote::is_eligible)
        .map(|q| Quote {
            text: q.text.trim().to_string(),
            ..q
        })
        .collect()
}

/// Read-only view of the scheduler for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub mode: PlaybackMode,
    pub current_index: usize,
    pub total_quotes: usize,
    pub is_synthesizing: bool,
    pub is_audio_playing: bool,
    pub remaining_seconds: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_quote: Option<Quote>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
}

impl SessionSnapshot {
    pub fn idle() -> Self {
        Self {
            mode: PlaybackMode::Idle,
            current_index: 0,
            total_quotes: 0,
            is_synthesizing: false,
            is_audio_playing: false,
            remaining_seconds: 0,
            last_error: None,
            session_id: None,
            current_quote: None,
            interval_seconds: None,
            started_at: None,
        }
    }
}

/// Whole seconds left until `deadline`, rounded up
pub fn remaining_seconds(deadline: Instant, now: Instant) -> u64 {
    let left = deadline.saturating_duration_since(now);
    left.as_secs() + u64::from(left.subsec_nanos() > 0)
}

/// State of one playback run. Owned by the scheduler task.
#[derive(Debug)]
pub struct Session {
    pub id: Uuid,
    quotes: Vec<Quote>,
    pub current_index: usize,
    interval: Duration,
    pub mode: PlaybackMode,
    pub is_synthesizing: bool,
    pub is_audio_playing: bool,
    pub remaining_seconds: u64,
    pub last_error: Option<String>,
    next_deadline: Option<Instant>,
    paused_at: Option<Instant>,
    started_at: DateTime<Utc>,
}

impl Session {
    /// Returns `None` when no quote is eligible
    pub fn new(quotes: Vec<Quote>, interval: Duration) -> Option<Self> {
        let quotes = eligible_quotes(quotes);
        if quotes.is_empty() {
            return None;
        }

        Some(Self {
            id: Uuid::new_v4(),
            quotes,
            current_index: 0,
            interval,
            mode: PlaybackMode::Playing,
            is_synthesizing: false,
            is_audio_playing: false,
            remaining_seconds: 0,
            last_error: None,
            next_deadline: None,
            paused_at: None,
            started_at: Utc::now(),
        })
    }

    pub fn current_quote(&self) -> &Quote {
        &self.quotes[self.current_index]
    }

    pub fn total_quotes(&self) -> usize {
        self.quotes.len()
    }

    /// Whether a new cycle may begin right now
    pub fn ready_for_cycle(&self) -> bool {
        self.mode == PlaybackMode::Playing
            && self.remaining_seconds == 0
            && self.next_deadline.is_none()
            && !self.is_synthesizing
            && !self.is_audio_playing
            && self.last_error.is_none()
    }

    pub fn has_deadline(&self) -> bool {
        self.next_deadline.is_some()
    }

    /// Start the countdown to the next quote after a clip finished
    pub fn arm_deadline(&mut self, now: Instant) {
        self.next_deadline = Some(now + self.interval);
        self.remaining_seconds = remaining_seconds(now + self.interval, now);
        if self.mode == PlaybackMode::Paused {
            self.paused_at = Some(now);
        }
    }

    /// Recompute the countdown from the deadline.
    ///
    /// Frozen while paused. Returns true once the deadline has passed.
    pub fn refresh_countdown(&mut self, now: Instant) -> bool {
        if self.mode != PlaybackMode::Playing {
            return false;
        }
        match self.next_deadline {
            Some(deadline) => {
                self.remaining_seconds = remaining_seconds(deadline, now);
                self.remaining_seconds == 0
            }
            None => false,
        }
    }

    /// Move on to the next quote, wrapping to the first
    pub fn advance(&mut self) {
        self.next_deadline = None;
        self.remaining_seconds = 0;
        self.current_index = (self.current_index + 1) % self.quotes.len();
    }

    pub fn pause(&mut self, now: Instant) {
        if let Some(deadline) = self.next_deadline {
            self.remaining_seconds = remaining_seconds(deadline, now);
        }
        self.mode = PlaybackMode::Paused;
        self.paused_at = Some(now);
    }

    /// Leave pause, shifting the deadline by the time spent paused
    pub fn resume(&mut self, now: Instant) {
        if let (Some(paused_at), Some(deadline)) = (self.paused_at, self.next_deadline) {
            self.next_deadline = Some(deadline + now.saturating_duration_since(paused_at));
        }
        self.paused_at = None;
        self.mode = PlaybackMode::Playing;
    }

    /// Halt progression after a pipeline failure
    pub fn fail(&mut self, message: String, now: Instant) {
        self.is_synthesizing = false;
        self.is_audio_playing = false;
        self.last_error = Some(message);
        self.mode = PlaybackMode::Paused;
        self.paused_at = Some(now);
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            mode: self.mode,
            current_index: self.current_index,
            total_quotes: self.quotes.len(),
            is_synthesizing: self.is_synthesizing,
            is_audio_playing: self.is_audio_playing,
            remaining_seconds: self.remaining_seconds,
            last_error: self.last_error.clone(),
            session_id: Some(self.id),
            current_quote: Some(self.current_quote().clone()),
            interval_seconds: Some(self.interval.as_secs()),
            started_at: Some(self.started_at),
        }
    }
}
