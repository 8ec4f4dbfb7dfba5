pub mod error;
pub mod model;
mod scheduler;
pub mod service;

pub use error::PlaybackServiceError;
pub use model::{PlaybackMode, Quote, SessionSnapshot};
pub use service::{PlaybackService, PlaybackServiceApi};

use serde::{Deserialize, Serialize};

/// Request for POST /api/session/start
#[derive(Debug, Serialize, Deserialize)]
pub struct StartSessionRequest {
    pub quotes: Vec<String>,
    pub interval_hours: u32,
}

/// Bounds applied to sessions started through the control surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    pub max_quotes: usize,
    pub min_interval_hours: u32,
    pub max_interval_hours: u32,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            max_quotes: 20,
            min_interval_hours: 1,
            max_interval_hours: 5,
        }
    }
}
