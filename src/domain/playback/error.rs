use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum PlaybackServiceError {
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error("playback scheduler is not running")]
    Unavailable,
}

impl From<PlaybackServiceError> for AppError {
    fn from(err: PlaybackServiceError) -> Self {
        match err {
            PlaybackServiceError::Invalid(msg) => AppError::BadRequest(msg),
            PlaybackServiceError::Unavailable => {
                AppError::ServiceUnavailable("Playback scheduler is not running".to_string())
            }
        }
    }
}
