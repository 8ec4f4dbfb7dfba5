pub mod clocked_sink;

pub use clocked_sink::ClockedAudioSink;

use crate::domain::tts::AudioSamples;
use tokio::sync::oneshot;

#[derive(Debug, thiserror::Error)]
pub enum AudioSinkError {
    #[error("audio output unavailable: {0}")]
    Unavailable(String),
    #[error("failed to spool clip: {0}")]
    Spool(String),
}

/// Output device for synthesized quotes.
///
/// `play` starts a clip immediately and fires `on_finished` exactly once if the
/// clip runs to its natural end. A clip that is stopped never fires it.
/// `suspend` and `resume` affect every active clip.
pub trait AudioSink: Send + Sync {
    fn play(
        &self,
        samples: AudioSamples,
        on_finished: oneshot::Sender<()>,
    ) -> Result<Box<dyn PlaybackHandle>, AudioSinkError>;

    fn suspend(&self);

    fn resume(&self);
}

/// A clip started by an `AudioSink`.
///
/// `stop` is idempotent and safe after natural completion. Dropping the handle
/// stops the clip.
pub trait PlaybackHandle: Send {
    fn stop(&mut self);
}
