pub mod audio;
pub mod error;
pub mod language;
pub mod service;

pub use audio::AudioSamples;
pub use error::SynthesisError;
pub use language::LanguageCode;
pub use service::{TtsService, TtsServiceApi};
