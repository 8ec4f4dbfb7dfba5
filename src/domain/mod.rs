pub mod playback;
pub mod tts;
