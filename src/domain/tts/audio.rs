use std::sync::Arc;
use std::time::Duration;

/// Decoded audio for one synthesized quote, normalized to `[-1.0, 1.0]`.
///
/// Samples are interleaved when `channels > 1`. The buffer is shared so
/// cached clips can be handed to the sink without copying.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSamples {
    pub samples: Arc<[f32]>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioSamples {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples: samples.into(),
            sample_rate,
            channels,
        }
    }

    /// Decode raw signed 16-bit little-endian PCM.
    ///
    /// A trailing odd byte is ignored.
    pub fn from_pcm_s16le(bytes: &[u8], sample_rate: u32, channels: u16) -> Self {
        let samples = bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
            .collect::<Vec<_>>();
        Self::new(samples, sample_rate, channels)
    }

    /// Silent clip of the given length, used by tests and local development.
    pub fn silence(duration: Duration, sample_rate: u32) -> Self {
        let frames = (duration.as_secs_f64() * sample_rate as f64).round() as usize;
        Self::new(vec![0.0; frames], sample_rate, 1)
    }

    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }

    /// Playback length at the clip's sample rate
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / self.sample_rate as f64)
    }

    /// Re-quantize to 16-bit integers for WAV output
    pub fn to_i16(&self) -> impl Iterator<Item = i16> + '_ {
        self.samples
            .iter()
            .map(|s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
    }
}
