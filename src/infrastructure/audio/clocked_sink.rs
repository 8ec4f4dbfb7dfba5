//! Real-time audio sink driven by the tokio clock.
//!
//! Each clip occupies the output for exactly its duration. Suspension pauses
//! every running clip and keeps its remaining time. When a spool directory is
//! configured, every clip is also written there as a 16-bit WAV file on the
//! blocking pool when it starts. A failed write is logged and never interrupts
//! playback.

use super::{AudioSink, AudioSinkError, PlaybackHandle};
use crate::domain::tts::AudioSamples;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::time::Instant;

pub struct ClockedAudioSink {
    suspended: watch::Sender<bool>,
    spool_dir: Option<PathBuf>,
    clip_counter: AtomicU64,
}

impl ClockedAudioSink {
    pub fn new(spool_dir: Option<PathBuf>) -> Self {
        let (suspended, _) = watch::channel(false);
        Self {
            suspended,
            spool_dir,
            clip_counter: AtomicU64::new(0),
        }
    }

    pub fn is_suspended(&self) -> bool {
        *self.suspended.borrow()
    }
}

impl AudioSink for ClockedAudioSink {
    fn play(
        &self,
        samples: AudioSamples,
        on_finished: oneshot::Sender<()>,
    ) -> Result<Box<dyn PlaybackHandle>, AudioSinkError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| AudioSinkError::Unavailable(e.to_string()))?;

        let clip_id = self.clip_counter.fetch_add(1, Ordering::Relaxed) + 1;
        let duration = samples.duration();
        tracing::debug!(clip_id, duration_ms = duration.as_millis(), "Clip started");

        if let Some(dir) = self.spool_dir.clone() {
            runtime.spawn_blocking(move || match spool_clip(&dir, clip_id, &samples) {
                Ok(path) => tracing::info!(clip_id, path = %path.display(), "Clip spooled"),
                Err(e) => tracing::warn!(clip_id, error = %e, "Failed to spool clip"),
            });
        }

        let (stop_tx, stop_rx) = oneshot::channel();
        runtime.spawn(run_clip(
            clip_id,
            duration,
            self.suspended.subscribe(),
            stop_rx,
            on_finished,
        ));

        Ok(Box::new(ClockedPlayback {
            stop: Some(stop_tx),
        }))
    }

    fn suspend(&self) {
        self.suspended.send_replace(true);
        tracing::debug!("Audio output suspended");
    }

    fn resume(&self) {
        self.suspended.send_replace(false);
        tracing::debug!("Audio output resumed");
    }
}

struct ClockedPlayback {
    stop: Option<oneshot::Sender<()>>,
}

impl PlaybackHandle for ClockedPlayback {
    fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            // Err means the clip already ended
            let _ = stop.send(());
        }
    }
}

impl Drop for ClockedPlayback {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_clip(
    clip_id: u64,
    duration: Duration,
    mut suspended: watch::Receiver<bool>,
    mut stop: oneshot::Receiver<()>,
    on_finished: oneshot::Sender<()>,
) {
    let mut remaining = duration;

    loop {
        if *suspended.borrow_and_update() {
            tokio::select! {
                changed = suspended.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    continue;
                }
                _ = &mut stop => {
                    tracing::debug!(clip_id, "Clip stopped while suspended");
                    return;
                }
            }
        }

        let started = Instant::now();
        tokio::select! {
            _ = tokio::time::sleep(remaining) => {
                tracing::debug!(clip_id, "Clip finished");
                let _ = on_finished.send(());
                return;
            }
            changed = suspended.changed() => {
                if changed.is_err() {
                    return;
                }
                remaining = remaining.saturating_sub(started.elapsed());
            }
            _ = &mut stop => {
                tracing::debug!(clip_id, "Clip stopped");
                return;
            }
        }
    }
}

fn spool_clip(dir: &Path, clip_id: u64, samples: &AudioSamples) -> Result<PathBuf, AudioSinkError> {
    std::fs::create_dir_all(dir).map_err(spool_err)?;
    let path = dir.join(format!(
        "{}-{:06}.wav",
        Utc::now().format("%Y%m%dT%H%M%S"),
        clip_id
    ));

    let spec = hound::WavSpec {
        channels: samples.channels,
        sample_rate: samples.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).map_err(spool_err)?;
    for sample in samples.to_i16() {
        writer.write_sample(sample).map_err(spool_err)?;
    }
    writer.finalize().map_err(spool_err)?;

    Ok(path)
}

fn spool_err(e: impl std::fmt::Display) -> AudioSinkError {
    AudioSinkError::Spool(e.to_string())
}
