//! Headless controller for ptplayer.
//!
//! Provides one API for loading modules, live playback and offline
//! rendering, shared by the CLI and the integration tests.

mod wav;

use pt_audio::{AudioError, AudioOutput, CpalOutput};
use pt_engine::PlaybackEngine;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;
use thiserror::Error;

// Re-export common types so callers don't need pt-ir/pt-engine directly.
pub use pt_engine::{PlaybackConfig, PlaybackPosition, StereoFrame};
pub use pt_formats::{DecodeWarning, FormatError};
pub use pt_ir::Song;

pub use wav::{frames_to_wav, write_wav, write_wav_file};

/// Longest offline render, in seconds. Renders are buffered whole.
pub const MAX_RENDER_SECONDS: f32 = 3600.0;

/// Error type for controller operations.
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Audio(#[from] AudioError),
    #[error("wav export failed: {0}")]
    Wav(#[from] hound::Error),
    #[error("playback thread exited before starting")]
    ThreadExited,
}

/// Module controller: owns a song and manages its playback.
pub struct Controller {
    song: Arc<Song>,
    config: PlaybackConfig,
    playback: Option<PlaybackHandle>,
}

struct PlaybackHandle {
    stop_signal: Arc<AtomicBool>,
    position: Arc<AtomicU32>,
    finished: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Controller {
    pub fn new(config: PlaybackConfig) -> Self {
        Self::with_song(Song::new("Untitled"), config)
    }

    pub fn with_song(song: Song, config: PlaybackConfig) -> Self {
        Self {
            song: Arc::new(song),
            config,
            playback: None,
        }
    }

    // --- Song management ---

    pub fn song(&self) -> &Song {
        &self.song
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    /// Decode a module from memory, replacing the current song.
    pub fn load_mod(&mut self, data: &[u8]) -> Result<Vec<DecodeWarning>, FormatError> {
        self.stop();
        let decoded = pt_formats::decode_with_warnings(data)?;
        let features = pt_ir::analyze(&decoded.song);
        if !features.ignored_effects.is_empty() {
            tracing::warn!(effects = ?features.ignored_effects, "song uses effects that will not play");
        }
        if !features.dangling_references.is_empty() {
            tracing::warn!(samples = ?features.dangling_references, "cells reference missing instruments");
        }
        self.song = Arc::new(decoded.song);
        Ok(decoded.warnings)
    }

    /// Read and decode a module file.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<Vec<DecodeWarning>, PlayerError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| PlayerError::Read {
            path: path.display().to_string(),
            source,
        })?;
        tracing::info!(path = %path.display(), bytes = data.len(), "loading module");
        Ok(self.load_mod(&data)?)
    }

    // --- Real-time playback ---

    /// Start live playback on the default audio device.
    ///
    /// Returns once the stream is running, or with the error that kept it
    /// from starting.
    pub fn play(&mut self) -> Result<(), PlayerError> {
        self.stop();

        let song = Arc::clone(&self.song);
        let config = self.config;
        let stop_signal = Arc::new(AtomicBool::new(false));
        let position = Arc::new(AtomicU32::new(0));
        let finished = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = mpsc::channel();

        let stop = stop_signal.clone();
        let pos = position.clone();
        let done = finished.clone();

        let thread = std::thread::spawn(move || {
            playback_thread(song, config, stop, pos, done, ready_tx);
        });

        match ready_rx.recv() {
            Ok(Ok(sample_rate)) => {
                tracing::info!(song = %self.song.name, sample_rate, "playback started");
                self.playback = Some(PlaybackHandle {
                    stop_signal,
                    position,
                    finished,
                    thread: Some(thread),
                });
                Ok(())
            }
            Ok(Err(err)) => {
                let _ = thread.join();
                Err(err.into())
            }
            Err(_) => {
                let _ = thread.join();
                Err(PlayerError::ThreadExited)
            }
        }
    }

    pub fn stop(&mut self) {
        if let Some(mut pb) = self.playback.take() {
            pb.stop_signal.store(true, Ordering::Relaxed);
            if let Some(handle) = pb.thread.take() {
                let _ = handle.join();
            }
            tracing::debug!("playback stopped");
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playback
            .as_ref()
            .is_some_and(|p| !p.finished.load(Ordering::Relaxed))
    }

    /// Latest position published by the tick thread.
    pub fn position(&self) -> Option<PlaybackPosition> {
        let pb = self.playback.as_ref()?;
        if pb.finished.load(Ordering::Relaxed) {
            return None;
        }
        Some(PlaybackPosition::unpack(pb.position.load(Ordering::Relaxed)))
    }

    // --- Offline rendering ---

    /// Render the song from the top, mixed to stereo.
    ///
    /// `seconds` is clamped to `0..=MAX_RENDER_SECONDS`; NaN renders nothing.
    pub fn render_frames(&self, seconds: f32) -> Vec<StereoFrame> {
        let seconds = if seconds.is_nan() { 0.0 } else { seconds.clamp(0.0, MAX_RENDER_SECONDS) };
        let count = (self.config.sample_rate as f64 * seconds as f64) as usize;
        let gain = self.config.master_gain;
        let mut engine = PlaybackEngine::start(Arc::clone(&self.song), self.config);
        engine
            .render_frames(count)
            .iter()
            .map(|frame| frame.mix(gain))
            .collect()
    }

    pub fn render_to_wav(&self, seconds: f32) -> Result<Vec<u8>, PlayerError> {
        let frames = self.render_frames(seconds);
        Ok(wav::frames_to_wav(&frames, self.config.sample_rate)?)
    }

    /// Render and write a WAV file to disk.
    pub fn export_wav(&self, path: impl AsRef<Path>, seconds: f32) -> Result<usize, PlayerError> {
        let frames = self.render_frames(seconds);
        wav::write_wav_file(path.as_ref(), &frames, self.config.sample_rate)?;
        tracing::info!(path = %path.as_ref().display(), frames = frames.len(), "wav written");
        Ok(frames.len())
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new(PlaybackConfig::default())
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Owns the output stream and drives sequencer ticks on a fixed interval.
fn playback_thread(
    song: Arc<Song>,
    mut config: PlaybackConfig,
    stop_signal: Arc<AtomicBool>,
    position: Arc<AtomicU32>,
    finished: Arc<AtomicBool>,
    ready: mpsc::Sender<Result<u32, AudioError>>,
) {
    let mut output = match CpalOutput::new() {
        Ok(output) => output,
        Err(err) => {
            finished.store(true, Ordering::Relaxed);
            let _ = ready.send(Err(err));
            return;
        }
    };

    // Voices step at the device rate
    config.sample_rate = output.sample_rate();
    let (mut driver, renderer) = PlaybackEngine::start(song, config).split();

    if let Err(err) = output.build_stream(renderer, config.master_gain) {
        finished.store(true, Ordering::Relaxed);
        let _ = ready.send(Err(err));
        return;
    }
    let _ = ready.send(Ok(config.sample_rate));

    let interval = config.tick_interval;
    let mut next_tick = Instant::now();
    while !stop_signal.load(Ordering::Relaxed) {
        driver.tick();
        position.store(driver.position().pack(), Ordering::Relaxed);

        next_tick += interval;
        let now = Instant::now();
        if next_tick > now {
            std::thread::sleep(next_tick - now);
        } else if now - next_tick > interval * 5 {
            tracing::warn!(behind_ms = (now - next_tick).as_millis() as u64, "tick thread fell behind");
            next_tick = now;
        }
    }

    if driver.dropped() > 0 {
        tracing::warn!(dropped = driver.dropped(), "voice commands dropped during playback");
    }
    if let Err(err) = output.stop() {
        tracing::warn!(%err, "failed to stop audio stream");
    }
    finished.store(true, Ordering::Relaxed);
}
