//! Playback configuration.

use core::time::Duration;

use crate::frequency::rate_constant;

/// Settings fixed for one playback session.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaybackConfig {
    /// Output sample rate in Hz
    pub sample_rate: u32,
    /// Wall-clock length of one sequencer tick
    pub tick_interval: Duration,
    /// Gain applied when mixing channels to stereo
    pub master_gain: f32,
    /// Override for the period rate constant; derived from
    /// `sample_rate` when `None`
    pub rate_constant: Option<f64>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            tick_interval: Duration::from_millis(20),
            master_gain: 0.1,
            rate_constant: None,
        }
    }
}

impl PlaybackConfig {
    pub fn with_sample_rate(sample_rate: u32) -> Self {
        Self { sample_rate, ..Self::default() }
    }

    /// Rate constant the voices step with.
    pub fn effective_rate_constant(&self) -> f64 {
        self.rate_constant.unwrap_or_else(|| rate_constant(self.sample_rate))
    }

    /// Output samples per sequencer tick (at least 1).
    pub fn samples_per_tick(&self) -> u32 {
        let micros = self.tick_interval.as_micros() as u64;
        (self.sample_rate as u64 * micros / 1_000_000).max(1) as u32
    }
}
