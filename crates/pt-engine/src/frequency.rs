//! Period-to-rate conversion.
//!
//! Paula fetches one sample every `period` clock cycles, so a voice
//! advances `clock / (period * sample_rate)` frames per output sample. The
//! rate constant is the `clock / sample_rate` part.

/// PAL Paula DMA clock in Hz.
pub const PAULA_CLOCK_HZ: f64 = 3_546_895.0;

/// Rate constant for an output sample rate.
///
/// At 57 734 Hz this is about 61.4, the constant historically rounded
/// to 62.
pub fn rate_constant(sample_rate: u32) -> f64 {
    if sample_rate == 0 {
        return 0.0;
    }
    PAULA_CLOCK_HZ / sample_rate as f64
}

/// Playback frequency of a period in Hz (0 for period 0).
pub fn period_to_hz(period: f32) -> f64 {
    if period <= 0.0 {
        return 0.0;
    }
    PAULA_CLOCK_HZ / period as f64
}
