//! Channel voice: period-controlled sample playback for one channel.

use pt_ir::{Instrument, InstrumentId, Song};

use crate::command::CommandKind;

/// How a voice behaves when its position runs past the playable region.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LoopMode {
    /// Wrap back into `start..end`, carrying the fractional overflow.
    Looping { start: f64, end: f64 },
    /// Play to `end` once, then fall silent.
    OneShot { end: f64 },
}

impl LoopMode {
    /// Resolve the playable region for an instrument.
    ///
    /// The loop is clamped to the sample buffer; a loop that ends up two
    /// frames or shorter plays as a one-shot.
    pub fn for_instrument(inst: &Instrument) -> Self {
        let len = inst.sample_data.len() as u64;
        if inst.has_loop() {
            let start = (inst.loop_start as u64).min(len);
            let end = (inst.loop_start as u64 + inst.loop_length as u64).min(len);
            if end > start + 2 {
                return LoopMode::Looping {
                    start: start as f64,
                    end: end as f64,
                };
            }
        }
        LoopMode::OneShot { end: len as f64 }
    }
}

/// Playback state for a single channel.
#[derive(Clone, Debug)]
pub struct ChannelVoice {
    instrument: Option<InstrumentId>,
    /// Fractional frame offset into the sample
    position: f64,
    /// Set once a one-shot runs off its end
    wrapped_around: bool,
    period: f32,
    volume: f32,
    mode: LoopMode,
    rate_constant: f64,
}

impl ChannelVoice {
    /// Create an idle voice stepping with the given rate constant.
    pub fn new(rate_constant: f64) -> Self {
        Self {
            instrument: None,
            position: 0.0,
            wrapped_around: false,
            period: 0.0,
            volume: 0.0,
            mode: LoopMode::OneShot { end: 0.0 },
            rate_constant,
        }
    }

    /// Back to the state at playback start.
    pub fn reset(&mut self) {
        *self = Self::new(self.rate_constant);
    }

    pub fn instrument(&self) -> Option<InstrumentId> {
        self.instrument
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn is_wrapped_around(&self) -> bool {
        self.wrapped_around
    }

    pub fn period(&self) -> f32 {
        self.period
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Apply one sequencer command.
    pub fn apply(&mut self, kind: CommandKind, song: &Song) {
        match kind {
            CommandKind::AssignInstrument(id) => self.assign_instrument(id, song),
            CommandKind::SetPeriod(period) => self.set_period(period),
            CommandKind::SetVolume(volume) => self.set_volume(volume),
        }
    }

    /// Switch to another instrument and restart from frame 0.
    ///
    /// Re-assigning the active instrument is a no-op, so a held note keeps
    /// its position. Handles that do not resolve are ignored.
    pub fn assign_instrument(&mut self, id: InstrumentId, song: &Song) {
        if self.instrument == Some(id) {
            return;
        }
        let Some(inst) = song.instrument(id) else {
            return;
        };
        self.instrument = Some(id);
        self.mode = LoopMode::for_instrument(inst);
        self.position = 0.0;
        self.wrapped_around = false;
    }

    /// Set the playback period. 0 holds the current position.
    pub fn set_period(&mut self, period: f32) {
        self.period = period.max(0.0);
    }

    /// Set the channel gain, clamped to 0.0..=1.0.
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    /// Produce one output sample and advance the position.
    ///
    /// Nearest-sample playback: the frame at `floor(position)` is emitted
    /// before stepping, scaled by the channel volume.
    pub fn next_sample(&mut self, song: &Song) -> f32 {
        if self.wrapped_around {
            return 0.0;
        }
        let Some(inst) = self.instrument.and_then(|id| song.instrument(id)) else {
            return 0.0;
        };

        let amplitude = inst
            .sample_data
            .get(self.position as usize)
            .copied()
            .unwrap_or(0.0);

        if self.period > 0.0 {
            self.position += self.rate_constant / self.period as f64;
            self.resolve_loop();
        }

        amplitude * self.volume
    }

    fn resolve_loop(&mut self) {
        match self.mode {
            LoopMode::Looping { start, end } if self.position > end => {
                let overflow = (self.position - end) % (end - start);
                self.position = start + overflow;
            }
            LoopMode::OneShot { end } if self.position > end => {
                self.wrapped_around = true;
            }
            _ => {}
        }
    }
}
