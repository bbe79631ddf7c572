//! Instruments: sample header metadata plus normalized sample data.

use alloc::vec::Vec;
use arrayvec::ArrayString;

/// Signed finetune levels indexed by the raw 4-bit header nibble.
pub const FINETUNE_TABLE: [i8; 16] = [0, 1, 2, 3, 4, 5, 6, 7, -8, -7, -6, -5, -4, -3, -2, -1];

/// Map a raw finetune byte to its signed level. Only the low nibble counts.
pub const fn finetune_from_nibble(raw: u8) -> i8 {
    FINETUNE_TABLE[(raw & 0x0F) as usize]
}

/// Opaque handle to an instrument: its zero-based slot in [`Song::instruments`].
///
/// Two channels playing the same handle play the same instrument; the
/// engine compares handles, never instrument contents.
///
/// [`Song::instruments`]: crate::Song::instruments
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstrumentId(pub u8);

impl InstrumentId {
    /// Convert a 1-based pattern sample number. 0 means "no change".
    pub const fn from_sample_number(sample_number: u8) -> Option<Self> {
        match sample_number {
            0 => None,
            n => Some(Self(n - 1)),
        }
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// An instrument definition.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Instrument {
    /// Instrument name
    pub name: ArrayString<22>,
    /// Length in sample frames
    pub sample_length: u32,
    /// Finetune in eighths of a semitone (-8..=7)
    pub finetune: i8,
    /// Default volume (0-64, not clamped at decode time)
    pub default_volume: u8,
    /// Loop start in sample frames
    pub loop_start: u32,
    /// Loop length in sample frames (<= 2 means one-shot)
    pub loop_length: u32,
    /// Normalized amplitudes in [-1.0, 1.0)
    pub sample_data: Vec<f32>,
}

impl Instrument {
    /// Create an empty instrument with the given name.
    pub fn new(name: &str) -> Self {
        let mut inst = Self::default();
        let _ = inst.name.try_push_str(name);
        inst
    }

    /// Returns true if the header declares a loop region.
    pub fn has_loop(&self) -> bool {
        self.loop_length > 2
    }

    /// Returns true if the instrument carries no sample frames.
    pub fn is_empty(&self) -> bool {
        self.sample_data.is_empty()
    }

    /// Default volume as a gain in 0.0..=1.0 (values above 64 are clamped).
    pub fn default_gain(&self) -> f32 {
        self.default_volume.min(64) as f32 / 64.0
    }

    /// Period scale factor for this instrument's finetune: `2^(finetune / 96)`.
    pub fn finetune_factor(&self) -> f32 {
        libm::exp2f(self.finetune as f32 / 96.0)
    }
}
