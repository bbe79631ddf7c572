//! Song structure.

use alloc::vec::Vec;
use arrayvec::ArrayString;

use crate::instrument::{Instrument, InstrumentId};
use crate::pattern::Pattern;

/// Instrument slots in a module.
pub const MAX_INSTRUMENTS: usize = 31;

/// Entries in the stored play order table.
pub const MAX_PLAY_ORDER: usize = 128;

/// A complete decoded song.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Song {
    /// Song name
    pub name: ArrayString<20>,
    /// Four-byte format marker, e.g. `M.K.` (informational only)
    pub format_tag: ArrayString<4>,
    /// Instrument slots (31 for decoded modules)
    pub instruments: Vec<Instrument>,
    /// Pattern indices in playback order (1..=128 entries)
    pub play_order: Vec<u8>,
    /// Patterns, indexed by pattern number
    pub patterns: Vec<Pattern>,
}

impl Song {
    /// Create a new empty song.
    pub fn new(name: &str) -> Self {
        let mut song = Self::default();
        let _ = song.name.try_push_str(name);
        song
    }

    /// Resolve a 1-based cell sample number to an instrument handle.
    ///
    /// Returns `None` for 0 and for numbers past the instrument list, which
    /// playback treats as "no instrument change".
    pub fn instrument_id(&self, sample_number: u8) -> Option<InstrumentId> {
        InstrumentId::from_sample_number(sample_number)
            .filter(|id| id.index() < self.instruments.len())
    }

    /// Look up an instrument by handle.
    pub fn instrument(&self, id: InstrumentId) -> Option<&Instrument> {
        self.instruments.get(id.index())
    }

    /// Pattern number played at a play order position.
    pub fn pattern_index_at(&self, song_position: usize) -> Option<u8> {
        self.play_order.get(song_position).copied()
    }

    /// Pattern played at a play order position.
    pub fn pattern_at(&self, song_position: usize) -> Option<&Pattern> {
        self.pattern_index_at(song_position)
            .and_then(|idx| self.patterns.get(idx as usize))
    }

    /// Append a pattern, returning its index.
    pub fn add_pattern(&mut self, pattern: Pattern) -> u8 {
        let idx = self.patterns.len() as u8;
        self.patterns.push(pattern);
        idx
    }

    /// Returns true if every play order entry names an existing pattern.
    pub fn play_order_is_valid(&self) -> bool {
        !self.play_order.is_empty()
            && self
                .play_order
                .iter()
                .all(|&idx| (idx as usize) < self.patterns.len())
    }
}
