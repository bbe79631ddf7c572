//! Pattern, row, and cell types.

use crate::effects::Effect;

/// Rows in every pattern.
pub const ROWS_PER_PATTERN: usize = 64;

/// Channels in every row.
pub const CHANNELS: usize = 4;

/// A single cell in a pattern, exactly as stored in the module.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Cell {
    /// Instrument number (0 = no change, 1-based otherwise)
    pub sample_number: u8,
    /// Hardware period (0 = no pitch change), 12 bits
    pub period: u16,
    /// Effect command code (0x0-0xF)
    pub effect: u8,
    /// Raw effect parameter byte
    pub effect_param: u8,
}

impl Cell {
    /// Create an empty cell.
    pub const fn empty() -> Self {
        Self {
            sample_number: 0,
            period: 0,
            effect: 0,
            effect_param: 0,
        }
    }

    /// Decode the 4-byte wire layout.
    ///
    /// ```text
    /// byte 0: sample[7:4] | period[11:8]
    /// byte 1: period[7:0]
    /// byte 2: sample[3:0] | effect
    /// byte 3: effect parameter
    /// ```
    pub const fn from_bytes(b: [u8; 4]) -> Self {
        Self {
            sample_number: (b[0] & 0xF0) | (b[2] >> 4),
            period: (((b[0] & 0x0F) as u16) << 8) | b[1] as u16,
            effect: b[2] & 0x0F,
            effect_param: b[3],
        }
    }

    /// Decoded view of the effect column.
    pub const fn effect(&self) -> Effect {
        Effect::from_code(self.effect, self.effect_param)
    }

    /// Returns true if the cell is completely empty.
    pub fn is_empty(&self) -> bool {
        *self == Self::empty()
    }
}

/// One slice of note data across all channels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Row {
    pub cells: [Cell; CHANNELS],
}

impl Row {
    pub fn cell(&self, channel: usize) -> &Cell {
        &self.cells[channel]
    }
}

/// A pattern of exactly [`ROWS_PER_PATTERN`] rows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pattern {
    rows: [Row; ROWS_PER_PATTERN],
}

impl Default for Pattern {
    fn default() -> Self {
        Self::new()
    }
}

impl Pattern {
    /// Create a pattern of empty cells.
    pub const fn new() -> Self {
        Self {
            rows: [Row {
                cells: [Cell::empty(); CHANNELS],
            }; ROWS_PER_PATTERN],
        }
    }

    /// Get a row. Panics if `row >= ROWS_PER_PATTERN`.
    pub fn row(&self, row: usize) -> &Row {
        &self.rows[row]
    }

    /// Get a reference to a cell.
    pub fn cell(&self, row: usize, channel: usize) -> &Cell {
        &self.rows[row].cells[channel]
    }

    /// Get a mutable reference to a cell.
    pub fn cell_mut(&mut self, row: usize, channel: usize) -> &mut Cell {
        &mut self.rows[row].cells[channel]
    }

    /// Iterate over every cell, row-major.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.rows.iter().flat_map(|r| r.cells.iter())
    }
}
