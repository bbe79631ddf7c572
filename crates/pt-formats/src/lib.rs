//! Module file decoder for ptplayer.
//!
//! Turns the raw bytes of a 31-instrument, 4-channel tracker module into a
//! [`pt_ir::Song`].

mod cursor;
mod mod_format;

pub use cursor::ByteCursor;
pub use mod_format::{
    decode, decode_with_warnings, Decoded, HEADER_SIZE, INSTRUMENT_HEADER_SIZE, PATTERN_SIZE,
};

use thiserror::Error;

/// Error type for module decoding.
///
/// Only structural truncation is fatal. Short sample payloads are reported
/// as [`DecodeWarning`]s instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// Buffer ends before the fixed header, instrument table, and play order.
    #[error("module too short: {actual} bytes, header needs {needed}")]
    TooShort { needed: usize, actual: usize },
    /// Buffer ends inside the pattern table.
    #[error("pattern table truncated: {patterns} patterns need {needed} bytes, have {actual}")]
    TruncatedPatterns {
        patterns: usize,
        needed: usize,
        actual: usize,
    },
    /// A read ran past the end of the buffer.
    #[error("unexpected end of data at offset {offset} (wanted {wanted} bytes)")]
    UnexpectedEof { offset: usize, wanted: usize },
    /// Record reader failure
    #[error("read error: {0}")]
    Io(String),
}

/// Non-fatal irregularity found while decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeWarning {
    /// Declared sample length exceeds the remaining bytes. The sample was
    /// zero-padded to its declared length.
    #[error("instrument {instrument}: sample data truncated ({available} of {declared} frames)")]
    TruncatedSampleData {
        instrument: usize,
        declared: u32,
        available: u32,
    },
    /// Stored song length outside 1..=128; the play order was clamped.
    #[error("song length {stored} out of range, using {used}")]
    SongLengthClamped { stored: u8, used: usize },
}
