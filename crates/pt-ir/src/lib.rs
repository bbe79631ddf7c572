//! Song data model for ptplayer.
//!
//! The module decoder emits these types and the playback engine consumes
//! them read-only. A decoded [`Song`] is never mutated during playback.
//!
//! Designed to be `no_std` compatible with the `alloc` crate.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod analysis;
mod effects;
mod instrument;
mod pattern;
mod song;

pub use analysis::{analyze, SongFeatures};
pub use effects::Effect;
pub use instrument::{finetune_from_nibble, Instrument, InstrumentId, FINETUNE_TABLE};
pub use pattern::{Cell, Pattern, Row, CHANNELS, ROWS_PER_PATTERN};
pub use song::{Song, MAX_INSTRUMENTS, MAX_PLAY_ORDER};
