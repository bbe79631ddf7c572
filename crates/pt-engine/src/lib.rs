//! Playback engine for ptplayer.
//!
//! A tick-driven [`Sequencer`] walks the song's play order and emits
//! [`VoiceCommand`]s; four [`ChannelVoice`]s resample instrument data at
//! the output rate. [`PlaybackEngine`] wires both together for a single
//! thread, or [`PlaybackEngine::split`]s them for a timer thread plus a
//! real-time audio callback.

mod command;
mod config;
mod engine;
mod frame;
mod frequency;
mod sequencer;
mod voice;

pub use command::{command_queue, CommandConsumer, CommandKind, CommandProducer, CommandSink, VoiceCommand};
pub use config::PlaybackConfig;
pub use engine::{PlaybackEngine, TickDriver, VoiceBank, VoiceRenderer};
pub use frame::{ChannelFrame, StereoFrame};
pub use frequency::{period_to_hz, rate_constant, PAULA_CLOCK_HZ};
pub use sequencer::{ChannelControl, PlaybackPosition, Sequencer, SequencerState, DEFAULT_TICKS_PER_ROW};
pub use voice::{ChannelVoice, LoopMode};
