//! Tick-driven sequencer.
//!
//! Each tick first applies continuous effects, then counts toward the
//! next row. When `ticks_per_row` ticks have elapsed the next row is read
//! and turned into [`VoiceCommand`]s. The play order loops forever.

use std::sync::Arc;

use pt_ir::{Cell, Effect, InstrumentId, Song, CHANNELS, ROWS_PER_PATTERN};

use crate::command::{CommandKind, CommandSink, VoiceCommand};

/// Ticks per row at playback start.
pub const DEFAULT_TICKS_PER_ROW: u32 = 6;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SequencerState {
    #[default]
    Idle,
    Running,
}

/// Read-only snapshot of where playback is, for pattern displays.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlaybackPosition {
    /// Index into the play order
    pub song_position: usize,
    /// Pattern number at that position
    pub pattern_index: u8,
    /// Next row to be processed
    pub row: usize,
}

impl PlaybackPosition {
    /// Pack into a single word for lock-free publication.
    pub fn pack(&self) -> u32 {
        ((self.song_position as u32 & 0xFF) << 16) | ((self.pattern_index as u32) << 8) | (self.row as u32 & 0xFF)
    }

    pub fn unpack(word: u32) -> Self {
        Self {
            song_position: ((word >> 16) & 0xFF) as usize,
            pattern_index: ((word >> 8) & 0xFF) as u8,
            row: (word & 0xFF) as usize,
        }
    }
}

/// Sequencer-side view of a channel.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ChannelControl {
    /// Instrument most recently assigned on this channel
    pub instrument: Option<InstrumentId>,
    /// Current gain (0.0..=1.0)
    pub volume: f32,
    /// Gain added every tick; cleared when the volume hits 0 or 1
    pub volume_slide: f32,
}

impl ChannelControl {
    /// Apply one tick of volume slide. Returns the new volume if it changed.
    fn slide(&mut self) -> Option<f32> {
        if self.volume_slide == 0.0 {
            return None;
        }
        self.volume += self.volume_slide;
        if self.volume > 1.0 {
            self.volume = 1.0;
            self.volume_slide = 0.0;
        } else if self.volume < 0.0 {
            self.volume = 0.0;
            self.volume_slide = 0.0;
        }
        Some(self.volume)
    }
}

/// Walks a song's play order at tick resolution.
pub struct Sequencer {
    song: Arc<Song>,
    state: SequencerState,
    song_position: usize,
    row_position: usize,
    tick_counter: u32,
    ticks_per_row: u32,
    channels: [ChannelControl; CHANNELS],
}

impl Sequencer {
    /// Create an idle sequencer for a song.
    pub fn new(song: Arc<Song>) -> Self {
        Self {
            song,
            state: SequencerState::Idle,
            song_position: 0,
            row_position: 0,
            tick_counter: 0,
            ticks_per_row: DEFAULT_TICKS_PER_ROW,
            channels: [ChannelControl::default(); CHANNELS],
        }
    }

    /// Reset all runtime state and start running.
    pub fn start(&mut self) {
        self.song_position = 0;
        self.row_position = 0;
        self.tick_counter = 0;
        self.ticks_per_row = DEFAULT_TICKS_PER_ROW;
        self.channels = [ChannelControl::default(); CHANNELS];
        self.state = SequencerState::Running;
    }

    /// Stop; further ticks are ignored until [`Sequencer::start`].
    pub fn stop(&mut self) {
        self.state = SequencerState::Idle;
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SequencerState::Running
    }

    pub fn song(&self) -> &Arc<Song> {
        &self.song
    }

    pub fn song_position(&self) -> usize {
        self.song_position
    }

    pub fn row_position(&self) -> usize {
        self.row_position
    }

    pub fn tick_counter(&self) -> u32 {
        self.tick_counter
    }

    pub fn ticks_per_row(&self) -> u32 {
        self.ticks_per_row
    }

    pub fn channel(&self, channel: usize) -> &ChannelControl {
        &self.channels[channel]
    }

    pub fn position(&self) -> PlaybackPosition {
        PlaybackPosition {
            song_position: self.song_position,
            pattern_index: self.song.pattern_index_at(self.song_position).unwrap_or(0),
            row: self.row_position,
        }
    }

    /// Advance one tick. Returns true if a row was processed.
    pub fn tick(&mut self, sink: &mut impl CommandSink) -> bool {
        if !self.is_running() {
            return false;
        }

        self.apply_tick_effects(sink);

        self.tick_counter += 1;
        if self.tick_counter < self.ticks_per_row {
            return false;
        }
        self.tick_counter = 0;
        self.process_row(sink);
        self.advance_row();
        true
    }

    fn apply_tick_effects(&mut self, sink: &mut impl CommandSink) {
        for (ch, control) in self.channels.iter_mut().enumerate() {
            if let Some(volume) = control.slide() {
                sink.send(VoiceCommand::new(ch as u8, CommandKind::SetVolume(volume)));
            }
        }
    }

    fn process_row(&mut self, sink: &mut impl CommandSink) {
        // An order entry without a pattern plays as an empty row
        let Some(pattern) = self.song.pattern_at(self.song_position) else {
            return;
        };
        let row = *pattern.row(self.row_position);
        for (ch, cell) in row.cells.iter().enumerate() {
            self.process_cell(ch, cell, sink);
        }
    }

    fn process_cell(&mut self, ch: usize, cell: &Cell, sink: &mut impl CommandSink) {
        let song = &self.song;
        let control = &mut self.channels[ch];
        let channel = ch as u8;

        if let Some(id) = song.instrument_id(cell.sample_number) {
            let gain = song.instrument(id).map_or(0.0, |inst| inst.default_gain());
            control.instrument = Some(id);
            control.volume = gain;
            sink.send(VoiceCommand::new(channel, CommandKind::AssignInstrument(id)));
            sink.send(VoiceCommand::new(channel, CommandKind::SetVolume(gain)));
        }

        if cell.period != 0 {
            let factor = control
                .instrument
                .and_then(|id| song.instrument(id))
                .map_or(1.0, |inst| inst.finetune_factor());
            let period = cell.period as f32 * factor;
            sink.send(VoiceCommand::new(channel, CommandKind::SetPeriod(period)));
        }

        match cell.effect() {
            Effect::SetVolume(param) => {
                control.volume = (param as f32 / 64.0).min(1.0);
                sink.send(VoiceCommand::new(channel, CommandKind::SetVolume(control.volume)));
            }
            // Speed 0 would stall the row clock
            Effect::SetSpeed(0) => {}
            Effect::SetSpeed(param) => self.ticks_per_row = param as u32,
            Effect::VolumeSlide(param) => {
                let rate = if param >= 0xF0 {
                    (param >> 4) as f32
                } else {
                    -(param as f32)
                };
                control.volume_slide = rate / 64.0;
            }
            // Remaining commands are recognized but not executed
            _ => {}
        }
    }

    fn advance_row(&mut self) {
        self.row_position += 1;
        if self.row_position >= ROWS_PER_PATTERN {
            self.row_position = 0;
            self.song_position += 1;
            if self.song_position >= self.song.play_order.len() {
                self.song_position = 0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pt_ir::{Instrument, Pattern};

    fn cell(sample_number: u8, period: u16, effect: u8, effect_param: u8) -> Cell {
        Cell { sample_number, period, effect, effect_param }
    }

    fn test_song(patterns: Vec<Pattern>, order: Vec<u8>) -> Arc<Song> {
        let mut song = Song::new("seq");
        for (volume, finetune) in [(64, 0), (32, -8)] {
            let mut inst = Instrument::new("inst");
            inst.default_volume = volume;
            inst.finetune = finetune;
            song.instruments.push(inst);
        }
        song.patterns = patterns;
        song.play_order = order;
        Arc::new(song)
    }

    fn running(song: Arc<Song>) -> Sequencer {
        let mut seq = Sequencer::new(song);
        seq.start();
        seq
    }

    /// Tick until the next row is processed, returning its commands.
    fn next_row(seq: &mut Sequencer) -> Vec<VoiceCommand> {
        let mut out = Vec::new();
        while !seq.tick(&mut out) {}
        out
    }

    #[test]
    fn idle_sequencer_ignores_ticks() {
        let mut seq = Sequencer::new(test_song(vec![Pattern::new()], vec![0]));
        let mut out = Vec::new();
        for _ in 0..20 {
            assert!(!seq.tick(&mut out));
        }
        assert!(out.is_empty());
        assert_eq!(seq.state(), SequencerState::Idle);
    }

    #[test]
    fn row_every_six_ticks() {
        let mut seq = running(test_song(vec![Pattern::new()], vec![0]));
        let mut out = Vec::new();
        let mut rows = Vec::new();
        for _ in 1..=30 {
            if seq.tick(&mut out) {
                rows.push(seq.row_position());
            }
        }
        assert_eq!(rows, vec![1, 2, 3, 4, 5]);

        let mut seq = running(test_song(vec![Pattern::new()], vec![0]));
        let ticks: Vec<u32> = (1..=30).filter(|_| seq.tick(&mut out)).collect();
        assert_eq!(ticks, vec![6, 12, 18, 24, 30]);
    }

    #[test]
    fn set_speed_applies_from_next_row() {
        let mut pat = Pattern::new();
        *pat.cell_mut(1, 2) = cell(0, 0, 0xF, 3);
        let mut seq = running(test_song(vec![pat], vec![0]));
        let mut out = Vec::new();

        let ticks: Vec<u32> = (1..=24).filter(|_| seq.tick(&mut out)).collect();
        // Row 0 at 6, row 1 (sets speed 3) at 12, then every 3 ticks
        assert_eq!(ticks, vec![6, 12, 15, 18, 21, 24]);
        assert_eq!(seq.ticks_per_row(), 3);
    }

    #[test]
    fn speed_zero_is_ignored() {
        let mut pat = Pattern::new();
        *pat.cell_mut(0, 0) = cell(0, 0, 0xF, 0);
        let mut seq = running(test_song(vec![pat], vec![0]));
        next_row(&mut seq);
        assert_eq!(seq.ticks_per_row(), DEFAULT_TICKS_PER_ROW);
    }

    #[test]
    fn instrument_and_period_commands() {
        let mut pat = Pattern::new();
        *pat.cell_mut(0, 1) = cell(1, 428, 0, 0);
        *pat.cell_mut(0, 3) = cell(2, 0, 0, 0);
        let mut seq = running(test_song(vec![pat], vec![0]));

        let out = next_row(&mut seq);
        assert_eq!(
            out,
            vec![
                VoiceCommand::new(1, CommandKind::AssignInstrument(InstrumentId(0))),
                VoiceCommand::new(1, CommandKind::SetVolume(1.0)),
                VoiceCommand::new(1, CommandKind::SetPeriod(428.0)),
                VoiceCommand::new(3, CommandKind::AssignInstrument(InstrumentId(1))),
                VoiceCommand::new(3, CommandKind::SetVolume(0.5)),
            ]
        );
        assert_eq!(seq.channel(3).instrument, Some(InstrumentId(1)));
    }

    #[test]
    fn period_uses_active_instrument_finetune() {
        let mut pat = Pattern::new();
        *pat.cell_mut(0, 0) = cell(2, 0, 0, 0);
        *pat.cell_mut(1, 0) = cell(0, 428, 0, 0);
        let mut seq = running(test_song(vec![pat], vec![0]));
        next_row(&mut seq);

        let out = next_row(&mut seq);
        let expected = 428.0 * 2f32.powf(-8.0 / 96.0);
        match out.as_slice() {
            [VoiceCommand { channel: 0, kind: CommandKind::SetPeriod(p) }] => {
                approx::assert_relative_eq!(*p, expected, max_relative = 1e-6);
            }
            other => panic!("unexpected commands {other:?}"),
        }
    }

    #[test]
    fn dangling_sample_number_changes_nothing() {
        let mut pat = Pattern::new();
        *pat.cell_mut(0, 0) = cell(0x1F, 0, 0, 0);
        let mut seq = running(test_song(vec![pat], vec![0]));
        assert!(next_row(&mut seq).is_empty());
        assert_eq!(seq.channel(0).instrument, None);
    }

    #[test]
    fn set_volume_effect() {
        let mut pat = Pattern::new();
        *pat.cell_mut(0, 2) = cell(1, 0, 0xC, 0x20);
        *pat.cell_mut(1, 2) = cell(0, 0, 0xC, 0xFF);
        let mut seq = running(test_song(vec![pat], vec![0]));

        let out = next_row(&mut seq);
        assert_eq!(out.last(), Some(&VoiceCommand::new(2, CommandKind::SetVolume(0.5))));
        next_row(&mut seq);
        assert_eq!(seq.channel(2).volume, 1.0);
    }

    #[test]
    fn unsupported_effects_are_noops() {
        let mut pat = Pattern::new();
        for (ch, code) in [0x1u8, 0x4, 0xB, 0xD].into_iter().enumerate() {
            *pat.cell_mut(0, ch) = cell(0, 0, code, 0x12);
        }
        let mut seq = running(test_song(vec![pat], vec![0, 0]));
        assert!(next_row(&mut seq).is_empty());
        assert_eq!(seq.song_position(), 0);
        assert_eq!(seq.row_position(), 1);
    }

    #[test]
    fn volume_slide_down_clamps_and_stops() {
        let mut pat = Pattern::new();
        // Instrument at volume 1.0, slide down 0x20/64 = 0.5 per tick
        *pat.cell_mut(0, 0) = cell(1, 0, 0xA, 0x20);
        let mut seq = running(test_song(vec![pat], vec![0]));
        next_row(&mut seq);
        assert_eq!(seq.channel(0).volume_slide, -0.5);

        let mut out = Vec::new();
        seq.tick(&mut out);
        assert_eq!(seq.channel(0).volume, 0.5);
        seq.tick(&mut out);
        assert_eq!(seq.channel(0).volume, 0.0);
        assert_eq!(seq.channel(0).volume_slide, -0.5);
        // Crossing below zero clamps and clears on the same tick
        seq.tick(&mut out);
        assert_eq!(seq.channel(0).volume, 0.0);
        assert_eq!(seq.channel(0).volume_slide, 0.0);

        out.clear();
        for _ in 0..3 {
            seq.tick(&mut out);
        }
        assert!(out.is_empty(), "slide kept emitting: {out:?}");
    }

    #[test]
    fn volume_slide_up_clamps_and_stops() {
        let mut pat = Pattern::new();
        *pat.cell_mut(0, 0) = cell(2, 0, 0xA, 0xF0);
        let mut seq = running(test_song(vec![pat], vec![0]));
        next_row(&mut seq);
        assert_eq!(seq.channel(0).volume, 0.5);
        assert_eq!(seq.channel(0).volume_slide, 15.0 / 64.0);

        let mut out = Vec::new();
        let mut volumes = Vec::new();
        for _ in 0..4 {
            seq.tick(&mut out);
            volumes.push(seq.channel(0).volume);
        }
        assert_eq!(volumes[..2], [0.5 + 15.0 / 64.0, 0.5 + 30.0 / 64.0]);
        assert_eq!(volumes[2..], [1.0, 1.0]);
        assert_eq!(seq.channel(0).volume_slide, 0.0);
    }

    #[test]
    fn song_loops_after_full_play_order() {
        let order = vec![1, 0, 1];
        let mut seq = running(test_song(vec![Pattern::new(), Pattern::new()], order.clone()));
        assert_eq!(seq.position().pattern_index, 1);

        let mut out = Vec::new();
        let mut rows = 0;
        let mut positions = Vec::new();
        while rows < 64 * order.len() {
            if seq.tick(&mut out) {
                rows += 1;
                if seq.row_position() == 0 {
                    positions.push(seq.song_position());
                }
            }
        }
        assert_eq!(positions, vec![1, 2, 0]);
        assert_eq!(seq.song_position(), 0);
        assert_eq!(seq.row_position(), 0);
    }

    #[test]
    fn missing_pattern_plays_as_empty() {
        let mut seq = running(test_song(vec![Pattern::new()], vec![5, 0]));
        assert!(next_row(&mut seq).is_empty());
        assert_eq!(seq.row_position(), 1);
    }

    #[test]
    fn restart_resets_runtime_state() {
        let mut pat = Pattern::new();
        *pat.cell_mut(0, 0) = cell(1, 0, 0xF, 2);
        let mut seq = running(test_song(vec![pat], vec![0]));
        next_row(&mut seq);
        seq.stop();
        assert!(!seq.is_running());

        seq.start();
        assert_eq!(seq.ticks_per_row(), DEFAULT_TICKS_PER_ROW);
        assert_eq!(seq.row_position(), 0);
        assert_eq!(seq.tick_counter(), 0);
        assert_eq!(*seq.channel(0), ChannelControl::default());
    }

    #[test]
    fn position_packing() {
        let pos = PlaybackPosition { song_position: 127, pattern_index: 200, row: 63 };
        assert_eq!(PlaybackPosition::unpack(pos.pack()), pos);
    }
}
