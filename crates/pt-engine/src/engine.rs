//! Playback engine: sequencer plus voices, driven by the output clock.

use std::sync::Arc;

use pt_ir::{Song, CHANNELS};

use crate::command::{command_queue, CommandConsumer, CommandProducer, CommandSink, VoiceCommand, DEFAULT_QUEUE_CAPACITY};
use crate::config::PlaybackConfig;
use crate::frame::ChannelFrame;
use crate::sequencer::{PlaybackPosition, Sequencer};
use crate::voice::ChannelVoice;

/// The four channel voices of a song, addressable by command.
pub struct VoiceBank {
    song: Arc<Song>,
    voices: [ChannelVoice; CHANNELS],
}

impl VoiceBank {
    pub fn new(song: Arc<Song>, rate_constant: f64) -> Self {
        Self {
            song,
            voices: core::array::from_fn(|_| ChannelVoice::new(rate_constant)),
        }
    }

    pub fn voice(&self, channel: usize) -> &ChannelVoice {
        &self.voices[channel]
    }

    /// Silence all voices and forget their instruments.
    pub fn reset(&mut self) {
        for voice in &mut self.voices {
            voice.reset();
        }
    }

    /// Produce one sample per channel and advance every voice.
    pub fn render_frame(&mut self) -> ChannelFrame {
        let mut frame = ChannelFrame::silence();
        for (out, voice) in frame.samples.iter_mut().zip(self.voices.iter_mut()) {
            *out = voice.next_sample(&self.song);
        }
        frame
    }
}

impl CommandSink for VoiceBank {
    fn send(&mut self, command: VoiceCommand) {
        // Commands for channels past the fourth are dropped
        if let Some(voice) = self.voices.get_mut(command.channel as usize) {
            voice.apply(command.kind, &self.song);
        }
    }
}

/// Single-threaded player: ticks the sequencer every `samples_per_tick`
/// rendered frames and applies its commands straight to the voices.
pub struct PlaybackEngine {
    config: PlaybackConfig,
    sequencer: Sequencer,
    voices: VoiceBank,
    /// Frames per sequencer tick at the configured rate
    samples_per_tick: u32,
    /// Frames rendered since the last tick
    sample_counter: u32,
}

impl PlaybackEngine {
    /// Create an engine for a song and start the sequencer.
    pub fn start(song: impl Into<Arc<Song>>, config: PlaybackConfig) -> Self {
        let song = song.into();
        let mut sequencer = Sequencer::new(Arc::clone(&song));
        sequencer.start();
        tracing::debug!(
            song = %song.name,
            sample_rate = config.sample_rate,
            samples_per_tick = config.samples_per_tick(),
            "playback engine started"
        );
        Self {
            voices: VoiceBank::new(song, config.effective_rate_constant()),
            samples_per_tick: config.samples_per_tick(),
            sample_counter: 0,
            sequencer,
            config,
        }
    }

    /// Rewind to the top of the song.
    pub fn restart(&mut self) {
        self.sequencer.start();
        self.voices.reset();
        self.sample_counter = 0;
    }

    /// Run one sequencer tick immediately. Returns true if a row was
    /// processed.
    pub fn tick(&mut self) -> bool {
        self.sequencer.tick(&mut self.voices)
    }

    /// Render one frame, ticking the sequencer once every
    /// `samples_per_tick` frames.
    pub fn render_frame(&mut self) -> ChannelFrame {
        let frame = self.voices.render_frame();
        self.sample_counter += 1;
        if self.sample_counter >= self.samples_per_tick {
            self.sample_counter = 0;
            self.tick();
        }
        frame
    }

    /// Fill a caller-provided block. Does not allocate.
    pub fn render_block(&mut self, out: &mut [ChannelFrame]) {
        for frame in out.iter_mut() {
            *frame = self.render_frame();
        }
    }

    /// Render `count` frames into a new buffer.
    pub fn render_frames(&mut self, count: usize) -> Vec<ChannelFrame> {
        let mut frames = vec![ChannelFrame::silence(); count];
        self.render_block(&mut frames);
        frames
    }

    pub fn position(&self) -> PlaybackPosition {
        self.sequencer.position()
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    pub fn voice(&self, channel: usize) -> &ChannelVoice {
        self.voices.voice(channel)
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn song(&self) -> &Arc<Song> {
        self.sequencer.song()
    }

    /// Split into a tick half for a timer thread and a render half for the
    /// audio callback, joined by a lock-free command queue.
    pub fn split(self) -> (TickDriver, VoiceRenderer) {
        let (producer, consumer) = command_queue(DEFAULT_QUEUE_CAPACITY);
        (
            TickDriver {
                sequencer: self.sequencer,
                producer,
            },
            VoiceRenderer {
                voices: self.voices,
                consumer,
            },
        )
    }
}

/// Sequencer half of a split engine.
pub struct TickDriver {
    sequencer: Sequencer,
    producer: CommandProducer,
}

impl TickDriver {
    pub fn tick(&mut self) -> bool {
        self.sequencer.tick(&mut self.producer)
    }

    pub fn position(&self) -> PlaybackPosition {
        self.sequencer.position()
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    /// Commands lost to a full queue so far.
    pub fn dropped(&self) -> u64 {
        self.producer.dropped()
    }
}

/// Voice half of a split engine. Safe to run in a real-time callback.
pub struct VoiceRenderer {
    voices: VoiceBank,
    consumer: CommandConsumer,
}

impl VoiceRenderer {
    /// Apply every queued command. Call once at the start of each block.
    pub fn begin_block(&mut self) -> usize {
        let mut applied = 0;
        while let Some(command) = self.consumer.pop() {
            self.voices.send(command);
            applied += 1;
        }
        applied
    }

    pub fn render_frame(&mut self) -> ChannelFrame {
        self.voices.render_frame()
    }

    /// Drain pending commands, then fill the block.
    pub fn render_block(&mut self, out: &mut [ChannelFrame]) {
        self.begin_block();
        for frame in out.iter_mut() {
            *frame = self.voices.render_frame();
        }
    }

    pub fn voice(&self, channel: usize) -> &ChannelVoice {
        self.voices.voice(channel)
    }
}
