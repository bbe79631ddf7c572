//! Sequencer-to-voice commands and the queue that carries them across
//! threads.

use pt_ir::InstrumentId;
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

/// A state update for one channel voice.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CommandKind {
    /// Switch instrument (no-op if already active)
    AssignInstrument(InstrumentId),
    /// Set the finetuned playback period
    SetPeriod(f32),
    /// Set the channel gain (0.0..=1.0)
    SetVolume(f32),
}

/// A command addressed to a channel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoiceCommand {
    pub channel: u8,
    pub kind: CommandKind,
}

impl VoiceCommand {
    pub const fn new(channel: u8, kind: CommandKind) -> Self {
        Self { channel, kind }
    }
}

/// Receiver of sequencer output.
pub trait CommandSink {
    fn send(&mut self, command: VoiceCommand);
}

impl CommandSink for Vec<VoiceCommand> {
    fn send(&mut self, command: VoiceCommand) {
        self.push(command);
    }
}

/// Commands the sequencer can emit in one tick, with room for a few
/// ticks of backlog.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Create a single-producer, single-consumer command queue.
pub fn command_queue(capacity: usize) -> (CommandProducer, CommandConsumer) {
    let (producer, consumer) = HeapRb::<VoiceCommand>::new(capacity.max(1)).split();
    (
        CommandProducer { inner: producer, dropped: 0 },
        CommandConsumer { inner: consumer },
    )
}

/// Sending half, owned by the tick thread.
pub struct CommandProducer {
    inner: HeapProd<VoiceCommand>,
    dropped: u64,
}

impl CommandProducer {
    /// Commands discarded because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Commands waiting to be drained.
    pub fn pending(&self) -> usize {
        self.inner.occupied_len()
    }
}

impl CommandSink for CommandProducer {
    fn send(&mut self, command: VoiceCommand) {
        if self.inner.try_push(command).is_err() {
            self.dropped += 1;
            tracing::warn!(channel = command.channel, dropped = self.dropped, "voice command queue full");
        }
    }
}

/// Receiving half, owned by the audio callback. Never blocks.
pub struct CommandConsumer {
    inner: HeapCons<VoiceCommand>,
}

impl CommandConsumer {
    pub fn pop(&mut self) -> Option<VoiceCommand> {
        self.inner.try_pop()
    }
}
