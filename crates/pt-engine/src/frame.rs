//! Audio frame types.

use pt_ir::CHANNELS;

/// One output sample per channel, channel volume already applied.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ChannelFrame {
    pub samples: [f32; CHANNELS],
}

impl ChannelFrame {
    /// Create a silent frame.
    pub const fn silence() -> Self {
        Self { samples: [0.0; CHANNELS] }
    }

    pub fn is_silent(&self) -> bool {
        self.samples.iter().all(|&s| s == 0.0)
    }

    /// Mix to stereo with Amiga hard panning: channels 0 and 3 left,
    /// 1 and 2 right.
    pub fn mix(&self, gain: f32) -> StereoFrame {
        let [a, b, c, d] = self.samples;
        StereoFrame {
            left: (a + d) * gain,
            right: (b + c) * gain,
        }
    }
}

/// A stereo frame in [-1.0, 1.0].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StereoFrame {
    pub left: f32,
    pub right: f32,
}

impl StereoFrame {
    pub const fn silence() -> Self {
        Self { left: 0.0, right: 0.0 }
    }

    /// Convert to clamped 16-bit PCM.
    pub fn to_pcm16(self) -> (i16, i16) {
        let conv = |v: f32| (v * 32768.0).clamp(-32768.0, 32767.0) as i16;
        (conv(self.left), conv(self.right))
    }
}
