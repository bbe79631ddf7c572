//! Effect command table.
//!
//! Cells store the raw command code and parameter byte. [`Effect`] is the
//! decoded view used for dispatch and reporting. Only
//! [`Effect::is_supported`] commands change playback; the rest are
//! recognized and ignored.

/// Effect column command, decoded from code + parameter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Effect {
    /// Code 0 with parameter 0
    #[default]
    None,
    /// 0xy: cycle note, note+x, note+y
    Arpeggio { x: u8, y: u8 },
    /// 1xx
    PortaUp(u8),
    /// 2xx
    PortaDown(u8),
    /// 3xx
    TonePorta(u8),
    /// 4xy
    Vibrato { speed: u8, depth: u8 },
    /// 5xy
    TonePortaVolSlide(u8),
    /// 6xy
    VibratoVolSlide(u8),
    /// 7xy
    Tremolo { speed: u8, depth: u8 },
    /// 8xx
    SetPan(u8),
    /// 9xx: offset in 256-frame units
    SampleOffset(u8),
    /// Axy: x = up speed, y = down speed
    VolumeSlide(u8),
    /// Bxx
    PositionJump(u8),
    /// Cxx: volume 00-40
    SetVolume(u8),
    /// Dxx
    PatternBreak(u8),
    /// Exy: extended command x with value y
    Extended { command: u8, value: u8 },
    /// Fxx: ticks per row
    SetSpeed(u8),
}

impl Effect {
    /// Decode a command code (low nibble only) and parameter.
    pub const fn from_code(code: u8, param: u8) -> Self {
        match code & 0x0F {
            0x0 if param == 0 => Effect::None,
            0x0 => Effect::Arpeggio { x: param >> 4, y: param & 0x0F },
            0x1 => Effect::PortaUp(param),
            0x2 => Effect::PortaDown(param),
            0x3 => Effect::TonePorta(param),
            0x4 => Effect::Vibrato { speed: param >> 4, depth: param & 0x0F },
            0x5 => Effect::TonePortaVolSlide(param),
            0x6 => Effect::VibratoVolSlide(param),
            0x7 => Effect::Tremolo { speed: param >> 4, depth: param & 0x0F },
            0x8 => Effect::SetPan(param),
            0x9 => Effect::SampleOffset(param),
            0xA => Effect::VolumeSlide(param),
            0xB => Effect::PositionJump(param),
            0xC => Effect::SetVolume(param),
            0xD => Effect::PatternBreak(param),
            0xE => Effect::Extended { command: param >> 4, value: param & 0x0F },
            _ => Effect::SetSpeed(param),
        }
    }

    /// Returns the variant name as a static string (ignoring parameters).
    pub fn name(&self) -> &'static str {
        match self {
            Effect::None => "None",
            Effect::Arpeggio { .. } => "Arpeggio",
            Effect::PortaUp(_) => "PortaUp",
            Effect::PortaDown(_) => "PortaDown",
            Effect::TonePorta(_) => "TonePorta",
            Effect::Vibrato { .. } => "Vibrato",
            Effect::TonePortaVolSlide(_) => "TonePortaVolSlide",
            Effect::VibratoVolSlide(_) => "VibratoVolSlide",
            Effect::Tremolo { .. } => "Tremolo",
            Effect::SetPan(_) => "SetPan",
            Effect::SampleOffset(_) => "SampleOffset",
            Effect::VolumeSlide(_) => "VolumeSlide",
            Effect::PositionJump(_) => "PositionJump",
            Effect::SetVolume(_) => "SetVolume",
            Effect::PatternBreak(_) => "PatternBreak",
            Effect::Extended { .. } => "Extended",
            Effect::SetSpeed(_) => "SetSpeed",
        }
    }

    /// Returns true for the commands the sequencer executes (A, C, F).
    pub fn is_supported(&self) -> bool {
        matches!(
            self,
            Effect::VolumeSlide(_) | Effect::SetVolume(_) | Effect::SetSpeed(_)
        )
    }
}
