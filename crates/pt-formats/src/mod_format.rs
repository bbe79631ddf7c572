//! 31-instrument, 4-channel module decoder.
//!
//! Layout (big-endian):
//!
//! ```text
//! 0      20    song name
//! 20     930   31 instrument headers, 30 bytes each
//! 950    1     song length
//! 951    1     reserved
//! 952    128   play order table
//! 1080   4     format marker
//! 1084   ..    patterns (1024 bytes each), then sample payloads
//! ```

use arrayvec::ArrayString;
use binrw::io::Cursor;
use binrw::BinRead;
use pt_ir::{
    finetune_from_nibble, Cell, Instrument, Pattern, Song, CHANNELS, MAX_INSTRUMENTS,
    MAX_PLAY_ORDER, ROWS_PER_PATTERN,
};

use crate::cursor::ByteCursor;
use crate::{DecodeWarning, FormatError};

/// Size of one instrument header record.
pub const INSTRUMENT_HEADER_SIZE: usize = 30;

/// Bytes before the pattern table.
pub const HEADER_SIZE: usize = 20 + MAX_INSTRUMENTS * INSTRUMENT_HEADER_SIZE + 2 + MAX_PLAY_ORDER + 4;

/// Size of one pattern: 64 rows x 4 channels x 4 bytes.
pub const PATTERN_SIZE: usize = ROWS_PER_PATTERN * CHANNELS * 4;

/// A decoded song plus any non-fatal irregularities found on the way.
#[derive(Debug, Clone)]
pub struct Decoded {
    pub song: Song,
    pub warnings: Vec<DecodeWarning>,
}

/// Instrument header as stored. Lengths are in 16-bit words.
#[derive(BinRead, Debug, Clone, Copy)]
#[br(big)]
struct InstrumentHeader {
    name: [u8; 22],
    length_words: u16,
    finetune: u8,
    volume: u8,
    loop_start_words: u16,
    loop_length_words: u16,
}

impl InstrumentHeader {
    fn into_instrument(self) -> Instrument {
        Instrument {
            name: ascii_string(&self.name),
            sample_length: self.length_words as u32 * 2,
            finetune: finetune_from_nibble(self.finetune),
            default_volume: self.volume,
            loop_start: self.loop_start_words as u32 * 2,
            loop_length: self.loop_length_words as u32 * 2,
            sample_data: Vec::new(),
        }
    }
}

/// Decode a module from bytes.
pub fn decode(data: &[u8]) -> Result<Song, FormatError> {
    decode_with_warnings(data).map(|decoded| decoded.song)
}

/// Decode a module from bytes, also returning non-fatal warnings.
pub fn decode_with_warnings(data: &[u8]) -> Result<Decoded, FormatError> {
    if data.len() < HEADER_SIZE {
        return Err(FormatError::TooShort {
            needed: HEADER_SIZE,
            actual: data.len(),
        });
    }

    let mut warnings = Vec::new();
    let mut cursor = ByteCursor::new(data);

    let mut song = Song::new("");
    song.name = ascii_string(cursor.read_bytes(20)?);

    for _ in 0..MAX_INSTRUMENTS {
        let header = read_instrument_header(&mut cursor)?;
        song.instruments.push(header.into_instrument());
    }

    let song_length = cursor.read_u8()?;
    let _reserved = cursor.read_u8()?;
    let order_table: [u8; MAX_PLAY_ORDER] = cursor.read_array()?;
    song.format_tag = ascii_string(&cursor.read_array::<4>()?);

    let used = (song_length as usize).clamp(1, MAX_PLAY_ORDER);
    if used != song_length as usize {
        warnings.push(DecodeWarning::SongLengthClamped { stored: song_length, used });
    }
    song.play_order = order_table[..used].to_vec();

    // The pattern count comes from the whole table, not just the played part
    let pattern_count = order_table.iter().copied().max().unwrap_or(0) as usize + 1;
    let needed = HEADER_SIZE + pattern_count * PATTERN_SIZE;
    if data.len() < needed {
        return Err(FormatError::TruncatedPatterns {
            patterns: pattern_count,
            needed,
            actual: data.len(),
        });
    }

    for _ in 0..pattern_count {
        song.patterns.push(read_pattern(&mut cursor)?);
    }

    for (i, inst) in song.instruments.iter_mut().enumerate() {
        if let Some(warning) = read_sample_data(&mut cursor, i, inst) {
            tracing::warn!("{}", warning);
            warnings.push(warning);
        }
    }

    tracing::debug!(
        name = song.name.as_str(),
        marker = song.format_tag.as_str(),
        patterns = song.patterns.len(),
        orders = song.play_order.len(),
        trailing = cursor.remaining(),
        "decoded module"
    );

    Ok(Decoded { song, warnings })
}

fn read_instrument_header(cursor: &mut ByteCursor<'_>) -> Result<InstrumentHeader, FormatError> {
    let record = cursor.read_bytes(INSTRUMENT_HEADER_SIZE)?;
    InstrumentHeader::read_be(&mut Cursor::new(record)).map_err(|e| FormatError::Io(e.to_string()))
}

fn read_pattern(cursor: &mut ByteCursor<'_>) -> Result<Pattern, FormatError> {
    let mut pattern = Pattern::new();
    for row in 0..ROWS_PER_PATTERN {
        for ch in 0..CHANNELS {
            *pattern.cell_mut(row, ch) = Cell::from_bytes(cursor.read_array()?);
        }
    }
    Ok(pattern)
}

/// Fill an instrument's sample buffer, zero-padding a truncated payload.
fn read_sample_data(
    cursor: &mut ByteCursor<'_>,
    index: usize,
    inst: &mut Instrument,
) -> Option<DecodeWarning> {
    let declared = inst.sample_length as usize;
    let bytes = cursor.read_up_to(declared);

    inst.sample_data = Vec::with_capacity(declared);
    inst.sample_data
        .extend(bytes.iter().map(|&b| normalize_sample(b as i8)));
    inst.sample_data.resize(declared, 0.0);

    (bytes.len() < declared).then(|| DecodeWarning::TruncatedSampleData {
        instrument: index,
        declared: inst.sample_length,
        available: bytes.len() as u32,
    })
}

/// Signed 8-bit sample to amplitude in [-1.0, 1.0).
pub(crate) fn normalize_sample(raw: i8) -> f32 {
    raw as f32 / 128.0
}

/// Decode a fixed-width ASCII field, stopping at the first NUL and
/// trimming trailing spaces. Non-ASCII bytes become `?`.
fn ascii_string<const N: usize>(bytes: &[u8]) -> ArrayString<N> {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let mut out = ArrayString::new();
    for &b in &bytes[..end.min(N)] {
        let c = if b.is_ascii() && !b.is_ascii_control() { b as char } else { '?' };
        out.push(c);
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}
