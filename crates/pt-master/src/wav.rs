//! WAV encoding for 16-bit stereo PCM.

use hound::{SampleFormat, WavSpec, WavWriter};
use pt_engine::StereoFrame;
use std::io::{Cursor, Seek, Write};
use std::path::Path;

fn wav_spec(sample_rate: u32) -> WavSpec {
    WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

/// Encode frames into any seekable writer.
pub fn write_wav<W: Write + Seek>(w: W, frames: &[StereoFrame], sample_rate: u32) -> Result<(), hound::Error> {
    let mut writer = WavWriter::new(w, wav_spec(sample_rate))?;
    let mut samples = writer.get_i16_writer(frames.len() as u32 * 2);
    for frame in frames {
        let (left, right) = frame.to_pcm16();
        samples.write_sample(left);
        samples.write_sample(right);
    }
    samples.flush()?;
    writer.finalize()
}

/// Encode frames into an in-memory WAV file.
pub fn frames_to_wav(frames: &[StereoFrame], sample_rate: u32) -> Result<Vec<u8>, hound::Error> {
    let mut buf = Cursor::new(Vec::new());
    write_wav(&mut buf, frames, sample_rate)?;
    Ok(buf.into_inner())
}

/// Encode frames into a file on disk.
pub fn write_wav_file(path: &Path, frames: &[StereoFrame], sample_rate: u32) -> Result<(), hound::Error> {
    let mut writer = WavWriter::create(path, wav_spec(sample_rate))?;
    for frame in frames {
        let (left, right) = frame.to_pcm16();
        writer.write_sample(left)?;
        writer.write_sample(right)?;
    }
    writer.finalize()
}
