//! Integration test: decode module bytes → play → verify rendered frames.

mod common;

use common::{ModImage, Sample};
use pt_engine::{ChannelFrame, PlaybackConfig, PlaybackEngine, PlaybackPosition};
use pt_master::Controller;

const RATE: u32 = 48_000;
const FRAMES_PER_TICK: usize = 960;
const FIRST_ROW_FRAMES: usize = FRAMES_PER_TICK * 6;

fn start(image: &ModImage) -> PlaybackEngine {
    let song = pt_formats::decode(&image.build()).unwrap();
    PlaybackEngine::start(song, PlaybackConfig::with_sample_rate(RATE))
}

fn dc_song() -> ModImage {
    let mut image = ModImage::new("dc");
    image.samples.push(Sample::dc(64, 256));
    image
}

fn channel(frames: &[ChannelFrame], ch: usize) -> Vec<f32> {
    frames.iter().map(|f| f.samples[ch]).collect()
}

#[test]
fn silent_until_first_row_then_plays() {
    let mut engine = start(&dc_song().note(0, 0, 0, 1, 428));

    let lead_in = engine.render_frames(FIRST_ROW_FRAMES);
    assert!(lead_in.iter().all(ChannelFrame::is_silent));

    let frames = engine.render_frames(FRAMES_PER_TICK);
    assert!(channel(&frames, 0).iter().all(|&s| s == 0.5));
    for ch in 1..4 {
        assert!(channel(&frames, ch).iter().all(|&s| s == 0.0), "channel {ch} not silent");
    }
}

#[test]
fn stereo_mix_uses_amiga_panning() {
    let mut engine = start(&dc_song().note(0, 0, 1, 1, 428).note(0, 0, 3, 1, 428));
    engine.render_frames(FIRST_ROW_FRAMES);
    let stereo = engine.render_frame().mix(0.1);
    approx::assert_relative_eq!(stereo.left, 0.05);
    approx::assert_relative_eq!(stereo.right, 0.05);

    let mut engine = start(&dc_song().note(0, 0, 2, 1, 428));
    engine.render_frames(FIRST_ROW_FRAMES);
    let stereo = engine.render_frame().mix(1.0);
    assert_eq!(stereo.left, 0.0);
    assert_eq!(stereo.right, 0.5);
}

#[test]
fn one_second_covers_eight_rows() {
    let mut engine = start(&dc_song());
    engine.render_frames(RATE as usize);
    // 50 ticks: rows processed at ticks 6, 12, ..., 48
    assert_eq!(engine.position().row, 8);
}

#[test]
fn speed_command_changes_row_rate() {
    let mut engine = start(&dc_song().effect(0, 0, 0, 0xF, 2));
    engine.render_frames(RATE as usize);
    // Row 0 at tick 6, then every 2 ticks through tick 50
    assert_eq!(engine.position().row, 23);
    assert_eq!(engine.sequencer().ticks_per_row(), 2);
}

#[test]
fn set_volume_scales_output() {
    let image = dc_song().note(0, 0, 0, 1, 428).effect(0, 0, 0, 0xC, 0x20);
    let mut engine = start(&image);
    engine.render_frames(FIRST_ROW_FRAMES);
    assert_eq!(engine.render_frame().samples[0], 0.25);
}

#[test]
fn volume_slide_fades_to_silence() {
    let image = dc_song().note(0, 0, 0, 1, 428).effect(0, 0, 0, 0xA, 0x04);
    let mut engine = start(&image);
    engine.render_frames(FIRST_ROW_FRAMES);

    let first_tick = channel(&engine.render_frames(FRAMES_PER_TICK), 0);
    assert!(first_tick.iter().all(|&s| s == 0.5));

    // 4/64 per tick empties a full-volume channel in 16 ticks
    let fade = channel(&engine.render_frames(FRAMES_PER_TICK * 16), 0);
    let tick_levels: Vec<f32> = fade.chunks(FRAMES_PER_TICK).map(|t| t[0]).collect();
    assert!(tick_levels.windows(2).all(|w| w[1] < w[0]), "{tick_levels:?}");

    let after = engine.render_frames(FRAMES_PER_TICK * 4);
    assert!(after.iter().all(ChannelFrame::is_silent));
    assert_eq!(engine.sequencer().channel(0).volume_slide, 0.0);
}

#[test]
fn one_shot_sample_goes_silent() {
    let mut image = ModImage::new("shot");
    image.samples.push(Sample::ramp(64));
    let mut engine = start(&image.note(0, 0, 0, 1, 428));
    engine.render_frames(FIRST_ROW_FRAMES);

    let frames = channel(&engine.render_frames(FRAMES_PER_TICK), 0);
    assert!(frames.iter().any(|&s| s > 0.0));
    assert!(frames[FRAMES_PER_TICK / 2..].iter().all(|&s| s == 0.0));
    assert!(engine.voice(0).is_wrapped_around());
}

#[test]
fn retrigger_same_instrument_keeps_position() {
    let mut image = ModImage::new("long");
    image.samples.push(Sample::dc(64, 4096));
    let mut engine = start(&image.note(0, 0, 0, 1, 428).note(0, 1, 0, 1, 0));
    engine.render_frames(FIRST_ROW_FRAMES + FRAMES_PER_TICK * 6);
    assert_eq!(engine.position().row, 2);
    assert!(engine.voice(0).position() > 100.0);
}

#[test]
fn negative_finetune_plays_faster() {
    let render = |finetune: u8| {
        let mut image = ModImage::new("fine");
        let mut sample = Sample::dc(64, 4096);
        sample.finetune = finetune;
        image.samples.push(sample);
        let mut engine = start(&image.note(0, 0, 0, 1, 428));
        engine.render_frames(FIRST_ROW_FRAMES + FRAMES_PER_TICK);
        engine.voice(0).position()
    };
    let neutral = render(0);
    let minus = render(0x8);
    let plus = render(0x7);
    assert!(minus > neutral, "finetune -8: {minus} <= {neutral}");
    assert!(plus < neutral, "finetune +7: {plus} >= {neutral}");
}

#[test]
fn dangling_sample_number_is_ignored() {
    let mut engine = start(&dc_song().note(0, 0, 0, 20, 428));
    engine.render_frames(FIRST_ROW_FRAMES + FRAMES_PER_TICK);
    assert_eq!(engine.voice(0).instrument(), None);
    assert!(engine.render_frame().is_silent());
}

#[test]
fn song_loops_over_play_order() {
    let mut image = dc_song();
    image.order = vec![0, 1, 0];
    let mut engine = start(&image);
    assert_eq!(engine.song().patterns.len(), 2);

    for _ in 0..6 * 64 * 3 {
        engine.tick();
    }
    assert_eq!(engine.position(), PlaybackPosition::default());
}

#[test]
fn controller_renders_wav() {
    let data = dc_song().note(0, 0, 0, 1, 428).build();
    let mut ctl = Controller::new(PlaybackConfig::with_sample_rate(8_000));
    assert!(ctl.load_mod(&data).unwrap().is_empty());
    assert_eq!(ctl.song().name.as_str(), "dc");

    let frames = ctl.render_frames(1.0);
    assert_eq!(frames.len(), 8_000);
    assert!(frames.iter().any(|f| f.left != 0.0));
    assert!(frames.iter().all(|f| f.right == 0.0));

    let wav = ctl.render_to_wav(1.0).unwrap();
    assert_eq!(&wav[..4], b"RIFF");
    assert!(wav.len() >= 8_000 * 4);

    let path = std::env::temp_dir().join(format!("ptplayer-test-{}.wav", std::process::id()));
    assert_eq!(ctl.export_wav(&path, 0.5).unwrap(), 4_000);
    let written = std::fs::metadata(&path).unwrap().len();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(written, wav.len() as u64 - 4_000 * 4);
}
