//! ptplayer CLI: inspect, play, or render a module to WAV.
//!
//! Usage:
//!   pt-cli path/to/file.mod --info
//!   pt-cli path/to/file.mod --seconds 30
//!   pt-cli path/to/file.mod --wav output.wav --sample-rate 44100

use anyhow::{bail, Context, Result};
use clap::Parser;
use pt_master::{Controller, PlaybackConfig, Song, MAX_RENDER_SECONDS};
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[cfg(feature = "alloc_check")]
#[global_allocator]
static A: assert_no_alloc::AllocDisabler = assert_no_alloc::AllocDisabler;

/// Default length of a WAV render when `--seconds` is not given.
const DEFAULT_RENDER_SECONDS: f32 = 60.0;

#[derive(Parser, Debug)]
#[command(name = "pt-cli", version, about = "Play or render 4-channel tracker modules")]
struct Args {
    /// Module file to load
    file: PathBuf,

    /// Render offline to this WAV file instead of playing
    #[arg(long, value_name = "OUT")]
    wav: Option<PathBuf>,

    /// Playback or render length in seconds (live playback runs until
    /// interrupted when omitted)
    #[arg(long, value_name = "N")]
    seconds: Option<f32>,

    /// Output sample rate for WAV rendering
    #[arg(long, value_name = "HZ", default_value_t = 48_000)]
    sample_rate: u32,

    /// Master gain applied when mixing to stereo
    #[arg(long, value_name = "G", default_value_t = 0.1)]
    gain: f32,

    /// Print song details and exit
    #[arg(long)]
    info: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if args.sample_rate == 0 {
        bail!("sample rate must be positive");
    }
    if let Some(seconds) = args.seconds {
        check_seconds(seconds)?;
    }

    let config = PlaybackConfig {
        master_gain: args.gain,
        ..PlaybackConfig::with_sample_rate(args.sample_rate)
    };
    let mut ctrl = Controller::new(config);
    let warnings = ctrl
        .load_file(&args.file)
        .with_context(|| format!("could not load {}", args.file.display()))?;
    for warning in &warnings {
        tracing::warn!(%warning, "module decoded with irregularities");
    }

    print_summary(ctrl.song());
    if args.info {
        print_details(ctrl.song());
        return Ok(());
    }

    match args.wav {
        Some(path) => {
            let seconds = args.seconds.unwrap_or(DEFAULT_RENDER_SECONDS);
            println!("Rendering {seconds} s to {} at {} Hz...", path.display(), args.sample_rate);
            let frames = ctrl
                .export_wav(&path, seconds)
                .with_context(|| format!("could not write {}", path.display()))?;
            println!("Wrote {frames} frames.");
        }
        None => play(&mut ctrl, args.seconds)?,
    }
    Ok(())
}

/// Reject durations that are negative, non-finite, or longer than a
/// controller render may run.
fn check_seconds(seconds: f32) -> Result<()> {
    if !seconds.is_finite() || !(0.0..=MAX_RENDER_SECONDS).contains(&seconds) {
        bail!("--seconds must be between 0 and {MAX_RENDER_SECONDS}, got {seconds}");
    }
    Ok(())
}

fn print_summary(song: &Song) {
    println!("Title:    {}", song.name);
    println!("Format:   {}", song.format_tag);
    println!("Patterns: {}", song.patterns.len());
    println!("Orders:   {}", song.play_order.len());
    let with_data = song.instruments.iter().filter(|i| !i.is_empty()).count();
    println!("Samples:  {with_data} (with data)");
    println!();
}

fn print_details(song: &Song) {
    let order: Vec<String> = song.play_order.iter().map(|p| format!("{p:02X}")).collect();
    println!("Order:    {}", order.join(" "));
    println!();
    println!(" #  Name                    Length  Fine  Vol  Loop");
    for (i, inst) in song.instruments.iter().enumerate() {
        if inst.is_empty() && inst.name.is_empty() {
            continue;
        }
        let looping = if inst.has_loop() {
            format!("{}+{}", inst.loop_start, inst.loop_length)
        } else {
            "-".to_string()
        };
        println!(
            "{:2}  {:<22}  {:>6}  {:>4}  {:>3}  {}",
            i + 1,
            inst.name,
            inst.sample_length,
            inst.finetune,
            inst.default_volume,
            looping
        );
    }
    println!();
    print!("{}", pt_ir::analyze(song));
}

fn play(ctrl: &mut Controller, seconds: Option<f32>) -> Result<()> {
    ctrl.play().context("could not start audio playback")?;
    println!("Playing... (Ctrl-C to quit)");

    let deadline = seconds.map(|s| Instant::now() + Duration::from_secs_f32(s));
    while ctrl.is_playing() {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            break;
        }
        if let Some(pos) = ctrl.position() {
            print!(
                "\rOrd: {:02X} | Pat: {:02X} | Row: {:02X}",
                pos.song_position, pos.pattern_index, pos.row
            );
            let _ = std::io::stdout().flush();
        }
        std::thread::sleep(Duration::from_millis(10));
    }

    ctrl.stop();
    println!("\rDone.                          ");
    Ok(())
}
