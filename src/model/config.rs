use anyhow::bail;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_TICKS_PER_SECOND: f64 = 200.0;
pub const DEFAULT_TEMPO_MULTIPLIER: f64 = 1.0;
pub const DEFAULT_FRAME_RATE: f64 = 60.0;

#[derive(Parser, Debug)]
#[command(
    name = "siano",
    about = "Play along a MIDI file: playback waits on every chord until you play it!"
)]
pub struct Args {
    /// Path to the MIDI file to practice.
    #[arg(required_unless_present = "library")]
    pub midi: Option<PathBuf>,

    /// How many MIDI ticks the playhead advances per second.
    #[arg(
        long = "ticks-per-second",
        default_value_t = DEFAULT_TICKS_PER_SECOND,
        value_parser = parse_rate
    )]
    pub ticks_per_second: f64,

    /// How many clock frames are fed to the engine per second.
    #[arg(
        long = "frame-rate",
        default_value_t = DEFAULT_FRAME_RATE,
        value_parser = parse_rate
    )]
    pub frame_rate: f64,

    /// Dry run (print the first dry_run_max chord groups and exit).
    #[arg(short, long, default_value_t = false)]
    pub dry_run: bool,

    /// Maximum chord groups to print in dry run.
    #[arg(long, default_value_t = 80)]
    pub dry_run_max: usize,

    /// Prints extra information to the terminal.
    #[arg(short, long)]
    pub verbose: bool,

    /// List the MIDI files found in this directory and exit.
    #[arg(short, long)]
    pub library: Option<PathBuf>,
}

/// Tick conversion settings for the sync engine.
///
/// The engine advances at a fixed rate and never reads tempo meta events from the file;
/// `tempo_multiplier` is the only sanctioned way to speed up or slow down practice.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    #[serde(default = "default_ticks_per_second")]
    pub ticks_per_second: f64,

    #[serde(default = "default_tempo_multiplier")]
    pub tempo_multiplier: f64,
}

impl EngineConfig {
    pub fn with_ticks_per_second(ticks_per_second: f64) -> Self {
        Self {
            ticks_per_second,
            ..Self::default()
        }
    }

    /// Both rates must be finite and positive.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(self.ticks_per_second.is_finite() && self.ticks_per_second > 0.0) {
            bail!(
                "Ticks per second must be a positive number, got {}..!",
                self.ticks_per_second
            );
        }

        if !(self.tempo_multiplier.is_finite() && self.tempo_multiplier > 0.0) {
            bail!(
                "Tempo multiplier must be a positive number, got {}..!",
                self.tempo_multiplier
            );
        }

        Ok(())
    }

    /// Ticks covered by `dt` seconds of wall time.
    pub fn ticks_for(&self, dt: f64) -> f64 {
        self.ticks_per_second * dt * self.tempo_multiplier
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ticks_per_second: DEFAULT_TICKS_PER_SECOND,
            tempo_multiplier: DEFAULT_TEMPO_MULTIPLIER,
        }
    }
}

fn parse_rate(s: &str) -> Result<f64, String> {
    let rate: f64 = s.parse().map_err(|e| format!("'{}' is not a number: {}", s, e))?;

    if rate.is_finite() && rate > 0.0 {
        Ok(rate)
    } else {
        Err(format!("rate must be a positive number, got {}", rate))
    }
}

fn default_ticks_per_second() -> f64 {
    DEFAULT_TICKS_PER_SECOND
}

fn default_tempo_multiplier() -> f64 {
    DEFAULT_TEMPO_MULTIPLIER
}

impl From<&Args> for EngineConfig {
    fn from(args: &Args) -> Self {
        Self::with_ticks_per_second(args.ticks_per_second)
    }
}
