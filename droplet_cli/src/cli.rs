//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "droplet", version, about = "Closed-loop droplet positioner")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/droplet_config.toml")]
    pub config: PathBuf,

    /// Optional calibration CSV (strict header); overrides [[calibration]] in the config
    #[arg(long, value_name = "FILE")]
    pub calibration: Option<PathBuf>,

    /// Print results and errors as JSON lines
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); RUST_LOG wins when set
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum DirectionArg {
    Left,
    Right,
}

impl From<DirectionArg> for droplet_core::Direction {
    fn from(d: DirectionArg) -> Self {
        match d {
            DirectionArg::Left => droplet_core::Direction::Left,
            DirectionArg::Right => droplet_core::Direction::Right,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Move the droplet to a target x position (pixels)
    Move {
        /// Target x coordinate in pixels
        #[arg(long, allow_hyphen_values = true)]
        target: i32,
        /// Override control.success_threshold_px
        #[arg(long, value_name = "PX")]
        success_threshold_px: Option<u32>,
        /// Override control.settle_margin_ms
        #[arg(long, value_name = "MS")]
        settle_margin_ms: Option<u64>,
        /// Re-run the whole cycle up to this many extra times while it fails
        #[arg(long, value_name = "N", default_value_t = 0)]
        retries: u32,
    },
    /// Grab one frame and print the estimated droplet position
    Locate,
    /// Print the command a move of the given distance would send (no hardware)
    Profile {
        /// Travel distance in pixels
        #[arg(long, value_name = "PX")]
        distance: f64,
        /// Travel direction
        #[arg(long, value_enum, default_value_t = DirectionArg::Right)]
        direction: DirectionArg,
    },
    /// Validate config and calibration, open the backends, and locate once
    SelfCheck,
}
