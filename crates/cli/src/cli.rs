//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Flexx Capture - Pico Flexx depth camera acquisition pipeline
#[derive(Parser, Debug)]
#[command(
    name = "flexx-capture",
    author,
    version,
    about = "Pico Flexx depth camera acquisition pipeline",
    long_about = "A frame acquisition pipeline for the Pico Flexx depth camera.\n\n\
                  Opens the device, acquires paired IR/depth frames, survives device \n\
                  outages through automatic reconnection, and records the raw \n\
                  pointcloud stream in reconnect-safe segments."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "FLEXX_CAPTURE_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "FLEXX_CAPTURE_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the acquisition pipeline
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "config.toml",
        env = "FLEXX_CAPTURE_CONFIG"
    )]
    pub config: PathBuf,

    /// Override the operating mode from configuration (e.g. MODE_9_15FPS_700)
    #[arg(long, env = "FLEXX_CAPTURE_USECASE")]
    pub usecase: Option<String>,

    /// Override the recording directory from configuration
    #[arg(long, env = "FLEXX_CAPTURE_RECORD_DIR")]
    pub record_dir: Option<PathBuf>,

    /// Maximum number of frames to acquire (0 = unlimited)
    #[arg(long, default_value = "0", env = "FLEXX_CAPTURE_MAX_FRAMES")]
    pub max_frames: u64,

    /// Pipeline timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "FLEXX_CAPTURE_TIMEOUT")]
    pub timeout: u64,

    /// Validate configuration and exit without running pipeline
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "9000", env = "FLEXX_CAPTURE_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}
