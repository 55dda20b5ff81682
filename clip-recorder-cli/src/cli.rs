//! Command-line interface for the clip recorder
//!
//! Handles argument parsing and logging configuration.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::LevelFilter;

use crate::dataset::Label;

/// clip-recorder - Record short labeled audio clips into a WAV dataset
#[derive(Parser, Debug)]
#[command(name = "clip-recorder")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Increase logging verbosity
    /// -v = info, -vv = debug, -vvv = trace, -vvvv = trace for all deps
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List input devices
    Devices {
        /// Emit the device list as JSON
        #[arg(long)]
        json: bool,
    },

    /// Record one labeled take into the dataset
    Record {
        /// Input device index (default: the system default input)
        #[arg(short = 'D', long)]
        device: Option<usize>,

        /// Take label
        #[arg(short, long, value_enum)]
        label: Label,

        /// Recording length in seconds
        #[arg(short, long, default_value_t = 5.0)]
        duration: f64,

        /// Filename prefix
        #[arg(short, long, default_value = "sample")]
        prefix: String,

        /// Take index (default: one past the highest existing take)
        #[arg(short, long)]
        index: Option<u32>,

        /// Dataset root directory
        #[arg(short, long, default_value = "output")]
        output_dir: PathBuf,
    },

    /// Record a scratch clip and play it straight back
    Test {
        /// Input device index (default: the system default input)
        #[arg(short = 'D', long)]
        device: Option<usize>,

        /// Recording length in seconds
        #[arg(short, long, default_value_t = 3.0)]
        duration: f64,

        /// Directory for the scratch file
        #[arg(long, default_value = ".test")]
        scratch_dir: PathBuf,
    },

    /// Play a WAV file
    Play {
        /// File to play
        path: PathBuf,
    },

    /// Check that recording can work in this environment
    Check {
        /// Dataset root directory to probe
        #[arg(short, long, default_value = "output")]
        output_dir: PathBuf,
    },
}

impl Args {
    /// Get the log level filter based on verbosity flags
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            LevelFilter::Error
        } else {
            match self.verbose {
                0 => LevelFilter::Warn,
                1 => LevelFilter::Info,
                2 => LevelFilter::Debug,
                _ => LevelFilter::Trace,
            }
        }
    }
}

/// Initialize the logging system based on CLI arguments
pub fn init_logging(args: &Args) {
    let mut builder = env_logger::Builder::new();

    // Base level for all modules - keep at warn to suppress noisy deps
    builder.filter_level(LevelFilter::Warn);

    // Set our own crates to the requested verbosity level
    builder.filter_module("clip_recorder_cli", args.log_level());
    builder.filter_module("clip_recorder_core", args.log_level());
    builder.filter_module("clip_recorder_cpal", args.log_level());

    // Dependency logs (cpal, hound) only at -vvvv
    if args.verbose >= 4 {
        builder.filter_level(args.log_level());
    }

    builder.format_timestamp_millis().init();
}
