//! clip-recorder - record short labeled audio clips into a WAV dataset
//!
//! This is the main entry point for the command-line front end.

mod cli;
mod commands;
mod dataset;
mod meter;

use clap::Parser;
use log::debug;

fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();
    cli::init_logging(&args);
    debug!("parsed command: {:?}", args.command);

    match args.command {
        cli::Command::Devices { json } => commands::run_devices(json),
        cli::Command::Record {
            device,
            label,
            duration,
            prefix,
            index,
            output_dir,
        } => commands::run_record(device, label, duration, &prefix, index, &output_dir),
        cli::Command::Test {
            device,
            duration,
            scratch_dir,
        } => commands::run_test(device, duration, &scratch_dir),
        cli::Command::Play { path } => commands::run_play(&path),
        cli::Command::Check { output_dir } => commands::run_check(&output_dir),
    }
}
