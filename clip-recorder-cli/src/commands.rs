//! Subcommand implementations
//!
//! Each `run_*` function owns one subcommand end to end: it builds a
//! controller over the cpal backend, drives the session through the event
//! channel, and turns failure events into nonzero process exits via
//! `anyhow`. The level bar and all progress output go to stderr; stdout
//! carries only the durable results (device lists, saved paths, indices).

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use log::{info, warn};

use clip_recorder_core::{
    read_wav, write_wav, CaptureConfig, EventReceiver, InputDeviceInfo, RecorderController,
    SessionEvent, SessionId, CHANNEL_COUNT, CHUNK_FRAMES, SAMPLE_RATE, SAMPLE_WIDTH_BYTES,
};
use clip_recorder_cpal::CpalBackend;

use crate::dataset::{self, Label};
use crate::meter;

type Controller = RecorderController<CpalBackend>;

fn new_controller() -> Arc<Controller> {
    Arc::new(RecorderController::new(CpalBackend::new()))
}

/// `devices`: list input devices, one `index: Name (N ch)` line each.
pub fn run_devices(json: bool) -> Result<()> {
    let controller = new_controller();
    let devices = controller
        .list_devices()
        .context("device enumeration failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&devices)?);
        return Ok(());
    }

    if devices.is_empty() {
        warn!("no input devices found");
        return Ok(());
    }
    for device in &devices {
        let marker = if device.is_default { "  (default)" } else { "" };
        println!("{}: {}{marker}", device.index, device.label());
    }
    Ok(())
}

/// `record`: capture one labeled take into the dataset.
pub fn run_record(
    device: Option<usize>,
    label: Label,
    duration: f64,
    prefix: &str,
    index: Option<u32>,
    output_dir: &Path,
) -> Result<()> {
    let controller = new_controller();
    let device = resolve_device(&controller, device)?;

    let dir = output_dir.join(label.dir_name());
    fs::create_dir_all(&dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let index = match index {
        Some(index) => index,
        None => dataset::next_free_index(&dir, prefix)
            .with_context(|| format!("failed to scan {}", dir.display()))?,
    };
    let path = dataset::take_path(&dir, prefix, index);

    capture_take(&controller, device, duration, path)?;
    println!("next index: {}", index + 1);
    Ok(())
}

/// `test`: record a scratch clip, then play it straight back.
pub fn run_test(device: Option<usize>, duration: f64, scratch_dir: &Path) -> Result<()> {
    let controller = new_controller();
    let device = resolve_device(&controller, device)?;

    fs::create_dir_all(scratch_dir)
        .with_context(|| format!("failed to create {}", scratch_dir.display()))?;
    let path = scratch_dir.join("test_recording.wav");

    capture_take(&controller, device, duration, path.clone())?;
    play_file(&controller, &path)
}

/// `play`: play back an existing WAV file.
pub fn run_play(path: &Path) -> Result<()> {
    let controller = new_controller();
    play_file(&controller, path)
}

/// `check`: probe the environment step by step, FAIL lines but no early
/// exit, so one broken step still shows the state of the others.
pub fn run_check(output_dir: &Path) -> Result<()> {
    let controller = new_controller();
    let mut failed = false;

    match controller.list_devices() {
        Ok(devices) if devices.is_empty() => {
            report(false, "input devices: none found");
            failed = true;
        }
        Ok(devices) => report(true, &format!("input devices: {} found", devices.len())),
        Err(err) => {
            report(false, &format!("input devices: {err}"));
            failed = true;
        }
    }

    report(
        true,
        &format!(
            "capture format: {SAMPLE_RATE} Hz, {CHANNEL_COUNT} ch, {}-bit",
            SAMPLE_WIDTH_BYTES * 8
        ),
    );

    let marker = output_dir.join(".write_probe");
    let writable = fs::create_dir_all(output_dir)
        .and_then(|()| fs::write(&marker, b"probe"))
        .and_then(|()| fs::remove_file(&marker));
    match writable {
        Ok(()) => report(
            true,
            &format!("output directory: {} is writable", output_dir.display()),
        ),
        Err(err) => {
            report(
                false,
                &format!("output directory: {}: {err}", output_dir.display()),
            );
            failed = true;
        }
    }

    match wav_round_trip(&output_dir.join(".check_probe.wav")) {
        Ok(()) => report(true, "wav writer: silent clip reads back intact"),
        Err(err) => {
            report(false, &format!("wav writer: {err}"));
            failed = true;
        }
    }

    if failed {
        bail!("environment check failed");
    }
    Ok(())
}

fn report(ok: bool, message: &str) {
    println!("{} {message}", if ok { "OK  " } else { "FAIL" });
}

/// Write a short silent clip, read it back, and compare header and payload.
fn wav_round_trip(path: &Path) -> Result<()> {
    let chunks = vec![vec![0i16; CHUNK_FRAMES]; 4];
    let written = write_wav(path, SAMPLE_RATE, CHANNEL_COUNT, SAMPLE_WIDTH_BYTES, &chunks)?;
    let clip = read_wav(path)?;
    let _ = fs::remove_file(path);

    if clip.sample_rate != SAMPLE_RATE
        || clip.channels != CHANNEL_COUNT
        || clip.bits_per_sample != SAMPLE_WIDTH_BYTES * 8
        || clip.payload_bytes() != written
    {
        bail!("read-back header does not match what was written");
    }
    Ok(())
}

/// Pick the requested device by enumeration index, or fall back to the
/// subsystem default (first device if none is marked default).
fn resolve_device(controller: &Controller, index: Option<usize>) -> Result<InputDeviceInfo> {
    let devices = controller
        .list_devices()
        .context("device enumeration failed")?;
    if devices.is_empty() {
        bail!("no input devices found");
    }

    match index {
        Some(index) => devices.iter().find(|d| d.index == index).cloned().ok_or_else(|| {
            anyhow!("no input device with index {index}; run `clip-recorder devices`")
        }),
        None => Ok(devices
            .iter()
            .find(|d| d.is_default)
            .unwrap_or(&devices[0])
            .clone()),
    }
}

/// Run one capture to `path`, rendering the level bar until it finishes.
fn capture_take(
    controller: &Arc<Controller>,
    device: InputDeviceInfo,
    duration: f64,
    path: PathBuf,
) -> Result<()> {
    let events = controller.events();
    let config = CaptureConfig::new(device.clone(), duration);

    println!(
        "recording {duration:.1}s from '{}' to {}",
        device.name,
        path.display()
    );

    install_cancel_handler(controller);
    let session = controller
        .start_capture(config, path)
        .context("failed to start capture")?;
    info!("capture session {session} started");

    wait_for_capture(&events, session)
}

/// First Ctrl-C cancels the active capture (the partial take is kept);
/// a second one, or a Ctrl-C with nothing to cancel, exits like an
/// uncaught SIGINT.
fn install_cancel_handler(controller: &Arc<Controller>) {
    let controller = Arc::clone(controller);
    if let Err(err) = ctrlc::set_handler(move || {
        if controller.cancel_capture() {
            eprintln!("\ncancelling, keeping the partial take...");
        } else {
            std::process::exit(130);
        }
    }) {
        warn!("could not install ctrl-c handler: {err}");
    }
}

fn wait_for_capture(events: &EventReceiver, session: SessionId) -> Result<()> {
    while let Ok(event) = events.recv() {
        match event {
            SessionEvent::Level { session: id, percent } if id == session => meter::draw(percent),
            SessionEvent::CaptureFinished {
                session: id,
                success,
                message,
                outcome,
            } if id == session => {
                meter::clear();
                if !success {
                    bail!("recording failed: {message}");
                }
                println!("{message}");
                if let Some(outcome) = outcome {
                    println!(
                        "  {} chunks, {} bytes, {:.2}s{}",
                        outcome.chunks_captured,
                        outcome.payload_bytes,
                        outcome.duration_secs,
                        if outcome.cancelled { " (cancelled early)" } else { "" },
                    );
                }
                return Ok(());
            }
            _ => {}
        }
    }
    bail!("event channel closed before the recording finished");
}

fn play_file(controller: &Arc<Controller>, path: &Path) -> Result<()> {
    let events = controller.events();
    let session = controller
        .start_playback(path.to_path_buf())
        .context("failed to start playback")?;
    info!("playback session {session} started");
    println!("playing {}", path.display());

    while let Ok(event) = events.recv() {
        if let SessionEvent::PlaybackFinished {
            session: id,
            success,
            message,
        } = event
        {
            if id != session {
                continue;
            }
            if !success {
                bail!("playback failed: {message}");
            }
            println!("{message}");
            return Ok(());
        }
    }
    bail!("event channel closed before playback finished");
}
