//! cpal microphone capture provider.
//!
//! Opens the configured input device through the default host and
//! delivers fixed-size mono chunks on the session's transport channel.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::SampleFormat;
use crossbeam_channel::{bounded, Sender};
use log::{debug, error};

use clip_recorder_core::{CaptureError, CaptureProvider, ChunkSender, InputDeviceInfo, SAMPLE_RATE};

use crate::chunk::{f32_to_i16, u16_to_i16, ChunkAssembler};
use crate::devices::resolve_input_device;

/// How long `start` waits for the stream thread to report in.
const READY_WAIT: Duration = Duration::from_secs(3);

/// Stop-flag poll interval on the stream thread.
const POLL: Duration = Duration::from_millis(50);

/// Microphone capture through cpal.
///
/// cpal streams are not `Send`, so the stream lives on a dedicated thread
/// for its whole life; `start` hands the thread everything it needs and
/// waits for a ready/failed handshake. The device is resolved and opened
/// on that thread too, never at construction.
pub struct CpalMicCapture {
    device: InputDeviceInfo,
    running: Arc<AtomicBool>,
    dropped: Arc<AtomicUsize>,
    worker: Option<thread::JoinHandle<()>>,
}

impl CpalMicCapture {
    pub fn new(device: InputDeviceInfo) -> Self {
        Self {
            device,
            running: Arc::new(AtomicBool::new(false)),
            dropped: Arc::new(AtomicUsize::new(0)),
            worker: None,
        }
    }
}

impl CaptureProvider for CpalMicCapture {
    fn start(&mut self, chunk_frames: usize, chunks: ChunkSender) -> Result<(), CaptureError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(CaptureError::SessionBusy("input stream already running".into()));
        }

        self.running.store(true, Ordering::SeqCst);
        self.dropped.store(0, Ordering::SeqCst);

        let (ready_tx, ready_rx) = bounded(1);
        let device = self.device.clone();
        let running = Arc::clone(&self.running);
        let dropped = Arc::clone(&self.dropped);

        let spawned = thread::Builder::new()
            .name("clip-mic".into())
            .spawn(move || stream_thread(device, chunk_frames, chunks, running, dropped, ready_tx));
        let worker = match spawned {
            Ok(worker) => worker,
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                return Err(CaptureError::DeviceOpen(format!(
                    "failed to spawn mic thread: {e}"
                )));
            }
        };
        self.worker = Some(worker);

        match ready_rx.recv_timeout(READY_WAIT) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => {
                self.stop();
                Err(err)
            }
            Err(_) => {
                self.stop();
                Err(CaptureError::DeviceOpen(
                    "timed out waiting for the input stream to start".into(),
                ))
            }
        }
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }

    fn dropped_chunks(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Stream thread body.
///
/// Sequence:
/// 1. Resolve the device descriptor against the current topology
/// 2. Negotiate a 48 kHz config (native channel count, any sample format)
/// 3. Build the input stream with a per-format conversion callback
/// 4. Play, report ready, and park until the stop flag flips
/// 5. Pause and drop the stream, releasing the device
fn stream_thread(
    device: InputDeviceInfo,
    chunk_frames: usize,
    chunks: ChunkSender,
    running: Arc<AtomicBool>,
    dropped: Arc<AtomicUsize>,
    ready: Sender<Result<(), CaptureError>>,
) {
    let stream = match open_input_stream(&device, chunk_frames, chunks, &running, &dropped) {
        Ok(stream) => stream,
        Err(err) => {
            running.store(false, Ordering::SeqCst);
            let _ = ready.send(Err(err));
            return;
        }
    };

    if let Err(err) = stream.play() {
        running.store(false, Ordering::SeqCst);
        let _ = ready.send(Err(CaptureError::DeviceOpen(format!(
            "failed to start input stream: {err}"
        ))));
        return;
    }

    let _ = ready.send(Ok(()));

    while running.load(Ordering::SeqCst) {
        thread::sleep(POLL);
    }

    let _ = stream.pause();
}

fn open_input_stream(
    info: &InputDeviceInfo,
    chunk_frames: usize,
    chunks: ChunkSender,
    running: &Arc<AtomicBool>,
    dropped: &Arc<AtomicUsize>,
) -> Result<cpal::Stream, CaptureError> {
    let host = cpal::default_host();
    let device = resolve_input_device(&host, info)?;
    let (config, sample_format) = negotiate_input_config(&device)?;

    debug!(
        "opening input '{}' at {} Hz, {} ch, {sample_format:?}",
        info.name, config.sample_rate, config.channels
    );

    let mut assembler = ChunkAssembler::new(
        chunk_frames,
        config.channels as usize,
        chunks,
        Arc::clone(dropped),
    );
    let err_running = Arc::clone(running);
    let err_fn = move |err: cpal::StreamError| {
        error!("input stream error: {err}");
        err_running.store(false, Ordering::SeqCst);
    };

    let stream = match sample_format {
        SampleFormat::I16 => device.build_input_stream(
            &config,
            move |data: &[i16], _: &_| assembler.push(data),
            err_fn,
            None,
        ),
        SampleFormat::F32 => {
            let mut scratch: Vec<i16> = Vec::new();
            device.build_input_stream(
                &config,
                move |data: &[f32], _: &_| {
                    scratch.clear();
                    scratch.extend(data.iter().map(|&s| f32_to_i16(s)));
                    assembler.push(&scratch);
                },
                err_fn,
                None,
            )
        }
        SampleFormat::U16 => {
            let mut scratch: Vec<i16> = Vec::new();
            device.build_input_stream(
                &config,
                move |data: &[u16], _: &_| {
                    scratch.clear();
                    scratch.extend(data.iter().map(|&s| u16_to_i16(s)));
                    assembler.push(&scratch);
                },
                err_fn,
                None,
            )
        }
        other => {
            return Err(CaptureError::Format(format!(
                "unsupported input sample format {other:?}"
            )))
        }
    }
    .map_err(|e| CaptureError::DeviceOpen(format!("failed to build input stream: {e}")))?;

    Ok(stream)
}

/// Pick a 48 kHz stream config, keeping the device's native channel count.
///
/// The default config wins when it is already at 48 kHz; otherwise the
/// supported ranges are scanned for one that covers it. A device that
/// cannot do 48 kHz at all is reported as a format problem, not silently
/// resampled.
fn negotiate_input_config(
    device: &cpal::Device,
) -> Result<(cpal::StreamConfig, SampleFormat), CaptureError> {
    let default = device
        .default_input_config()
        .map_err(|e| CaptureError::DeviceOpen(format!("no usable input config: {e}")))?;
    if default.sample_rate() == SAMPLE_RATE {
        return Ok((
            stream_config(default.channels(), default.sample_rate()),
            default.sample_format(),
        ));
    }

    let ranges = device
        .supported_input_configs()
        .map_err(|e| CaptureError::DeviceOpen(format!("failed to query input configs: {e}")))?;
    for range in ranges {
        if range.min_sample_rate() <= SAMPLE_RATE && SAMPLE_RATE <= range.max_sample_rate() {
            let config = range.with_sample_rate(SAMPLE_RATE);
            return Ok((
                stream_config(config.channels(), config.sample_rate()),
                config.sample_format(),
            ));
        }
    }

    Err(CaptureError::Format(format!(
        "input device does not support {SAMPLE_RATE} Hz"
    )))
}

fn stream_config(channels: u16, sample_rate: cpal::SampleRate) -> cpal::StreamConfig {
    cpal::StreamConfig {
        channels,
        sample_rate,
        buffer_size: cpal::BufferSize::Default,
    }
}
