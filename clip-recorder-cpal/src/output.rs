//! cpal speaker playback provider.
//!
//! Streams queued sample chunks to the default output device, then
//! reports drain so the session can release the device only after the
//! last sample was handed over.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SampleFormat;
use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};
use log::{debug, error};

use clip_recorder_core::{CaptureError, PlaybackFormat, PlaybackProvider};

use crate::chunk::{i16_to_f32, i16_to_u16};

/// How long `start` waits for the stream thread to report in.
const READY_WAIT: Duration = Duration::from_secs(3);

/// Stop-flag poll interval on the stream thread.
const POLL: Duration = Duration::from_millis(50);

/// Playback through the default cpal output device.
///
/// Mirrors the capture provider's shape: the stream is not `Send`, so a
/// dedicated thread owns it and `start` waits on a ready/failed
/// handshake. Chunks are pulled inside the device callback; once the
/// source channel disconnects and the queue is empty, one drain message
/// is sent and the callback keeps emitting silence until stopped.
pub struct CpalSpeakerOutput {
    running: Arc<AtomicBool>,
    worker: Option<thread::JoinHandle<()>>,
}

impl CpalSpeakerOutput {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }
}

impl Default for CpalSpeakerOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackProvider for CpalSpeakerOutput {
    fn start(
        &mut self,
        format: PlaybackFormat,
        chunks: Receiver<Vec<i16>>,
        drained: Sender<()>,
    ) -> Result<(), CaptureError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(CaptureError::SessionBusy(
                "output stream already running".into(),
            ));
        }

        self.running.store(true, Ordering::SeqCst);

        let (ready_tx, ready_rx) = bounded(1);
        let running = Arc::clone(&self.running);

        let spawned = thread::Builder::new()
            .name("clip-speaker".into())
            .spawn(move || stream_thread(format, chunks, drained, running, ready_tx));
        let worker = match spawned {
            Ok(worker) => worker,
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                return Err(CaptureError::DeviceOpen(format!(
                    "failed to spawn speaker thread: {e}"
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
                    "timed out waiting for the output stream to start".into(),
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
}

fn stream_thread(
    format: PlaybackFormat,
    chunks: Receiver<Vec<i16>>,
    drained: Sender<()>,
    running: Arc<AtomicBool>,
    ready: Sender<Result<(), CaptureError>>,
) {
    let stream = match open_output_stream(format, chunks, drained, &running) {
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
            "failed to start output stream: {err}"
        ))));
        return;
    }

    let _ = ready.send(Ok(()));

    while running.load(Ordering::SeqCst) {
        thread::sleep(POLL);
    }

    let _ = stream.pause();
}

fn open_output_stream(
    format: PlaybackFormat,
    chunks: Receiver<Vec<i16>>,
    drained: Sender<()>,
    running: &Arc<AtomicBool>,
) -> Result<cpal::Stream, CaptureError> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| CaptureError::DeviceOpen("no output device available".into()))?;
    let (config, sample_format) = negotiate_output_config(&device, format.sample_rate)?;

    let source_channels = format.channels as usize;
    let device_channels = config.channels as usize;
    if source_channels != 1 && source_channels != device_channels {
        return Err(CaptureError::Format(format!(
            "cannot play {source_channels}-channel audio through a {device_channels}-channel output"
        )));
    }

    debug!(
        "opening output at {} Hz, {} ch, {sample_format:?}",
        config.sample_rate, config.channels
    );

    let mut feed = FrameFeed {
        source_channels,
        device_channels,
        chunks,
        drained,
        pending: VecDeque::new(),
        source_done: false,
        drained_sent: false,
    };
    let err_running = Arc::clone(running);
    let err_fn = move |err: cpal::StreamError| {
        error!("output stream error: {err}");
        err_running.store(false, Ordering::SeqCst);
    };

    let stream = match sample_format {
        SampleFormat::I16 => device.build_output_stream(
            &config,
            move |data: &mut [i16], _: &_| feed.fill(data, |s| s),
            err_fn,
            None,
        ),
        SampleFormat::F32 => device.build_output_stream(
            &config,
            move |data: &mut [f32], _: &_| feed.fill(data, i16_to_f32),
            err_fn,
            None,
        ),
        SampleFormat::U16 => device.build_output_stream(
            &config,
            move |data: &mut [u16], _: &_| feed.fill(data, i16_to_u16),
            err_fn,
            None,
        ),
        other => {
            return Err(CaptureError::Format(format!(
                "unsupported output sample format {other:?}"
            )))
        }
    }
    .map_err(|e| CaptureError::DeviceOpen(format!("failed to build output stream: {e}")))?;

    Ok(stream)
}

fn negotiate_output_config(
    device: &cpal::Device,
    sample_rate: u32,
) -> Result<(cpal::StreamConfig, SampleFormat), CaptureError> {
    let default = device
        .default_output_config()
        .map_err(|e| CaptureError::DeviceOpen(format!("no usable output config: {e}")))?;
    if default.sample_rate() == sample_rate {
        return Ok((
            stream_config(default.channels(), default.sample_rate()),
            default.sample_format(),
        ));
    }

    let ranges = device
        .supported_output_configs()
        .map_err(|e| CaptureError::DeviceOpen(format!("failed to query output configs: {e}")))?;
    for range in ranges {
        if range.min_sample_rate() <= sample_rate && sample_rate <= range.max_sample_rate() {
            let config = range.with_sample_rate(sample_rate);
            return Ok((
                stream_config(config.channels(), config.sample_rate()),
                config.sample_format(),
            ));
        }
    }

    Err(CaptureError::Format(format!(
        "output device does not support {sample_rate} Hz"
    )))
}

fn stream_config(channels: u16, sample_rate: cpal::SampleRate) -> cpal::StreamConfig {
    cpal::StreamConfig {
        channels,
        sample_rate,
        buffer_size: cpal::BufferSize::Default,
    }
}

/// Callback-side source queue.
///
/// Holds device-interleaved samples: mono sources are duplicated across
/// every output channel at refill time, matching channel counts pass
/// through. Underruns play silence; the queue never blocks the callback.
struct FrameFeed {
    source_channels: usize,
    device_channels: usize,
    chunks: Receiver<Vec<i16>>,
    drained: Sender<()>,
    pending: VecDeque<i16>,
    source_done: bool,
    drained_sent: bool,
}

impl FrameFeed {
    fn fill<T: Copy>(&mut self, out: &mut [T], convert: impl Fn(i16) -> T) {
        self.refill(out.len());

        for slot in out.iter_mut() {
            *slot = convert(self.pending.pop_front().unwrap_or(0));
        }

        if self.source_done && self.pending.is_empty() && !self.drained_sent {
            let _ = self.drained.try_send(());
            self.drained_sent = true;
        }
    }

    fn refill(&mut self, target: usize) {
        while self.pending.len() < target && !self.source_done {
            match self.chunks.try_recv() {
                Ok(chunk) => {
                    for frame in chunk.chunks(self.source_channels) {
                        if self.source_channels == 1 {
                            for _ in 0..self.device_channels {
                                self.pending.push_back(frame[0]);
                            }
                        } else {
                            self.pending.extend(frame.iter().copied());
                        }
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => self.source_done = true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    fn make_feed(
        source_channels: usize,
        device_channels: usize,
    ) -> (FrameFeed, Sender<Vec<i16>>, Receiver<()>) {
        let (chunk_tx, chunk_rx) = unbounded();
        let (drained_tx, drained_rx) = bounded(1);
        let feed = FrameFeed {
            source_channels,
            device_channels,
            chunks: chunk_rx,
            drained: drained_tx,
            pending: VecDeque::new(),
            source_done: false,
            drained_sent: false,
        };
        (feed, chunk_tx, drained_rx)
    }

    #[test]
    fn mono_source_is_duplicated_across_output_channels() {
        let (mut feed, chunk_tx, _drained) = make_feed(1, 2);
        chunk_tx.send(vec![5, -5]).unwrap();

        let mut out = [0i16; 4];
        feed.fill(&mut out, |s| s);
        assert_eq!(out, [5, 5, -5, -5]);
    }

    #[test]
    fn underrun_plays_silence_without_blocking() {
        let (mut feed, chunk_tx, _drained) = make_feed(1, 1);
        chunk_tx.send(vec![9]).unwrap();

        let mut out = [7i16; 3];
        feed.fill(&mut out, |s| s);
        assert_eq!(out, [9, 0, 0]);
    }

    #[test]
    fn drain_is_signalled_once_after_last_sample() {
        let (mut feed, chunk_tx, drained) = make_feed(1, 1);
        chunk_tx.send(vec![1, 2]).unwrap();
        drop(chunk_tx);

        let mut out = [0i16; 2];
        feed.fill(&mut out, |s| s);
        assert_eq!(out, [1, 2]);

        // Disconnect is observed on the next callback; drain fires once
        // the queue is empty.
        feed.fill(&mut out, |s| s);
        assert_eq!(out, [0, 0]);
        assert_eq!(drained.try_recv(), Ok(()));

        feed.fill(&mut out, |s| s);
        assert!(drained.try_recv().is_err(), "drain must fire exactly once");
    }

    #[test]
    fn matching_channel_counts_pass_through() {
        let (mut feed, chunk_tx, _drained) = make_feed(2, 2);
        chunk_tx.send(vec![1, 2, 3, 4]).unwrap();

        let mut out = [0.0f32; 4];
        feed.fill(&mut out, i16_to_f32);
        assert_eq!(out, [1.0 / 32768.0, 2.0 / 32768.0, 3.0 / 32768.0, 4.0 / 32768.0]);
    }
}
