use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use log::{debug, info, warn};
use parking_lot::Mutex;

use crate::models::config::{
    CaptureConfig, CHANNEL_COUNT, CHUNK_FRAMES, SAMPLE_RATE, SAMPLE_WIDTH_BYTES,
};
use crate::models::error::CaptureError;
use crate::models::events::{EventSender, SessionEvent, SessionId};
use crate::models::outcome::RecordingOutcome;
use crate::models::state::SessionState;
use crate::processing::level_meter::compute_level;
use crate::storage::wav_file::write_wav;
use crate::traits::capture_provider::CaptureProvider;

/// Chunks the provider may queue ahead of the session before it starts
/// dropping. About 170 ms of audio at the fixed format.
const CHUNK_QUEUE_DEPTH: usize = 8;

/// How long the loop waits for one chunk before re-checking the cancel
/// flag. Well above the ~21 ms chunk period so healthy devices never hit
/// it, well below the stall limit so cancellation stays responsive.
const CHUNK_WAIT: Duration = Duration::from_millis(250);

/// A device that has delivered nothing for this long is treated as gone.
const STALL_LIMIT: Duration = Duration::from_secs(2);

/// One bounded recording run: device chunks in, one WAV file out.
///
/// The session owns a dedicated thread that drives the whole take: it
/// starts the provider, consumes chunks off the transport channel for the
/// configured number of iterations, emits a level event per chunk, and on
/// exit releases the device before serializing whatever was captured.
/// Cancellation is cooperative (checked once per chunk) and keeps the
/// frames already recorded.
///
/// A session is single-use: once it reaches `Completed` or `Failed` it
/// stays there, and the next take needs a fresh session. Enforcing "at
/// most one live capture session" is the controller's job, not this
/// type's; it assumes its caller already holds that gate.
pub struct CaptureSession {
    id: SessionId,
    cancel: Arc<AtomicBool>,
    state: Arc<Mutex<SessionState>>,
    worker: Option<thread::JoinHandle<()>>,
}

impl CaptureSession {
    /// Validate the configuration and launch the capture thread.
    ///
    /// Returns as soon as the thread is running; progress and the terminal
    /// result arrive on `events`. Device-open failures also surface there,
    /// as a `CaptureFinished` with `success == false`, because the device
    /// is only ever touched from the session thread.
    pub fn spawn<P>(
        config: CaptureConfig,
        output_path: PathBuf,
        provider: P,
        events: EventSender,
    ) -> Result<Self, CaptureError>
    where
        P: CaptureProvider + 'static,
    {
        config.validate().map_err(CaptureError::InvalidConfig)?;

        let id = SessionId::new();
        let cancel = Arc::new(AtomicBool::new(false));
        let state = Arc::new(Mutex::new(SessionState::Idle));

        let worker = {
            let cancel = Arc::clone(&cancel);
            let state = Arc::clone(&state);
            thread::Builder::new()
                .name("clip-capture".into())
                .spawn(move || run(provider, config, output_path, id, cancel, state, events))
                .expect("failed to spawn capture thread")
        };

        Ok(Self {
            id,
            cancel,
            state,
            worker: Some(worker),
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Current state, by value. Queried through the handle; there is no
    /// shared recording flag anywhere else.
    pub fn state(&self) -> SessionState {
        self.state.lock().clone()
    }

    pub fn is_terminal(&self) -> bool {
        self.state.lock().is_terminal()
    }

    /// Request cooperative cancellation. Idempotent; a no-op once the
    /// session is terminal. The partial take is kept and saved.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
        let mut state = self.state.lock();
        if state.is_recording() {
            *state = SessionState::Stopping;
        }
    }

    /// Block until the session thread has exited.
    pub fn join(&mut self) {
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.cancel.store(true, Ordering::SeqCst);
        self.join();
    }
}

struct Collected {
    chunks: Vec<Vec<i16>>,
    cancelled: bool,
}

fn run<P: CaptureProvider>(
    mut provider: P,
    config: CaptureConfig,
    output_path: PathBuf,
    id: SessionId,
    cancel: Arc<AtomicBool>,
    state: Arc<Mutex<SessionState>>,
    events: EventSender,
) {
    set_state(&state, SessionState::Recording);

    let total_chunks = config.chunk_count();
    info!(
        "capture session {id}: device '{}', {total_chunks} chunks → {}",
        config.device.name,
        output_path.display()
    );

    let (chunk_tx, chunk_rx) = bounded(CHUNK_QUEUE_DEPTH);

    let result = match provider.start(CHUNK_FRAMES, chunk_tx) {
        Ok(()) => {
            let collected = collect_chunks(&chunk_rx, total_chunks, &cancel, &events, id);
            // Disconnect the transport first so a provider blocked on a
            // send can always observe it, then release the device. Both
            // happen before any file work, success or not.
            drop(chunk_rx);
            provider.stop();
            set_state(&state, SessionState::Stopping);
            let dropped = provider.dropped_chunks();
            collected.and_then(|collected| finalize(collected, &output_path, id, dropped))
        }
        Err(err) => Err(err),
    };

    match result {
        Ok(outcome) => {
            let message = if outcome.cancelled {
                format!("saved partial recording to {}", output_path.display())
            } else {
                format!("saved recording to {}", output_path.display())
            };
            info!("capture session {id}: {message}");
            set_state(&state, SessionState::Completed(outcome.clone()));
            let _ = events.send(SessionEvent::Level {
                session: id,
                percent: 0,
            });
            let _ = events.send(SessionEvent::CaptureFinished {
                session: id,
                success: true,
                message,
                outcome: Some(outcome),
            });
        }
        Err(err) => {
            warn!("capture session {id} failed: {err}");
            set_state(&state, SessionState::Failed(err.clone()));
            let _ = events.send(SessionEvent::Level {
                session: id,
                percent: 0,
            });
            let _ = events.send(SessionEvent::CaptureFinished {
                session: id,
                success: false,
                message: err.to_string(),
                outcome: None,
            });
        }
    }
}

/// The per-chunk loop. Runs at most `total_chunks` iterations; each one
/// checks the cancel flag, blocks on the next chunk, accumulates it, and
/// emits its level. Level sends are fire-and-forget so a gone consumer
/// can never stall capture.
fn collect_chunks(
    chunk_rx: &Receiver<Vec<i16>>,
    total_chunks: usize,
    cancel: &AtomicBool,
    events: &EventSender,
    id: SessionId,
) -> Result<Collected, CaptureError> {
    let mut chunks: Vec<Vec<i16>> = Vec::with_capacity(total_chunks);
    let mut stalled = Duration::ZERO;

    while chunks.len() < total_chunks {
        if cancel.load(Ordering::SeqCst) {
            debug!("capture cancelled after {} of {total_chunks} chunks", chunks.len());
            return Ok(Collected {
                chunks,
                cancelled: true,
            });
        }

        match chunk_rx.recv_timeout(CHUNK_WAIT) {
            Ok(chunk) => {
                stalled = Duration::ZERO;
                let percent = compute_level(&chunk);
                chunks.push(chunk);
                let _ = events.send(SessionEvent::Level {
                    session: id,
                    percent,
                });
            }
            Err(RecvTimeoutError::Timeout) => {
                stalled += CHUNK_WAIT;
                if stalled >= STALL_LIMIT {
                    return Err(CaptureError::DeviceOpen(format!(
                        "device delivered no audio for {} seconds",
                        STALL_LIMIT.as_secs()
                    )));
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(CaptureError::DeviceOpen(
                    "device stream closed unexpectedly".into(),
                ));
            }
        }
    }

    Ok(Collected {
        chunks,
        cancelled: false,
    })
}

fn finalize(
    collected: Collected,
    output_path: &Path,
    id: SessionId,
    dropped_chunks: usize,
) -> Result<RecordingOutcome, CaptureError> {
    if dropped_chunks > 0 {
        warn!(
            "capture session {id}: {}",
            CaptureError::Overflow { dropped_chunks }
        );
    }

    let payload_bytes = write_wav(
        output_path,
        SAMPLE_RATE,
        CHANNEL_COUNT,
        SAMPLE_WIDTH_BYTES,
        &collected.chunks,
    )?;

    let frames: usize = collected.chunks.iter().map(Vec::len).sum();
    let duration_secs = frames as f64 / f64::from(SAMPLE_RATE);

    Ok(RecordingOutcome::new(
        id.to_string(),
        output_path.to_path_buf(),
        collected.chunks.len(),
        payload_bytes,
        duration_secs,
        collected.cancelled,
        dropped_chunks,
    ))
}

fn set_state(state: &Mutex<SessionState>, new_state: SessionState) {
    *state.lock() = new_state;
}
