use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, SendTimeoutError};
use log::{info, warn};
use parking_lot::Mutex;

use crate::models::config::CHUNK_FRAMES;
use crate::models::error::CaptureError;
use crate::models::events::{EventSender, SessionEvent, SessionId};
use crate::models::state::PlaybackState;
use crate::storage::wav_file::read_wav;
use crate::traits::playback_provider::{PlaybackFormat, PlaybackProvider};

/// Chunks queued ahead of the output device. Backpressure on this channel
/// paces file reads to playback speed.
const OUT_QUEUE_DEPTH: usize = 8;

/// How long one blocked send waits before re-checking the stop flag.
const SEND_WAIT: Duration = Duration::from_millis(250);

/// Time allowed for the device to drain its queue after the last chunk.
const DRAIN_WAIT: Duration = Duration::from_secs(3);

/// One bounded playback run: WAV file in, output device out.
///
/// The file is validated (integer PCM, 16-bit) before the output device is
/// opened, then streamed in chunk-sized blocks. Every failure, from an
/// absent file to a missing output device, surfaces through the terminal
/// `PlaybackFinished` event; nothing is swallowed.
///
/// Like capture sessions, a playback session is single-use and assumes
/// the controller enforces "at most one live playback session".
pub struct PlaybackSession {
    id: SessionId,
    stop: Arc<AtomicBool>,
    state: Arc<Mutex<PlaybackState>>,
    worker: Option<thread::JoinHandle<()>>,
}

impl PlaybackSession {
    /// Launch the playback thread for `path`.
    ///
    /// Returns as soon as the thread is running; the terminal result
    /// arrives on `events`.
    pub fn spawn<P>(path: PathBuf, provider: P, events: EventSender) -> Self
    where
        P: PlaybackProvider + 'static,
    {
        let id = SessionId::new();
        let stop = Arc::new(AtomicBool::new(false));
        let state = Arc::new(Mutex::new(PlaybackState::Playing));

        let worker = {
            let stop = Arc::clone(&stop);
            let state = Arc::clone(&state);
            thread::Builder::new()
                .name("clip-playback".into())
                .spawn(move || run(provider, path, id, stop, state, events))
                .expect("failed to spawn playback thread")
        };

        Self {
            id,
            stop,
            state,
            worker: Some(worker),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> PlaybackState {
        self.state.lock().clone()
    }

    pub fn is_terminal(&self) -> bool {
        self.state.lock().is_terminal()
    }

    /// Block until the session thread has exited.
    pub fn join(&mut self) {
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        // Teardown stop only; playback has no caller-facing cancel.
        self.stop.store(true, Ordering::SeqCst);
        self.join();
    }
}

struct PlaySummary {
    duration_secs: f64,
    interrupted: bool,
}

fn run<P: PlaybackProvider>(
    mut provider: P,
    path: PathBuf,
    id: SessionId,
    stop: Arc<AtomicBool>,
    state: Arc<Mutex<PlaybackState>>,
    events: EventSender,
) {
    info!("playback session {id}: {}", path.display());

    match play(&mut provider, &path, &stop) {
        Ok(summary) if summary.interrupted => {
            let message = "playback interrupted before completion".to_string();
            warn!("playback session {id}: {message}");
            *state.lock() = PlaybackState::Completed;
            let _ = events.send(SessionEvent::PlaybackFinished {
                session: id,
                success: false,
                message,
            });
        }
        Ok(summary) => {
            let message = format!("played {} ({:.1}s)", path.display(), summary.duration_secs);
            info!("playback session {id}: {message}");
            *state.lock() = PlaybackState::Completed;
            let _ = events.send(SessionEvent::PlaybackFinished {
                session: id,
                success: true,
                message,
            });
        }
        Err(err) => {
            warn!("playback session {id} failed: {err}");
            *state.lock() = PlaybackState::Failed(err.clone());
            let _ = events.send(SessionEvent::PlaybackFinished {
                session: id,
                success: false,
                message: err.to_string(),
            });
        }
    }
}

fn play<P: PlaybackProvider>(
    provider: &mut P,
    path: &Path,
    stop: &AtomicBool,
) -> Result<PlaySummary, CaptureError> {
    // Validation happens before the device is touched: a bad file must
    // never open (or write to) the output stream.
    let clip = read_wav(path)?;
    let format = PlaybackFormat {
        sample_rate: clip.sample_rate,
        channels: clip.channels,
    };

    let (chunk_tx, chunk_rx) = bounded(OUT_QUEUE_DEPTH);
    let (drained_tx, drained_rx) = bounded(1);
    provider.start(format, chunk_rx, drained_tx)?;

    let samples_per_chunk = CHUNK_FRAMES * clip.channels as usize;
    let duration_secs = clip.duration_secs();
    let mut interrupted = false;

    'feed: for block in clip.samples.chunks(samples_per_chunk) {
        let mut chunk = block.to_vec();
        loop {
            if stop.load(Ordering::SeqCst) {
                interrupted = true;
                break 'feed;
            }
            match chunk_tx.send_timeout(chunk, SEND_WAIT) {
                Ok(()) => break,
                Err(SendTimeoutError::Timeout(returned)) => chunk = returned,
                Err(SendTimeoutError::Disconnected(_)) => {
                    provider.stop();
                    return Err(CaptureError::DeviceOpen(
                        "output stream closed unexpectedly".into(),
                    ));
                }
            }
        }
    }

    drop(chunk_tx);
    if !interrupted && drained_rx.recv_timeout(DRAIN_WAIT).is_err() {
        warn!("output device did not confirm drain; releasing it anyway");
    }
    provider.stop();

    Ok(PlaySummary {
        duration_secs,
        interrupted,
    })
}
