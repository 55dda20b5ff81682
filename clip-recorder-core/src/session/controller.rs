use std::path::PathBuf;

use log::debug;
use parking_lot::Mutex;

use crate::models::config::CaptureConfig;
use crate::models::device::InputDeviceInfo;
use crate::models::error::CaptureError;
use crate::models::events::{event_channel, EventReceiver, EventSender, SessionId};
use crate::models::state::{PlaybackState, SessionState};
use crate::session::capture::CaptureSession;
use crate::session::playback::PlaybackSession;
use crate::traits::backend::AudioBackend;

/// Front door for the foreground: owns the backend, the event channel, and
/// one slot each for the active capture and playback session.
///
/// The busy gates are the slot mutexes: a start checks the occupant and
/// installs its replacement inside one critical section, so two racing
/// starts can never both pass, and a provider is only constructed after
/// the gate. A slot whose occupant already finished is reaped (joined) and
/// reused; a live occupant rejects the start with `SessionBusy`.
pub struct RecorderController<B: AudioBackend> {
    backend: B,
    events_tx: EventSender,
    events_rx: EventReceiver,
    capture: Mutex<Option<CaptureSession>>,
    playback: Mutex<Option<PlaybackSession>>,
}

impl<B: AudioBackend> RecorderController<B> {
    pub fn new(backend: B) -> Self {
        let (events_tx, events_rx) = event_channel();
        Self {
            backend,
            events_tx,
            events_rx,
            capture: Mutex::new(None),
            playback: Mutex::new(None),
        }
    }

    /// Receiving half of the event channel. Intended for one foreground
    /// consumer; cloned receivers steal from each other.
    pub fn events(&self) -> EventReceiver {
        self.events_rx.clone()
    }

    /// Enumerate input devices through the backend. An empty list is a
    /// valid answer; only subsystem failure is an error.
    pub fn list_devices(&self) -> Result<Vec<InputDeviceInfo>, CaptureError> {
        self.backend.list_input_devices()
    }

    /// Start a capture session recording `config.duration_secs` seconds to
    /// `output_path`. The parent directory must already exist.
    pub fn start_capture(
        &self,
        config: CaptureConfig,
        output_path: PathBuf,
    ) -> Result<SessionId, CaptureError> {
        config.validate().map_err(CaptureError::InvalidConfig)?;

        let mut slot = self.capture.lock();
        if let Some(session) = slot.as_mut() {
            if !session.is_terminal() {
                return Err(CaptureError::SessionBusy(
                    "a capture session is already active".into(),
                ));
            }
            session.join();
        }

        let provider = self.backend.capture_provider(&config.device);
        let session = CaptureSession::spawn(config, output_path, provider, self.events_tx.clone())?;
        let id = session.id();
        debug!("capture session {id} installed");
        *slot = Some(session);
        Ok(id)
    }

    /// Request cancellation of the active capture session. Returns whether
    /// there was a live session to signal; cancelling with none active is
    /// a no-op, not an error.
    pub fn cancel_capture(&self) -> bool {
        let slot = self.capture.lock();
        match slot.as_ref() {
            Some(session) if !session.is_terminal() => {
                debug!("cancel requested for capture session {}", session.id());
                session.cancel();
                true
            }
            _ => false,
        }
    }

    /// State of the most recent capture session, if any. Terminal states
    /// stay queryable until the next start replaces the slot.
    pub fn capture_state(&self) -> Option<SessionState> {
        self.capture.lock().as_ref().map(CaptureSession::state)
    }

    /// Start playing the WAV file at `path` through the default output.
    pub fn start_playback(&self, path: PathBuf) -> Result<SessionId, CaptureError> {
        let mut slot = self.playback.lock();
        if let Some(session) = slot.as_mut() {
            if !session.is_terminal() {
                return Err(CaptureError::SessionBusy(
                    "a playback session is already active".into(),
                ));
            }
            session.join();
        }

        let provider = self.backend.playback_provider();
        let session = PlaybackSession::spawn(path, provider, self.events_tx.clone());
        let id = session.id();
        debug!("playback session {id} installed");
        *slot = Some(session);
        Ok(id)
    }

    /// State of the most recent playback session, if any.
    pub fn playback_state(&self) -> Option<PlaybackState> {
        self.playback.lock().as_ref().map(PlaybackSession::state)
    }
}
