use std::fmt;

use crossbeam_channel::{Receiver, Sender};

use super::outcome::RecordingOutcome;

/// Opaque id minted for every session.
///
/// Events carry it so the consumer can discard updates from a session that
/// is no longer the current one (a late level update after completion, for
/// example).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(uuid::Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Asynchronous notifications from session threads to the foreground.
///
/// All sessions created by one controller share a single unbounded channel;
/// the foreground blocks or polls on its receiving half. Background threads
/// never touch foreground state directly.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Loudness of the chunk just captured, 0..=100. Emitted once per
    /// chunk, in chunk order. Purely a meter signal: consumers may coalesce
    /// or drop these freely.
    Level { session: SessionId, percent: u8 },

    /// A capture session reached a terminal state. `outcome` is present
    /// when a file was written (including cancelled partial takes).
    CaptureFinished {
        session: SessionId,
        success: bool,
        message: String,
        outcome: Option<RecordingOutcome>,
    },

    /// A playback session reached a terminal state.
    PlaybackFinished {
        session: SessionId,
        success: bool,
        message: String,
    },
}

impl SessionEvent {
    /// Session the event originated from.
    pub fn session(&self) -> SessionId {
        match self {
            Self::Level { session, .. }
            | Self::CaptureFinished { session, .. }
            | Self::PlaybackFinished { session, .. } => *session,
        }
    }
}

pub type EventSender = Sender<SessionEvent>;
pub type EventReceiver = Receiver<SessionEvent>;

/// Channel used between session threads and the foreground. Unbounded:
/// event sends are fire-and-forget and must never stall a capture loop.
pub fn event_channel() -> (EventSender, EventReceiver) {
    crossbeam_channel::unbounded()
}
