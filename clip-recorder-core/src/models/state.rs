use super::error::CaptureError;
use super::outcome::RecordingOutcome;

/// Capture session state machine. One value per session, owned by the
/// session and queried through its handle.
///
/// State transitions:
/// ```text
/// idle → recording → stopping → completed / failed
/// ```
/// Cancellation enters `stopping` early; natural completion also passes
/// through it while the device is released and the file is serialized.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    Recording,
    Stopping,
    Completed(RecordingOutcome),
    Failed(CaptureError),
}

impl SessionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Failed(_))
    }

    /// Outcome of the session, if it completed cleanly.
    pub fn outcome(&self) -> Option<&RecordingOutcome> {
        match self {
            Self::Completed(outcome) => Some(outcome),
            _ => None,
        }
    }
}

/// Playback lifecycle: a session is playing until it either drains the file
/// or fails, and is never reused afterwards.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackState {
    Playing,
    Completed,
    Failed(CaptureError),
}

impl PlaybackState {
    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed(_))
    }
}
