use crossbeam_channel::{Receiver, Sender};

use crate::models::error::CaptureError;

/// Stream format a playback session asks of the output device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

/// Interface for backend audio output sinks.
///
/// The session pushes chunk-sized sample blocks into a bounded channel;
/// the provider pulls them from its device callback. Backpressure on the
/// channel is what paces the session's file reads to playback speed.
pub trait PlaybackProvider: Send {
    /// Open the output device and start consuming chunks from `chunks`.
    ///
    /// The provider pulls until the channel disconnects, then sends one
    /// message on `drained` after the last queued sample has been handed
    /// to the device. Returns once the stream is live, or with the open
    /// error.
    fn start(
        &mut self,
        format: PlaybackFormat,
        chunks: Receiver<Vec<i16>>,
        drained: Sender<()>,
    ) -> Result<(), CaptureError>;

    /// Stop and release the device. Idempotent; sessions call this on
    /// every exit path.
    fn stop(&mut self);
}
