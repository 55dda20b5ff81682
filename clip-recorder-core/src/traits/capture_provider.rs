use crossbeam_channel::Sender;

use crate::models::error::CaptureError;

/// Transport carrying captured chunks from a provider to its session.
/// Each message is one chunk of mono signed 16-bit samples.
pub type ChunkSender = Sender<Vec<i16>>;

/// Interface for backend audio input sources.
///
/// Implemented by the cpal microphone provider, and by scripted mocks in
/// tests. A provider owns whatever thread and stream handle the platform
/// needs; the session only ever sees chunks arriving on the channel.
pub trait CaptureProvider: Send {
    /// Open the device and start delivering chunks of exactly
    /// `chunk_frames` mono frames on `chunks`.
    ///
    /// Returns once the stream is live, or with the open error. Delivery
    /// happens on the provider's own thread; if the channel is full the
    /// provider drops the chunk and counts it instead of blocking the
    /// device callback.
    fn start(&mut self, chunk_frames: usize, chunks: ChunkSender) -> Result<(), CaptureError>;

    /// Stop delivering and release the device. Idempotent; sessions call
    /// this on every exit path.
    fn stop(&mut self);

    /// Chunks dropped because the session fell behind, since `start`.
    fn dropped_chunks(&self) -> usize;
}
