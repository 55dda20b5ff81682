//! # clip-recorder-core
//!
//! Platform-agnostic core for recording short labeled audio clips.
//!
//! Provides the level meter, WAV serialization, capture/playback session
//! state machines, and the controller that gates them. Audio backends
//! (cpal in production, mocks in tests) implement the provider traits and
//! plug in underneath; front ends drive the `RecorderController` and
//! consume its event channel.
//!
//! ## Architecture
//!
//! ```text
//! clip-recorder-core (this crate)
//! ├── traits/       ← AudioBackend, CaptureProvider, PlaybackProvider
//! ├── models/       ← CaptureError, SessionState, CaptureConfig, events, outcome
//! ├── processing/   ← level meter (RMS → 0..100)
//! ├── session/      ← CaptureSession, PlaybackSession, RecorderController
//! └── storage/      ← WAV read/write (hound)
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::config::{
    CaptureConfig, CHANNEL_COUNT, CHUNK_BYTES, CHUNK_FRAMES, SAMPLE_RATE, SAMPLE_WIDTH_BYTES,
};
pub use models::device::InputDeviceInfo;
pub use models::error::CaptureError;
pub use models::events::{event_channel, EventReceiver, EventSender, SessionEvent, SessionId};
pub use models::outcome::RecordingOutcome;
pub use models::state::{PlaybackState, SessionState};
pub use processing::level_meter::compute_level;
pub use session::capture::CaptureSession;
pub use session::controller::RecorderController;
pub use session::playback::PlaybackSession;
pub use storage::wav_file::{read_wav, write_wav, WavClip};
pub use traits::backend::AudioBackend;
pub use traits::capture_provider::{CaptureProvider, ChunkSender};
pub use traits::playback_provider::{PlaybackFormat, PlaybackProvider};
