//! # clip-recorder-cpal
//!
//! cpal backend for clip-recorder-core.
//!
//! Provides:
//! - `CpalBackend` — `AudioBackend` over the default cpal host
//! - `CpalMicCapture` — input provider delivering fixed-size mono chunks
//! - `CpalSpeakerOutput` — playback provider for the default output device
//! - `list_input_devices` — enumeration in host order, default marked
//!
//! cpal streams are not `Send`, so each provider runs its stream on a
//! dedicated thread and hands audio across crossbeam channels; sessions
//! never touch a stream handle directly.
//!
//! ## Usage
//! ```ignore
//! use clip_recorder_core::RecorderController;
//! use clip_recorder_cpal::CpalBackend;
//!
//! let controller = RecorderController::new(CpalBackend::new());
//! let devices = controller.list_devices()?;
//! ```

pub mod backend;
pub mod devices;
pub mod input;
pub mod output;

mod chunk;

pub use backend::CpalBackend;
pub use devices::list_input_devices;
pub use input::CpalMicCapture;
pub use output::CpalSpeakerOutput;
