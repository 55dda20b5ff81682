use clip_recorder_core::{AudioBackend, CaptureError, InputDeviceInfo};

use crate::devices;
use crate::input::CpalMicCapture;
use crate::output::CpalSpeakerOutput;

/// cpal-backed `AudioBackend`.
///
/// Stateless: every enumeration goes through a fresh default host, and
/// providers open their devices on their own stream threads. Constructing
/// the backend or a provider acquires nothing.
pub struct CpalBackend;

impl CpalBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for CpalBackend {
    type Capture = CpalMicCapture;
    type Playback = CpalSpeakerOutput;

    fn list_input_devices(&self) -> Result<Vec<InputDeviceInfo>, CaptureError> {
        devices::list_input_devices()
    }

    fn capture_provider(&self, device: &InputDeviceInfo) -> CpalMicCapture {
        CpalMicCapture::new(device.clone())
    }

    fn playback_provider(&self) -> CpalSpeakerOutput {
        CpalSpeakerOutput::new()
    }
}
