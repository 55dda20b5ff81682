use crate::models::device::InputDeviceInfo;
use crate::models::error::CaptureError;

use super::capture_provider::CaptureProvider;
use super::playback_provider::PlaybackProvider;

/// Factory seam between the session layer and a concrete audio backend.
///
/// Constructing a provider acquires nothing: devices are touched only
/// inside the provider's `start`. That keeps the controller's busy gate
/// strictly ahead of any device resource, and lets tests count device
/// opens.
pub trait AudioBackend: Send + Sync {
    type Capture: CaptureProvider + 'static;
    type Playback: PlaybackProvider + 'static;

    /// Enumerate input-capable devices in subsystem order.
    ///
    /// An empty list means "no usable input device" and is not an error;
    /// failure to reach the subsystem at all is `CaptureError::DeviceQuery`.
    fn list_input_devices(&self) -> Result<Vec<InputDeviceInfo>, CaptureError>;

    /// Provider that will record from `device` once started.
    fn capture_provider(&self, device: &InputDeviceInfo) -> Self::Capture;

    /// Provider that will play through the default output once started.
    fn playback_provider(&self) -> Self::Playback;
}
