use serde::{Deserialize, Serialize};

use super::device::InputDeviceInfo;

/// Fixed sample rate for every clip, in Hz.
pub const SAMPLE_RATE: u32 = 48_000;

/// Every clip is mono.
pub const CHANNEL_COUNT: u16 = 1;

/// Signed 16-bit PCM.
pub const SAMPLE_WIDTH_BYTES: u16 = 2;

/// Frames read from the device per I/O operation.
pub const CHUNK_FRAMES: usize = 1024;

/// Bytes in one fully populated mono chunk.
pub const CHUNK_BYTES: usize = CHUNK_FRAMES * CHANNEL_COUNT as usize * SAMPLE_WIDTH_BYTES as usize;

/// Configuration for one capture session.
///
/// The clip format (48 kHz, mono, 16-bit, 1024-frame chunks) is a
/// process-wide constant, not a per-session knob; a session only chooses
/// the input device and how long to record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Device to record from, as returned by the enumerator.
    pub device: InputDeviceInfo,

    /// Requested clip length in seconds. Must be positive and finite.
    pub duration_secs: f64,
}

impl CaptureConfig {
    pub fn new(device: InputDeviceInfo, duration_secs: f64) -> Self {
        Self {
            device,
            duration_secs,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.duration_secs.is_finite() || self.duration_secs <= 0.0 {
            return Err(format!("duration must be positive: {}", self.duration_secs));
        }
        if self.device.input_channels == 0 {
            return Err(format!("device '{}' has no input channels", self.device.name));
        }
        Ok(())
    }

    /// Number of chunks a full-length session records.
    ///
    /// Truncating, so the clip never runs longer than requested: one second
    /// at 48 kHz with 1024-frame chunks yields 46 chunks, not 47.
    pub fn chunk_count(&self) -> usize {
        (SAMPLE_RATE as f64 / CHUNK_FRAMES as f64 * self.duration_secs) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device() -> InputDeviceInfo {
        InputDeviceInfo {
            index: 0,
            name: "Test Mic".to_string(),
            input_channels: 1,
            is_default: true,
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(CaptureConfig::new(device(), 5.0).validate().is_ok());
    }

    #[test]
    fn nonpositive_duration_rejected() {
        assert!(CaptureConfig::new(device(), 0.0).validate().is_err());
        assert!(CaptureConfig::new(device(), -1.0).validate().is_err());
        assert!(CaptureConfig::new(device(), f64::NAN).validate().is_err());
    }

    #[test]
    fn inputless_device_rejected() {
        let mut dev = device();
        dev.input_channels = 0;
        assert!(CaptureConfig::new(dev, 5.0).validate().is_err());
    }

    #[test]
    fn chunk_count_truncates() {
        assert_eq!(CaptureConfig::new(device(), 1.0).chunk_count(), 46);
        assert_eq!(CaptureConfig::new(device(), 0.5).chunk_count(), 23);
        assert_eq!(CaptureConfig::new(device(), 10.0).chunk_count(), 468);
    }

    #[test]
    fn chunk_bytes_match_format() {
        assert_eq!(CHUNK_BYTES, 2048);
    }
}
