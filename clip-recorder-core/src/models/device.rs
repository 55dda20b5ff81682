use serde::{Deserialize, Serialize};

/// An input-capable audio device, as reported by the backend enumerator.
///
/// This is a snapshot: `index` is the device's position in the backend's
/// enumeration order and is only meaningful for the current device
/// topology. Callers re-list on demand instead of caching descriptors
/// across device changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputDeviceInfo {
    /// Position in the backend's enumeration order.
    pub index: usize,

    /// Human-readable device name.
    pub name: String,

    /// Number of capture channels the device reports. Always ≥ 1 for
    /// descriptors returned by the enumerator.
    pub input_channels: u16,

    /// Whether the subsystem reports this device as the default input.
    pub is_default: bool,
}

impl InputDeviceInfo {
    /// Display form used by device pickers: `Name (N ch)`.
    pub fn label(&self) -> String {
        format!("{} ({} ch)", self.name, self.input_channels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_includes_channel_count() {
        let dev = InputDeviceInfo {
            index: 2,
            name: "USB Microphone".to_string(),
            input_channels: 1,
            is_default: false,
        };
        assert_eq!(dev.label(), "USB Microphone (1 ch)");
    }
}
