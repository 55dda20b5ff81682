//! Input device enumeration via the default cpal host.

use cpal::traits::{DeviceTrait, HostTrait};

use clip_recorder_core::{CaptureError, InputDeviceInfo};

/// List every usable input device, in the host's enumeration order.
///
/// A device is usable when it reports a name and at least one input
/// config. `index` is the device's position in the host's order, so a
/// descriptor can be resolved back to the same device later as long as
/// the topology has not changed. An empty list is a valid result; only
/// failure to reach the audio subsystem is an error.
pub fn list_input_devices() -> Result<Vec<InputDeviceInfo>, CaptureError> {
    let host = cpal::default_host();
    let default_name = host.default_input_device().and_then(|d| d.name().ok());

    let devices = host.input_devices().map_err(|e| {
        CaptureError::DeviceQuery(format!("failed to enumerate input devices: {e}"))
    })?;

    let mut out = Vec::new();
    for (index, device) in devices.enumerate() {
        let Ok(name) = device.name() else { continue };
        let Ok(config) = device.default_input_config() else {
            continue;
        };
        if config.channels() == 0 {
            continue;
        }

        let is_default = default_name.as_deref() == Some(name.as_str());
        out.push(InputDeviceInfo {
            index,
            name,
            input_channels: config.channels(),
            is_default,
        });
    }

    Ok(out)
}

/// Resolve a descriptor back to a concrete cpal device.
///
/// Prefers the index-and-name match; if the topology shifted since
/// enumeration, a device with the same name elsewhere in the list still
/// wins. A descriptor that matches nothing means the device was removed.
pub(crate) fn resolve_input_device(
    host: &cpal::Host,
    info: &InputDeviceInfo,
) -> Result<cpal::Device, CaptureError> {
    let devices = host.input_devices().map_err(|e| {
        CaptureError::DeviceQuery(format!("failed to enumerate input devices: {e}"))
    })?;

    let mut by_name = None;
    for (index, device) in devices.enumerate() {
        let name = device.name().unwrap_or_default();
        if index == info.index && name == info.name {
            return Ok(device);
        }
        if by_name.is_none() && name == info.name {
            by_name = Some(device);
        }
    }

    by_name.ok_or_else(|| {
        CaptureError::DeviceOpen(format!("input device '{}' is no longer present", info.name))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enumeration_is_ordered_and_has_one_default_at_most() {
        // Headless CI has no audio subsystem; only assert when it answers.
        let devices = match list_input_devices() {
            Ok(devices) => devices,
            Err(_) => return,
        };

        assert!(devices.iter().filter(|d| d.is_default).count() <= 1);
        for pair in devices.windows(2) {
            assert!(pair[0].index < pair[1].index);
        }
        for device in &devices {
            assert!(device.input_channels >= 1);
            assert!(!device.name.is_empty());
        }
    }
}
