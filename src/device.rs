//! Device enumeration and name resolution via CPAL.
//!
//! Devices are presented to the control layer by display name only; the
//! opaque platform handle (`cpal::Device`) is resolved from the name at
//! `init` time and never crosses the API boundary.

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::Device;

use crate::error::EngineError;

/// A selectable audio endpoint, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    /// Human-readable device name, unique enough to resolve by.
    pub name: String,
}

/// Lists all available capture devices.
///
/// # Errors
///
/// Returns an error if the audio host cannot be queried.
pub fn list_input_devices() -> Result<Vec<DeviceDescriptor>, EngineError> {
    let host = cpal::default_host();
    let devices = host
        .input_devices()
        .map_err(|e| EngineError::Backend(e.to_string()))?;

    Ok(devices
        .filter_map(|d| d.name().ok())
        .map(|name| DeviceDescriptor { name })
        .collect())
}

/// Lists all available playback devices.
///
/// # Errors
///
/// Returns an error if the audio host cannot be queried.
pub fn list_output_devices() -> Result<Vec<DeviceDescriptor>, EngineError> {
    let host = cpal::default_host();
    let devices = host
        .output_devices()
        .map_err(|e| EngineError::Backend(e.to_string()))?;

    Ok(devices
        .filter_map(|d| d.name().ok())
        .map(|name| DeviceDescriptor { name })
        .collect())
}

/// Resolves a capture device by display name.
///
/// An empty or unmatched name means "no preference", returned as
/// `Ok(None)`; the caller falls back to the system default.
pub fn find_input_device(name: &str) -> Result<Option<Device>, EngineError> {
    if name.is_empty() {
        return Ok(None);
    }
    let host = cpal::default_host();
    let devices = host
        .input_devices()
        .map_err(|e| EngineError::Backend(e.to_string()))?;

    for device in devices {
        if device.name().map(|n| n == name).unwrap_or(false) {
            return Ok(Some(device));
        }
    }
    Ok(None)
}

/// Resolves a playback device by display name.
///
/// Same "no preference" contract as [`find_input_device`].
pub fn find_output_device(name: &str) -> Result<Option<Device>, EngineError> {
    if name.is_empty() {
        return Ok(None);
    }
    let host = cpal::default_host();
    let devices = host
        .output_devices()
        .map_err(|e| EngineError::Backend(e.to_string()))?;

    for device in devices {
        if device.name().map(|n| n == name).unwrap_or(false) {
            return Ok(Some(device));
        }
    }
    Ok(None)
}

/// The system default capture device.
pub fn default_input_device() -> Result<Device, EngineError> {
    cpal::default_host()
        .default_input_device()
        .ok_or(EngineError::NoDefaultDevice { role: "input" })
}

/// The system default playback device.
pub fn default_output_device() -> Result<Device, EngineError> {
    cpal::default_host()
        .default_output_device()
        .ok_or(EngineError::NoDefaultDevice { role: "output" })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_devices_doesnt_panic() {
        // May return empty lists (or Err) on CI machines without audio,
        // but must not panic.
        let _ = list_input_devices();
        let _ = list_output_devices();
    }

    #[test]
    fn test_empty_name_means_no_preference() {
        assert!(matches!(find_input_device(""), Ok(None)));
        assert!(matches!(find_output_device(""), Ok(None)));
    }

    #[test]
    fn test_unmatched_name_means_no_preference() {
        let result = find_output_device("definitely-not-a-real-device-9000");
        assert!(matches!(result, Ok(None) | Err(EngineError::Backend(_))));
    }
}
