//! Camera device registry.
//!
//! The platform device list is an external, time-varying resource: devices
//! appear and disappear as hardware is plugged and unplugged. Lookups here
//! always query the platform fresh rather than caching a list.

use std::fmt;

use nokhwa::query;
use nokhwa::utils::ApiBackend;

use crate::capture::CaptureError;

/// A physical camera device discovered from the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceHandle {
    /// Ordinal among the currently enumerated camera devices.
    pub index: u32,
    /// Human-readable device name.
    pub name: String,
    /// Stable unique identifier for the device.
    pub unique_id: String,
}

impl fmt::Display for DeviceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({})", self.index, self.name, self.unique_id)
    }
}

/// List all available camera devices on the system.
///
/// Returns an empty vector when no cameras are present (not an error).
pub fn list_devices() -> Result<Vec<DeviceHandle>, CaptureError> {
    let devices =
        query(ApiBackend::Auto).map_err(|e| CaptureError::QueryFailed(e.to_string()))?;

    Ok(devices
        .into_iter()
        .map(|d| DeviceHandle {
            index: d.index().as_index().unwrap_or(0),
            name: d.human_name(),
            unique_id: d.description().to_string(),
        })
        .collect())
}

/// Look up the device at the given ordinal, clamping to the enumerated range.
///
/// An index past the end of the list returns the last device (when any
/// exist); a negative index or an empty list returns `None`. Enumeration
/// failure also degrades to `None` — callers treat a missing handle as a
/// no-op, never an error.
pub fn device_at(index: i32) -> Option<DeviceHandle> {
    let mut devices = list_devices().ok()?;
    let i = clamp_index(index, devices.len())?;
    Some(devices.swap_remove(i))
}

/// Clamp an ordinal into `0..count`, or reject it.
fn clamp_index(index: i32, count: usize) -> Option<usize> {
    if index < 0 || count == 0 {
        return None;
    }
    Some((index as usize).min(count - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_devices_does_not_error() {
        // Should not error even if no cameras are present
        // (returns empty list instead)
        let result = list_devices();
        assert!(result.is_ok());
    }

    #[test]
    fn test_clamp_index_in_range() {
        assert_eq!(clamp_index(0, 2), Some(0));
        assert_eq!(clamp_index(1, 2), Some(1));
    }

    #[test]
    fn test_clamp_index_past_end_returns_last() {
        assert_eq!(clamp_index(2, 2), Some(1));
        assert_eq!(clamp_index(99, 3), Some(2));
        assert_eq!(clamp_index(1, 1), Some(0));
    }

    #[test]
    fn test_clamp_index_negative_returns_none() {
        assert_eq!(clamp_index(-1, 2), None);
        assert_eq!(clamp_index(i32::MIN, 2), None);
    }

    #[test]
    fn test_clamp_index_empty_list_returns_none() {
        assert_eq!(clamp_index(0, 0), None);
        assert_eq!(clamp_index(5, 0), None);
    }

    #[test]
    fn test_device_handle_display() {
        let device = DeviceHandle {
            index: 0,
            name: "Integrated Camera".to_string(),
            unique_id: "usb-0000:00:14.0-5".to_string(),
        };
        assert_eq!(
            format!("{}", device),
            "[0] Integrated Camera (usb-0000:00:14.0-5)"
        );
    }
}
