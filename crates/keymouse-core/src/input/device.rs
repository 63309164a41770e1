// Keymouse Input Layer - Device Selection
// Keyboard detection and device filtering

use std::collections::HashSet;

/// Name prefix of the virtual devices keymouse creates. Never grabbed during
/// autodetection, or synthetic output would loop back in.
pub const VIRTUAL_DEVICE_PREFIX: &str = "Keymouse (virtual)";

// Q, W, E, R, T, Y
const QWERTY_CODES: &[u16] = &[16, 17, 18, 19, 20, 21];
// SPACE, A, Z
const A_Z_SPACE_CODES: &[u16] = &[57, 30, 44];

/// What we know about an input device before deciding to grab it.
#[derive(Debug, Clone)]
pub struct DeviceCandidate {
    pub name: String,
    pub path: String,
    /// Supported EV_KEY codes; empty when the device has no key capability
    pub supported_keys: HashSet<u16>,
}

impl DeviceCandidate {
    pub fn new(
        name: impl Into<String>,
        path: impl Into<String>,
        supported_keys: impl IntoIterator<Item = u16>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            supported_keys: supported_keys.into_iter().collect(),
        }
    }

    pub fn is_virtual(&self) -> bool {
        self.name.contains(VIRTUAL_DEVICE_PREFIX)
    }
}

/// A device counts as a keyboard when it has the whole QWERTY row plus
/// A, Z and SPACE.
pub fn is_keyboard(supported_keys: &HashSet<u16>) -> bool {
    QWERTY_CODES
        .iter()
        .chain(A_Z_SPACE_CODES)
        .all(|code| supported_keys.contains(code))
}

/// Decide whether to grab a device.
///
/// With an explicit filter, only devices whose name or path is listed are
/// used. Otherwise every real (non-virtual) keyboard is used.
pub fn should_grab(candidate: &DeviceCandidate, filter: &[String]) -> bool {
    if !filter.is_empty() {
        return filter
            .iter()
            .any(|wanted| *wanted == candidate.path || *wanted == candidate.name);
    }

    !candidate.is_virtual() && is_keyboard(&candidate.supported_keys)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyboard(name: &str, path: &str) -> DeviceCandidate {
        let keys = QWERTY_CODES
            .iter()
            .chain(A_Z_SPACE_CODES)
            .copied()
            .chain([1, 29, 42]);
        DeviceCandidate::new(name, path, keys)
    }

    fn mouse() -> DeviceCandidate {
        // BTN_LEFT, BTN_RIGHT, BTN_MIDDLE
        DeviceCandidate::new("Generic Mouse", "/dev/input/event1", [272, 273, 274])
    }

    #[test]
    fn test_is_keyboard() {
        assert!(is_keyboard(&keyboard("kbd", "/dev/input/event0").supported_keys));
        assert!(!is_keyboard(&mouse().supported_keys));
        assert!(!is_keyboard(&HashSet::new()));
    }

    #[test]
    fn test_autodetect_takes_keyboards_only() {
        assert!(should_grab(&keyboard("AT Keyboard", "/dev/input/event0"), &[]));
        assert!(!should_grab(&mouse(), &[]));
    }

    #[test]
    fn test_autodetect_skips_own_virtual_device() {
        let virt = keyboard("Keymouse (virtual) Pointer", "/dev/input/event9");
        assert!(virt.is_virtual());
        assert!(!should_grab(&virt, &[]));
    }

    #[test]
    fn test_filter_matches_path_or_name() {
        let kbd = keyboard("AT Keyboard", "/dev/input/event3");
        assert!(should_grab(&kbd, &["/dev/input/event3".to_string()]));
        assert!(should_grab(&kbd, &["AT Keyboard".to_string()]));
        assert!(!should_grab(&kbd, &["Other".to_string()]));
    }

    #[test]
    fn test_filter_overrides_autodetect() {
        // Explicitly listed devices are used even if they don't look like keyboards
        assert!(should_grab(&mouse(), &["Generic Mouse".to_string()]));
    }
}
