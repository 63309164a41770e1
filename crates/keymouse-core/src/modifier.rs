// Keymouse Modifier Tracker
// Held-state of the Control and Shift keys while a mode key is down

use crate::KeyId;

/// Tracks whether Control and Shift are held.
///
/// Only updated while a dual-role key listens for the modifiers; cleared when
/// the mode key is released.
#[derive(Debug, Clone)]
pub struct ModifierTracker {
    control_key: KeyId,
    shift_key: KeyId,
    control: bool,
    shift: bool,
}

impl ModifierTracker {
    pub fn new(control_key: KeyId, shift_key: KeyId) -> Self {
        Self {
            control_key,
            shift_key,
            control: false,
            shift: false,
        }
    }

    /// Record a press or release; keys other than the two modifiers are ignored.
    pub fn on_key_event(&mut self, key: KeyId, pressed: bool) {
        if key == self.control_key {
            self.control = pressed;
        }
        if key == self.shift_key {
            self.shift = pressed;
        }
    }

    /// Keys of the modifiers currently held, Control before Shift
    pub fn held_keys(&self) -> Vec<KeyId> {
        let mut held = Vec::with_capacity(2);
        if self.control {
            held.push(self.control_key);
        }
        if self.shift {
            held.push(self.shift_key);
        }
        held
    }

    /// Both tracked modifier keys
    pub fn keys(&self) -> [KeyId; 2] {
        [self.control_key, self.shift_key]
    }

    pub fn clear(&mut self) {
        self.control = false;
        self.shift = false;
    }
}
