// Keymouse Dual-Role Keys
// Tap-vs-hold decision for keys that double as mode toggles

use crate::KeyId;

/// What the caller must do after feeding an event to a [`DualRoleKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The event did not change the mode
    Unchanged,
    /// The target key went down: the mode is now held
    Entered,
    /// The target key came up. `tap` is set when nothing else happened while
    /// it was held, so the key's ordinary meaning must be replayed.
    Left { tap: bool },
}

/// A key that enters a mode while held and types itself when tapped.
///
/// One instance per mode key; the target key is supplied on every update so
/// the same type serves the mouse-mode and arrow-mode keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DualRoleKey {
    active: bool,
    secondary_role_used: bool,
}

impl DualRoleKey {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Only meaningful while active
    pub fn secondary_role_used(&self) -> bool {
        self.secondary_role_used
    }

    /// Feed one key event.
    ///
    /// Any other key seen while active disqualifies the tap. The flag is reset
    /// whenever the target key itself goes up or down.
    pub fn update(&mut self, key: KeyId, target: KeyId, pressed: bool) -> Transition {
        if key != target {
            if self.active {
                self.secondary_role_used = true;
            }
            return Transition::Unchanged;
        }

        let tap = !pressed && self.active && !self.secondary_role_used;
        self.active = pressed;
        self.secondary_role_used = false;

        if pressed {
            Transition::Entered
        } else {
            Transition::Left { tap }
        }
    }
}
