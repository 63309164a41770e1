// Keymouse Input Layer
// Key event source capability and grab bookkeeping

mod device;
#[cfg(feature = "evdev-backend")]
mod evdev_source;
mod grab;

pub use device::{is_keyboard, should_grab, DeviceCandidate, VIRTUAL_DEVICE_PREFIX};
#[cfg(feature = "evdev-backend")]
pub use evdev_source::{DeviceInfo, EvdevInput};
pub use grab::{Delivery, GrabSet, GrabTracker};

use std::fmt;

use crate::KeyId;

/// A single key press or release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub key: KeyId,
    pub pressed: bool,
}

impl KeyEvent {
    pub fn press(key: KeyId) -> Self {
        Self { key, pressed: true }
    }

    pub fn release(key: KeyId) -> Self {
        Self { key, pressed: false }
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = if self.pressed { "press" } else { "release" };
        write!(f, "{} {}", self.key, action)
    }
}

/// Errors that can occur while reading input
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The shared running flag was cleared (signal or integrator failure)
    #[error("Input interrupted")]
    Interrupted,

    /// No more events will ever arrive
    #[error("Input source closed")]
    Closed,

    #[error("Passthrough failed: {0}")]
    Passthrough(#[from] crate::output::OutputError),
}

/// Delivers key events for the keys the engine listens for.
pub trait InputSource {
    /// Block until the next key event
    fn next_event(&mut self) -> Result<KeyEvent, InputError>;

    /// Keys already held down when the engine starts
    fn initial_held_keys(&mut self) -> Result<Vec<KeyId>, InputError>;

    /// Start intercepting `key` (idempotent)
    fn listen(&mut self, key: KeyId);

    /// Stop intercepting `key` (idempotent)
    fn stop_listen(&mut self, key: KeyId);

    /// Release every grab
    fn shutdown(&mut self) {}
}
