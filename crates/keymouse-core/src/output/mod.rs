// Keymouse Output Layer
// Pointer/button/key emission capability and its thread-safe handle

mod subpixel;
#[cfg(feature = "evdev-backend")]
mod uinput;

pub use subpixel::SubpixelAccumulator;
#[cfg(feature = "evdev-backend")]
pub use uinput::UinputSink;

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::{Button, KeyId};

/// Error types for output operations
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("Failed to create virtual device: {0}")]
    DeviceCreation(String),

    #[error("Failed to write event: {0}")]
    Write(String),
}

/// Executes pointer motion, button clicks and synthetic key events.
pub trait OutputSink {
    /// Move the pointer by a (possibly fractional) relative amount
    fn warp_relative(&mut self, dx: f64, dy: f64) -> Result<(), OutputError>;

    fn button_event(&mut self, button: Button, pressed: bool) -> Result<(), OutputError>;

    /// A single key edge
    fn key_event(&mut self, key: KeyId, pressed: bool) -> Result<(), OutputError>;

    /// Press then release `key`
    fn key_tap(&mut self, key: KeyId) -> Result<(), OutputError> {
        self.key_event(key, true)?;
        self.key_event(key, false)
    }

    /// Release anything still held and close the device
    fn shutdown(&mut self) -> Result<(), OutputError> {
        Ok(())
    }
}

/// One sink shared by the router and the integrator.
///
/// Every call takes the lock for its whole duration, so a tap is never
/// interleaved with pointer motion from the other thread.
#[derive(Debug)]
pub struct SharedSink<S>(Arc<Mutex<S>>);

impl<S> SharedSink<S> {
    pub fn new(sink: S) -> Self {
        Self(Arc::new(Mutex::new(sink)))
    }

    pub fn lock(&self) -> MutexGuard<'_, S> {
        self.0.lock()
    }
}

impl<S> Clone for SharedSink<S> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<S: OutputSink> OutputSink for SharedSink<S> {
    fn warp_relative(&mut self, dx: f64, dy: f64) -> Result<(), OutputError> {
        self.0.lock().warp_relative(dx, dy)
    }

    fn button_event(&mut self, button: Button, pressed: bool) -> Result<(), OutputError> {
        self.0.lock().button_event(button, pressed)
    }

    fn key_event(&mut self, key: KeyId, pressed: bool) -> Result<(), OutputError> {
        self.0.lock().key_event(key, pressed)
    }

    fn key_tap(&mut self, key: KeyId) -> Result<(), OutputError> {
        self.0.lock().key_tap(key)
    }

    fn shutdown(&mut self) -> Result<(), OutputError> {
        self.0.lock().shutdown()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Emitted, RecordingSink};

    #[test]
    fn test_default_tap_is_press_then_release() {
        let mut sink = RecordingSink::default();
        sink.key_tap(KeyId::SPACE).unwrap();
        assert_eq!(
            sink.emitted,
            vec![
                Emitted::Key(KeyId::SPACE, true),
                Emitted::Key(KeyId::SPACE, false)
            ]
        );
    }

    #[test]
    fn test_shared_sink_forwards_to_one_device() {
        let shared = SharedSink::new(RecordingSink::default());
        let mut a = shared.clone();
        let mut b = shared.clone();
        a.button_event(Button::Left, true).unwrap();
        b.warp_relative(1.5, -2.0).unwrap();
        a.button_event(Button::Left, false).unwrap();

        assert_eq!(
            shared.lock().emitted,
            vec![
                Emitted::Button(Button::Left, true),
                Emitted::Warp(1.5, -2.0),
                Emitted::Button(Button::Left, false),
            ]
        );
    }
}
