// Keymouse uinput Output Layer
// Virtual pointer/keyboard device for synthetic motion, clicks and keys

use std::collections::HashSet;

use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{AttributeSet, EventType, InputEvent, RelativeAxisType};

use super::{OutputError, OutputSink, SubpixelAccumulator};
use crate::input::{GrabSet, VIRTUAL_DEVICE_PREFIX};
use crate::{Button, KeyId, ScrollDirection};

/// uinput device that the rest of the desktop sees as a mouse plus keyboard.
pub struct UinputSink {
    device: VirtualDevice,
    grabs: GrabSet,
    subpixel: SubpixelAccumulator,
    pressed_keys: HashSet<KeyId>,
    pressed_buttons: HashSet<Button>,
}

fn button_code(button: Button) -> Option<evdev::Key> {
    match button {
        Button::Left => Some(evdev::Key::BTN_LEFT),
        Button::Middle => Some(evdev::Key::BTN_MIDDLE),
        Button::Right => Some(evdev::Key::BTN_RIGHT),
        Button::Back => Some(evdev::Key::BTN_SIDE),
        Button::Forward => Some(evdev::Key::BTN_EXTRA),
        Button::ScrollUp | Button::ScrollDown | Button::ScrollLeft | Button::ScrollRight => None,
    }
}

fn wheel_step(direction: ScrollDirection) -> (RelativeAxisType, i32) {
    match direction {
        ScrollDirection::Up => (RelativeAxisType::REL_WHEEL, 1),
        ScrollDirection::Down => (RelativeAxisType::REL_WHEEL, -1),
        ScrollDirection::Left => (RelativeAxisType::REL_HWHEEL, -1),
        ScrollDirection::Right => (RelativeAxisType::REL_HWHEEL, 1),
    }
}

fn creation_error(e: std::io::Error) -> OutputError {
    OutputError::DeviceCreation(e.to_string())
}

impl UinputSink {
    /// Create the virtual device.
    ///
    /// `grabs` is the set shared with the input side: synthetic events for
    /// keys in it are swallowed.
    pub fn new(grabs: GrabSet) -> Result<Self, OutputError> {
        let mut keys = AttributeSet::<evdev::Key>::new();
        for code in 1..256u16 {
            keys.insert(evdev::Key::new(code));
        }
        for button in [
            Button::Left,
            Button::Middle,
            Button::Right,
            Button::Back,
            Button::Forward,
        ] {
            if let Some(code) = button_code(button) {
                keys.insert(code);
            }
        }

        let mut axes = AttributeSet::<RelativeAxisType>::new();
        axes.insert(RelativeAxisType::REL_X);
        axes.insert(RelativeAxisType::REL_Y);
        axes.insert(RelativeAxisType::REL_WHEEL);
        axes.insert(RelativeAxisType::REL_HWHEEL);

        let name = format!("{} Pointer", VIRTUAL_DEVICE_PREFIX);
        let device = VirtualDeviceBuilder::new()
            .map_err(creation_error)?
            .name(&name)
            .with_keys(&keys)
            .map_err(creation_error)?
            .with_relative_axes(&axes)
            .map_err(creation_error)?
            .build()
            .map_err(creation_error)?;

        log::info!("Created virtual device '{}'", name);

        Ok(Self {
            device,
            grabs,
            subpixel: SubpixelAccumulator::new(),
            pressed_keys: HashSet::new(),
            pressed_buttons: HashSet::new(),
        })
    }

    fn emit(&mut self, events: &[InputEvent]) -> Result<(), OutputError> {
        self.device
            .emit(events)
            .map_err(|e| OutputError::Write(e.to_string()))
    }

    fn write_key(&mut self, code: u16, pressed: bool) -> Result<(), OutputError> {
        let event = InputEvent::new(EventType::KEY, code, i32::from(pressed));
        self.emit(&[event])
    }

    /// Re-emit a physical key event the engine does not handle.
    ///
    /// Unlike [`OutputSink::key_event`] this ignores the grab set: the event
    /// comes from a real keypress that must reach the desktop.
    pub fn forward_key(&mut self, key: KeyId, pressed: bool) -> Result<(), OutputError> {
        self.write_key(key.code(), pressed)?;
        if pressed {
            self.pressed_keys.insert(key);
        } else {
            self.pressed_keys.remove(&key);
        }
        Ok(())
    }
}

impl OutputSink for UinputSink {
    fn warp_relative(&mut self, dx: f64, dy: f64) -> Result<(), OutputError> {
        let (x, y) = self.subpixel.push(dx, dy);
        let mut events = Vec::with_capacity(2);
        if x != 0 {
            events.push(InputEvent::new(EventType::RELATIVE, RelativeAxisType::REL_X.0, x));
        }
        if y != 0 {
            events.push(InputEvent::new(EventType::RELATIVE, RelativeAxisType::REL_Y.0, y));
        }
        if events.is_empty() {
            return Ok(());
        }
        self.emit(&events)
    }

    fn button_event(&mut self, button: Button, pressed: bool) -> Result<(), OutputError> {
        if let Some(direction) = button.scroll_direction() {
            // A wheel click is a single relative step; the release is implied.
            if !pressed {
                return Ok(());
            }
            let (axis, value) = wheel_step(direction);
            return self.emit(&[InputEvent::new(EventType::RELATIVE, axis.0, value)]);
        }

        let Some(code) = button_code(button) else {
            return Ok(());
        };
        self.write_key(code.code(), pressed)?;
        if pressed {
            self.pressed_buttons.insert(button);
        } else {
            self.pressed_buttons.remove(&button);
        }
        Ok(())
    }

    fn key_event(&mut self, key: KeyId, pressed: bool) -> Result<(), OutputError> {
        if self.grabs.contains(key) {
            log::trace!("Swallowed synthetic {} (grabbed)", key);
            return Ok(());
        }
        self.forward_key(key, pressed)
    }

    fn shutdown(&mut self) -> Result<(), OutputError> {
        let buttons: Vec<Button> = self.pressed_buttons.drain().collect();
        for button in buttons {
            if let Some(code) = button_code(button) {
                self.write_key(code.code(), false)?;
            }
        }
        let keys: Vec<KeyId> = self.pressed_keys.drain().collect();
        for key in keys {
            self.write_key(key.code(), false)?;
        }
        log::info!("Virtual device released");
        Ok(())
    }
}
