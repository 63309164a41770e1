// Shared helpers for the engine scenario tests

#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};

use keymouse_core::{
    ArrowKeys, Binding, BindingTable, Button, EngineConfig, InputError, InputSource, KeyEvent,
    KeyId, ModeKeys, OutputError, OutputSink,
};

pub const D: KeyId = KeyId(32);
pub const F: KeyId = KeyId(33);
pub const A: KeyId = KeyId(30);
pub const C: KeyId = KeyId(46);
pub const R: KeyId = KeyId(19);
pub const W: KeyId = KeyId(17);
pub const I: KeyId = KeyId(23);
pub const J: KeyId = KeyId(36);
pub const K: KeyId = KeyId(37);
pub const L: KeyId = KeyId(38);
pub const U: KeyId = KeyId(22);
pub const O: KeyId = KeyId(24);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Output {
    Warp(f64, f64),
    Button(Button, bool),
    Key(KeyId, bool),
}

#[derive(Debug, Default)]
pub struct Recorder {
    pub log: Vec<Output>,
    pub closed: bool,
}

impl Recorder {
    pub fn keys(&self) -> Vec<(KeyId, bool)> {
        self.log
            .iter()
            .filter_map(|o| match *o {
                Output::Key(key, pressed) => Some((key, pressed)),
                _ => None,
            })
            .collect()
    }

    pub fn button_presses(&self, button: Button) -> usize {
        self.log
            .iter()
            .filter(|o| **o == Output::Button(button, true))
            .count()
    }

    pub fn total_warp(&self) -> (f64, f64) {
        self.log.iter().fold((0.0, 0.0), |(x, y), o| match *o {
            Output::Warp(dx, dy) => (x + dx, y + dy),
            _ => (x, y),
        })
    }
}

impl OutputSink for Recorder {
    fn warp_relative(&mut self, dx: f64, dy: f64) -> Result<(), OutputError> {
        self.log.push(Output::Warp(dx, dy));
        Ok(())
    }

    fn button_event(&mut self, button: Button, pressed: bool) -> Result<(), OutputError> {
        self.log.push(Output::Button(button, pressed));
        Ok(())
    }

    fn key_event(&mut self, key: KeyId, pressed: bool) -> Result<(), OutputError> {
        self.log.push(Output::Key(key, pressed));
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), OutputError> {
        self.closed = true;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct Script {
    pub events: VecDeque<KeyEvent>,
    pub held: Vec<KeyId>,
    pub listening: HashSet<KeyId>,
    pub closed: bool,
}

impl Script {
    pub fn new(events: impl IntoIterator<Item = KeyEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
            ..Self::default()
        }
    }
}

impl InputSource for Script {
    fn next_event(&mut self) -> Result<KeyEvent, InputError> {
        self.events.pop_front().ok_or(InputError::Closed)
    }

    fn initial_held_keys(&mut self) -> Result<Vec<KeyId>, InputError> {
        Ok(self.held.clone())
    }

    fn listen(&mut self, key: KeyId) {
        self.listening.insert(key);
    }

    fn stop_listen(&mut self, key: KeyId) {
        self.listening.remove(&key);
    }

    fn shutdown(&mut self) {
        self.closed = true;
    }
}

pub fn press(key: KeyId) -> KeyEvent {
    KeyEvent::press(key)
}

pub fn release(key: KeyId) -> KeyEvent {
    KeyEvent::release(key)
}

/// Mouse mode on D, arrow mode on SPACE, IJKL arrows, speed 10 at 60 Hz
pub fn engine_config(bindings: Vec<Binding>) -> EngineConfig {
    EngineConfig {
        keys: ModeKeys {
            mouse_mode: D,
            arrow_mode: KeyId::SPACE,
            control: KeyId::LEFT_CTRL,
            shift: KeyId::LEFT_SHIFT,
            arrows: ArrowKeys {
                up: I,
                left: J,
                down: K,
                right: L,
            },
        },
        bindings: BindingTable::new(bindings),
        exit_keys: vec![KeyId::ESC],
        default_speed: 10,
        tick_rate: 60,
        scroll_nudge: false,
    }
}

pub fn standard_bindings() -> Vec<Binding> {
    vec![
        Binding::Move { key: L, dx: 1.0, dy: 0.0 },
        Binding::Move { key: J, dx: -1.0, dy: 0.0 },
        Binding::Move { key: I, dx: 0.0, dy: -1.0 },
        Binding::Move { key: K, dx: 0.0, dy: 1.0 },
        Binding::Click { key: F, button: Button::Left },
        Binding::Scroll { key: R, dx: 0.0, dy: -10.0 },
        Binding::Scroll { key: W, dx: -10.0, dy: 0.0 },
        Binding::Speed { key: A, speed: 100 },
        Binding::Speed { key: C, speed: 20 },
    ]
}
