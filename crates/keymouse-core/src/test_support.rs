// Keymouse Test Support
// In-memory input source and recording sink for unit tests

use std::collections::{HashSet, VecDeque};

use crate::input::{InputError, InputSource, KeyEvent};
use crate::output::{OutputError, OutputSink};
use crate::{Button, KeyId};

/// One call made on a [`RecordingSink`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Emitted {
    Warp(f64, f64),
    Button(Button, bool),
    Key(KeyId, bool),
}

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub emitted: Vec<Emitted>,
    pub shut_down: bool,
    /// Fail every call once this many events have been recorded
    pub fail_after: Option<usize>,
}

impl RecordingSink {
    fn record(&mut self, event: Emitted) -> Result<(), OutputError> {
        if let Some(limit) = self.fail_after {
            if self.emitted.len() >= limit {
                return Err(OutputError::Write("recording sink full".to_string()));
            }
        }
        self.emitted.push(event);
        Ok(())
    }

    pub fn keys(&self) -> Vec<(KeyId, bool)> {
        self.emitted
            .iter()
            .filter_map(|e| match *e {
                Emitted::Key(key, pressed) => Some((key, pressed)),
                _ => None,
            })
            .collect()
    }
}

impl OutputSink for RecordingSink {
    fn warp_relative(&mut self, dx: f64, dy: f64) -> Result<(), OutputError> {
        self.record(Emitted::Warp(dx, dy))
    }

    fn button_event(&mut self, button: Button, pressed: bool) -> Result<(), OutputError> {
        self.record(Emitted::Button(button, pressed))
    }

    fn key_event(&mut self, key: KeyId, pressed: bool) -> Result<(), OutputError> {
        self.record(Emitted::Key(key, pressed))
    }

    fn shutdown(&mut self) -> Result<(), OutputError> {
        self.shut_down = true;
        Ok(())
    }
}

/// Listen bookkeeping call made on a [`ScriptedInput`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenCall {
    Listen(KeyId),
    StopListen(KeyId),
}

/// Replays a fixed list of events, then reports the source closed.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    pub events: VecDeque<KeyEvent>,
    pub held: Vec<KeyId>,
    pub listening: HashSet<KeyId>,
    pub calls: Vec<ListenCall>,
    pub shut_down: bool,
}

impl ScriptedInput {
    pub fn new(events: impl IntoIterator<Item = KeyEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
            ..Self::default()
        }
    }
}

impl InputSource for ScriptedInput {
    fn next_event(&mut self) -> Result<KeyEvent, InputError> {
        self.events.pop_front().ok_or(InputError::Closed)
    }

    fn initial_held_keys(&mut self) -> Result<Vec<KeyId>, InputError> {
        Ok(self.held.clone())
    }

    fn listen(&mut self, key: KeyId) {
        self.listening.insert(key);
        self.calls.push(ListenCall::Listen(key));
    }

    fn stop_listen(&mut self, key: KeyId) {
        self.listening.remove(&key);
        self.calls.push(ListenCall::StopListen(key));
    }

    fn shutdown(&mut self) {
        self.shut_down = true;
    }
}
