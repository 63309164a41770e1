// Keymouse Grab Set
// Keys the engine currently intercepts, shared by the input and output sides

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::KeyId;

/// The set of keys currently listened for.
///
/// The input side consults it to decide which physical events the engine
/// sees. The output side consults it to swallow synthetic events for keys
/// that are grabbed, the way a passive key grab would intercept them.
#[derive(Debug, Clone, Default)]
pub struct GrabSet(Arc<RwLock<HashSet<KeyId>>>);

impl GrabSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the key was not already grabbed
    pub fn insert(&self, key: KeyId) -> bool {
        self.0.write().insert(key)
    }

    /// Returns true if the key was grabbed
    pub fn remove(&self, key: KeyId) -> bool {
        self.0.write().remove(&key)
    }

    pub fn contains(&self, key: KeyId) -> bool {
        self.0.read().contains(&key)
    }

    pub fn clear(&self) {
        self.0.write().clear();
    }
}

/// Where a physical key event goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Handled by the engine, hidden from the desktop
    Engine,
    /// Re-emitted unchanged on the virtual keyboard
    Forward,
}

/// Decides per physical event whether the engine or the desktop gets it.
///
/// Pressing a grabbed key starts an active grab: until every grabbed key
/// that went down is back up, all keys go to the engine. A key whose press
/// was forwarded always has its release forwarded too, so nothing is left
/// stuck on the virtual keyboard.
#[derive(Debug, Clone, Default)]
pub struct GrabTracker {
    held_grabbed: HashSet<KeyId>,
    forwarded: HashSet<KeyId>,
}

impl GrabTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn classify(&mut self, grabs: &GrabSet, key: KeyId, pressed: bool) -> Delivery {
        if !pressed {
            if self.forwarded.remove(&key) {
                return Delivery::Forward;
            }
            self.held_grabbed.remove(&key);
            return Delivery::Engine;
        }

        if grabs.contains(key) {
            self.held_grabbed.insert(key);
            return Delivery::Engine;
        }
        if self.is_active() {
            return Delivery::Engine;
        }
        self.forwarded.insert(key);
        Delivery::Forward
    }

    /// Account for keys that were already down before the devices were
    /// grabbed. Grabbed ones start an active grab exactly as if their
    /// press had just arrived.
    pub fn seed_held(&mut self, grabs: &GrabSet, held: &[KeyId]) {
        for &key in held {
            if grabs.contains(key) {
                self.held_grabbed.insert(key);
            }
        }
    }

    /// True while a grabbed key is held down
    pub fn is_active(&self) -> bool {
        !self.held_grabbed.is_empty()
    }
}
