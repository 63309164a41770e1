// Keymouse Binding Table
// Immutable move/click/scroll/speed bindings indexed by key

use indexmap::IndexMap;
use smallvec::SmallVec;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use crate::KeyId;

/// Pointer button, numbered the way X11 numbers them.
///
/// Buttons 4..7 are the wheel: one press+release is one scroll click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Button {
    Left,
    Middle,
    Right,
    ScrollUp,
    ScrollDown,
    ScrollLeft,
    ScrollRight,
    Back,
    Forward,
}

impl Button {
    /// X11 button number (1 = left, 4/5 = vertical wheel, ...)
    pub fn x11_number(self) -> u8 {
        match self {
            Button::Left => 1,
            Button::Middle => 2,
            Button::Right => 3,
            Button::ScrollUp => 4,
            Button::ScrollDown => 5,
            Button::ScrollLeft => 6,
            Button::ScrollRight => 7,
            Button::Back => 8,
            Button::Forward => 9,
        }
    }

    pub fn from_x11(number: u8) -> Option<Self> {
        Button::iter().find(|b| b.x11_number() == number)
    }

    /// Wheel direction if this is one of the scroll buttons
    pub fn scroll_direction(self) -> Option<ScrollDirection> {
        match self {
            Button::ScrollUp => Some(ScrollDirection::Up),
            Button::ScrollDown => Some(ScrollDirection::Down),
            Button::ScrollLeft => Some(ScrollDirection::Left),
            Button::ScrollRight => Some(ScrollDirection::Right),
            _ => None,
        }
    }
}

/// One discrete wheel click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

impl ScrollDirection {
    pub fn button(self) -> Button {
        match self {
            ScrollDirection::Up => Button::ScrollUp,
            ScrollDirection::Down => Button::ScrollDown,
            ScrollDirection::Left => Button::ScrollLeft,
            ScrollDirection::Right => Button::ScrollRight,
        }
    }
}

/// A single entry of one of the four binding tables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Binding {
    /// Adds `(dx, dy)` to pointer velocity while held
    Move { key: KeyId, dx: f64, dy: f64 },
    /// Mirrors the key's press/release onto a pointer button
    Click { key: KeyId, button: Button },
    /// Adds `(dx, dy)` to scroll velocity while held
    Scroll { key: KeyId, dx: f64, dy: f64 },
    /// Sets the speed multiplier on press, restores the default on release
    Speed { key: KeyId, speed: u32 },
}

impl Binding {
    pub fn key(&self) -> KeyId {
        match *self {
            Binding::Move { key, .. }
            | Binding::Click { key, .. }
            | Binding::Scroll { key, .. }
            | Binding::Speed { key, .. } => key,
        }
    }

    /// Dispatch rank: move, click, scroll, speed
    fn rank(&self) -> u8 {
        match self {
            Binding::Move { .. } => 0,
            Binding::Click { .. } => 1,
            Binding::Scroll { .. } => 2,
            Binding::Speed { .. } => 3,
        }
    }
}

/// All bindings for one key, in dispatch order.
pub type KeyBindings = SmallVec<[Binding; 2]>;

/// Read-only lookup from key to every binding it triggers.
///
/// Built once at startup. Several bindings may share a key; all of them fire,
/// moves first, then clicks, scrolls and speeds, each group in
/// configuration order.
#[derive(Debug, Clone, Default)]
pub struct BindingTable {
    by_key: IndexMap<KeyId, KeyBindings>,
    len: usize,
}

impl BindingTable {
    pub fn new(bindings: impl IntoIterator<Item = Binding>) -> Self {
        let mut ordered: Vec<Binding> = bindings.into_iter().collect();
        // Stable: configuration order survives inside each group.
        ordered.sort_by_key(Binding::rank);

        let len = ordered.len();
        let mut by_key: IndexMap<KeyId, KeyBindings> = IndexMap::new();
        for binding in ordered {
            by_key.entry(binding.key()).or_default().push(binding);
        }
        Self { by_key, len }
    }

    /// Bindings triggered by `key` (empty for unbound keys)
    pub fn lookup(&self, key: KeyId) -> &[Binding] {
        self.by_key.get(&key).map(|b| b.as_slice()).unwrap_or(&[])
    }

    /// Distinct bound keys, in first-seen order
    pub fn keys(&self) -> impl Iterator<Item = KeyId> + '_ {
        self.by_key.keys().copied()
    }

    /// Total number of bindings across all tables
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
