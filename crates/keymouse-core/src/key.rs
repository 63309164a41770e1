// Keymouse Key Identifier
// Logical key codes from Linux input-event-codes.h

use std::fmt;
use std::str::FromStr;

/// Represents a single logical key.
///
/// The numeric values match Linux input-event-codes.h definitions, so the
/// same identifier is used for binding lookups, grab bookkeeping, and
/// synthetic output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct KeyId(pub u16);

/// Canonical names first, aliases after. `KeyId::name` returns the first
/// entry for a code.
const KEY_NAMES: &[(&str, u16)] = &[
    ("ESC", 1),
    ("KEY_1", 2),
    ("KEY_2", 3),
    ("KEY_3", 4),
    ("KEY_4", 5),
    ("KEY_5", 6),
    ("KEY_6", 7),
    ("KEY_7", 8),
    ("KEY_8", 9),
    ("KEY_9", 10),
    ("KEY_0", 11),
    ("MINUS", 12),
    ("EQUAL", 13),
    ("BACKSPACE", 14),
    ("TAB", 15),
    ("Q", 16),
    ("W", 17),
    ("E", 18),
    ("R", 19),
    ("T", 20),
    ("Y", 21),
    ("U", 22),
    ("I", 23),
    ("O", 24),
    ("P", 25),
    ("LEFT_BRACE", 26),
    ("RIGHT_BRACE", 27),
    ("ENTER", 28),
    ("LEFT_CTRL", 29),
    ("A", 30),
    ("S", 31),
    ("D", 32),
    ("F", 33),
    ("G", 34),
    ("H", 35),
    ("J", 36),
    ("K", 37),
    ("L", 38),
    ("SEMICOLON", 39),
    ("APOSTROPHE", 40),
    ("GRAVE", 41),
    ("LEFT_SHIFT", 42),
    ("BACKSLASH", 43),
    ("Z", 44),
    ("X", 45),
    ("C", 46),
    ("V", 47),
    ("B", 48),
    ("N", 49),
    ("M", 50),
    ("COMMA", 51),
    ("DOT", 52),
    ("SLASH", 53),
    ("RIGHT_SHIFT", 54),
    ("KPASTERISK", 55),
    ("LEFT_ALT", 56),
    ("SPACE", 57),
    ("CAPSLOCK", 58),
    ("F1", 59),
    ("F2", 60),
    ("F3", 61),
    ("F4", 62),
    ("F5", 63),
    ("F6", 64),
    ("F7", 65),
    ("F8", 66),
    ("F9", 67),
    ("F10", 68),
    ("NUMLOCK", 69),
    ("SCROLLLOCK", 70),
    ("KP7", 71),
    ("KP8", 72),
    ("KP9", 73),
    ("KPMINUS", 74),
    ("KP4", 75),
    ("KP5", 76),
    ("KP6", 77),
    ("KPPLUS", 78),
    ("KP1", 79),
    ("KP2", 80),
    ("KP3", 81),
    ("KP0", 82),
    ("KPDOT", 83),
    ("F11", 87),
    ("F12", 88),
    ("KPENTER", 96),
    ("RIGHT_CTRL", 97),
    ("KPSLASH", 98),
    ("SYSRQ", 99),
    ("RIGHT_ALT", 100),
    ("HOME", 102),
    ("UP", 103),
    ("PAGE_UP", 104),
    ("LEFT", 105),
    ("RIGHT", 106),
    ("END", 107),
    ("DOWN", 108),
    ("PAGE_DOWN", 109),
    ("INSERT", 110),
    ("DELETE", 111),
    ("PAUSE", 119),
    ("LEFT_META", 125),
    ("RIGHT_META", 126),
    ("COMPOSE", 127),
    ("MENU", 139),
    // Aliases
    ("ESCAPE", 1),
    ("1", 2),
    ("2", 3),
    ("3", 4),
    ("4", 5),
    ("5", 6),
    ("6", 7),
    ("7", 8),
    ("8", 9),
    ("9", 10),
    ("0", 11),
    ("RETURN", 28),
    ("CTRL", 29),
    ("CONTROL", 29),
    ("SHIFT", 42),
    ("ALT", 56),
    ("SUPER", 125),
    ("META", 125),
    ("PRINT", 99),
    ("PGUP", 104),
    ("PGDN", 109),
];

impl KeyId {
    pub const ESC: KeyId = KeyId(1);
    pub const LEFT_CTRL: KeyId = KeyId(29);
    pub const LEFT_SHIFT: KeyId = KeyId(42);
    pub const SPACE: KeyId = KeyId(57);
    pub const UP: KeyId = KeyId(103);
    pub const LEFT: KeyId = KeyId(105);
    pub const RIGHT: KeyId = KeyId(106);
    pub const DOWN: KeyId = KeyId(108);

    /// Get the raw numeric code value
    pub fn code(self) -> u16 {
        self.0
    }

    /// Canonical name, or `None` for codes outside the name table
    pub fn name(self) -> Option<&'static str> {
        KEY_NAMES
            .iter()
            .find(|(_, code)| *code == self.0)
            .map(|(name, _)| *name)
    }

    /// Look a key up by name (case-insensitive, aliases accepted)
    pub fn from_name(name: &str) -> Option<Self> {
        let upper = name.trim().to_ascii_uppercase();
        let upper = upper.strip_prefix("KEY_").filter(|rest| rest.len() > 1).unwrap_or(&upper);
        KEY_NAMES
            .iter()
            .find(|(n, _)| *n == upper || n.strip_prefix("KEY_") == Some(upper))
            .map(|(_, code)| KeyId(*code))
    }
}

impl From<u16> for KeyId {
    fn from(code: u16) -> Self {
        KeyId(code)
    }
}

impl From<KeyId> for u16 {
    fn from(key: KeyId) -> Self {
        key.0
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "KEY({})", self.0),
        }
    }
}

impl FromStr for KeyId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KeyId::from_name(s).ok_or_else(|| format!("Unknown key: {}", s))
    }
}
