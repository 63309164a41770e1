// Keymouse Configuration
// Engine settings consumed once at startup

mod parser;

pub use parser::{default_config_content, Config, ConfigError};

use crate::{BindingTable, KeyId};

/// The four keys arrow mode turns into Up/Left/Down/Right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrowKeys {
    pub up: KeyId,
    pub left: KeyId,
    pub down: KeyId,
    pub right: KeyId,
}

impl ArrowKeys {
    /// Arrow key to emit for a directional key, if it is one
    pub fn arrow_for(&self, key: KeyId) -> Option<KeyId> {
        if key == self.up {
            Some(KeyId::UP)
        } else if key == self.left {
            Some(KeyId::LEFT)
        } else if key == self.down {
            Some(KeyId::DOWN)
        } else if key == self.right {
            Some(KeyId::RIGHT)
        } else {
            None
        }
    }
}

/// Keys with a fixed meaning to the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeKeys {
    /// Dual-role key holding mouse mode
    pub mouse_mode: KeyId,
    /// Dual-role key holding arrow mode
    pub arrow_mode: KeyId,
    pub control: KeyId,
    pub shift: KeyId,
    pub arrows: ArrowKeys,
}

/// Everything the router and integrator need, immutable once built.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub keys: ModeKeys,
    pub bindings: BindingTable,
    /// Releasing any of these shuts keymouse down
    pub exit_keys: Vec<KeyId>,
    pub default_speed: u32,
    /// Integrator ticks per second
    pub tick_rate: u32,
    pub scroll_nudge: bool,
}
