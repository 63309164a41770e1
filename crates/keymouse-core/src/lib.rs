// Keymouse Core Library
// Keyboard-driven pointer engine: dual-role keys, bindings, motion integration

pub mod binding;
pub mod config;
pub mod dual_role;
pub mod input;
pub mod integrator;
pub mod key;
pub mod modifier;
pub mod motion;
pub mod output;
pub mod router;

#[cfg(test)]
mod test_support;

pub use binding::{Binding, BindingTable, Button, KeyBindings, ScrollDirection};
pub use config::{ArrowKeys, Config, ConfigError, EngineConfig, ModeKeys};
pub use dual_role::{DualRoleKey, Transition};
pub use input::{InputError, InputSource, KeyEvent};
pub use integrator::{MotionIntegrator, TickOutput};
pub use key::KeyId;
pub use modifier::ModifierTracker;
pub use motion::{MotionState, SharedMotion, Velocity};
pub use output::{OutputError, OutputSink, SharedSink};
pub use router::{EngineError, EventRouter, ExitReason};
