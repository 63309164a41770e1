// Keymouse Config Parser - TOML with Serde
// Parses binding tables and engine settings from TOML files

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::{ArrowKeys, EngineConfig, ModeKeys};
use crate::{Binding, BindingTable, Button, KeyId};

const DEFAULT_TICK_RATE: u32 = 60;
const DEFAULT_SPEED: u32 = 500;

/// Configuration parser errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Invalid button: {0}")]
    InvalidButton(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

/// Root TOML table
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigToml {
    #[serde(default)]
    general: GeneralToml,

    #[serde(default)]
    motion: MotionToml,

    #[serde(default)]
    arrows: ArrowsToml,

    #[serde(default, rename = "move")]
    moves: Vec<MoveToml>,

    #[serde(default, rename = "click")]
    clicks: Vec<ClickToml>,

    #[serde(default, rename = "scroll")]
    scrolls: Vec<ScrollToml>,

    #[serde(default, rename = "speed")]
    speeds: Vec<SpeedToml>,

    #[serde(default)]
    devices: DevicesToml,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct GeneralToml {
    mouse_mode_key: Option<String>,
    arrow_mode_key: Option<String>,
    control_key: Option<String>,
    shift_key: Option<String>,
    exit_keys: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct MotionToml {
    tick_rate: Option<u32>,
    default_speed: Option<u32>,
    scroll_nudge: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ArrowsToml {
    up: Option<String>,
    left: Option<String>,
    down: Option<String>,
    right: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct MoveToml {
    key: String,
    #[serde(default)]
    dx: f64,
    #[serde(default)]
    dy: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ClickToml {
    key: String,
    button: ButtonToml,
}

/// Buttons are given by name or by X11 number
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ButtonToml {
    Number(u8),
    Name(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScrollToml {
    key: String,
    #[serde(default)]
    dx: f64,
    #[serde(default)]
    dy: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct SpeedToml {
    key: String,
    speed: u32,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct DevicesToml {
    #[serde(default)]
    only: Vec<String>,
}

/// Parsed and validated configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub engine: EngineConfig,
    /// Explicit device names/paths; empty means autodetect keyboards
    pub device_filter: Vec<String>,
    /// Where this configuration came from, if a file
    pub source_path: Option<PathBuf>,
}

fn parse_key(context: &str, name: &str) -> Result<KeyId, ConfigError> {
    KeyId::from_name(name).ok_or_else(|| ConfigError::InvalidKey(format!("{}: '{}'", context, name)))
}

fn parse_key_or(context: &str, name: Option<&str>, default: &str) -> Result<KeyId, ConfigError> {
    parse_key(context, name.unwrap_or(default))
}

fn parse_button(context: &str, button: &ButtonToml) -> Result<Button, ConfigError> {
    match button {
        ButtonToml::Number(n) => Button::from_x11(*n)
            .ok_or_else(|| ConfigError::InvalidButton(format!("{}: {}", context, n))),
        ButtonToml::Name(name) => name
            .parse::<Button>()
            .map_err(|_| ConfigError::InvalidButton(format!("{}: '{}'", context, name))),
    }
}

/// Largest accepted |dx| or |dy|; keeps summed fixed-point velocity far
/// from the i64 range.
const MAX_DELTA: f64 = 1e6;

/// Smallest nonzero |dx| or |dy|, one fixed-point step.
const MIN_DELTA: f64 = 1.0 / 65536.0;

fn check_component(context: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::InvalidValue(format!("{}: non-finite delta", context)));
    }
    let magnitude = value.abs();
    if magnitude > MAX_DELTA {
        return Err(ConfigError::InvalidValue(format!(
            "{}: delta {} exceeds {}",
            context, value, MAX_DELTA
        )));
    }
    if magnitude != 0.0 && magnitude < MIN_DELTA {
        return Err(ConfigError::InvalidValue(format!(
            "{}: delta {} is below the 1/65536 resolution",
            context, value
        )));
    }
    Ok(())
}

fn check_delta(context: &str, dx: f64, dy: f64) -> Result<(), ConfigError> {
    check_component(context, dx)?;
    check_component(context, dy)
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&path)?;
        let mut config = Self::from_toml(&content)?;
        config.source_path = Some(path.as_ref().to_path_buf());
        Ok(config)
    }

    /// The configuration shipped with keymouse
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_toml(default_config_content())
    }

    /// `~/.config/keymouse/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("keymouse").join("config.toml"))
    }

    /// Resolve the configuration: explicit path, then the default path if it
    /// exists, then the built-in configuration.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        if let Some(path) = Self::default_path() {
            if path.exists() {
                return Self::from_file(path);
            }
        }
        log::info!("No configuration file found, using built-in defaults");
        Self::builtin()
    }

    /// Parse and validate a TOML document
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let raw: ConfigToml =
            toml::from_str(content).map_err(|e| ConfigError::TomlParse(e.to_string()))?;

        let general = &raw.general;
        let keys = ModeKeys {
            mouse_mode: parse_key_or("general.mouse_mode_key", general.mouse_mode_key.as_deref(), "D")?,
            arrow_mode: parse_key_or("general.arrow_mode_key", general.arrow_mode_key.as_deref(), "SPACE")?,
            control: parse_key_or("general.control_key", general.control_key.as_deref(), "LEFT_CTRL")?,
            shift: parse_key_or("general.shift_key", general.shift_key.as_deref(), "LEFT_SHIFT")?,
            arrows: ArrowKeys {
                up: parse_key_or("arrows.up", raw.arrows.up.as_deref(), "I")?,
                left: parse_key_or("arrows.left", raw.arrows.left.as_deref(), "J")?,
                down: parse_key_or("arrows.down", raw.arrows.down.as_deref(), "K")?,
                right: parse_key_or("arrows.right", raw.arrows.right.as_deref(), "L")?,
            },
        };
        if keys.mouse_mode == keys.arrow_mode {
            return Err(ConfigError::InvalidValue(format!(
                "general: mouse_mode_key and arrow_mode_key are both {}",
                keys.mouse_mode
            )));
        }

        let exit_keys = match &general.exit_keys {
            Some(names) => names
                .iter()
                .enumerate()
                .map(|(i, name)| parse_key(&format!("general.exit_keys[{}]", i), name))
                .collect::<Result<Vec<_>, _>>()?,
            None => vec![KeyId::ESC],
        };

        let tick_rate = raw.motion.tick_rate.unwrap_or(DEFAULT_TICK_RATE);
        if tick_rate == 0 {
            return Err(ConfigError::InvalidValue("motion.tick_rate must be > 0".to_string()));
        }
        let default_speed = raw.motion.default_speed.unwrap_or(DEFAULT_SPEED);
        if default_speed == 0 {
            return Err(ConfigError::InvalidValue(
                "motion.default_speed must be > 0".to_string(),
            ));
        }

        let mut bindings = Vec::new();
        for (i, entry) in raw.moves.iter().enumerate() {
            let context = format!("move[{}]", i);
            check_delta(&context, entry.dx, entry.dy)?;
            bindings.push(Binding::Move {
                key: parse_key(&context, &entry.key)?,
                dx: entry.dx,
                dy: entry.dy,
            });
        }
        for (i, entry) in raw.clicks.iter().enumerate() {
            let context = format!("click[{}]", i);
            bindings.push(Binding::Click {
                key: parse_key(&context, &entry.key)?,
                button: parse_button(&context, &entry.button)?,
            });
        }
        for (i, entry) in raw.scrolls.iter().enumerate() {
            let context = format!("scroll[{}]", i);
            check_delta(&context, entry.dx, entry.dy)?;
            bindings.push(Binding::Scroll {
                key: parse_key(&context, &entry.key)?,
                dx: entry.dx,
                dy: entry.dy,
            });
        }
        for (i, entry) in raw.speeds.iter().enumerate() {
            let context = format!("speed[{}]", i);
            bindings.push(Binding::Speed {
                key: parse_key(&context, &entry.key)?,
                speed: entry.speed,
            });
        }

        let bindings = BindingTable::new(bindings);
        log::debug!(
            "Parsed {} bindings over {} keys, {} exit key(s)",
            bindings.len(),
            bindings.keys().count(),
            exit_keys.len()
        );

        Ok(Self {
            engine: EngineConfig {
                keys,
                bindings,
                exit_keys,
                default_speed,
                tick_rate,
                scroll_nudge: raw.motion.scroll_nudge.unwrap_or(false),
            },
            device_filter: raw.devices.only,
            source_path: None,
        })
    }
}

/// Built-in configuration, also written out by `--print-default-config`
pub fn default_config_content() -> &'static str {
    r#"# Keymouse configuration
# Place this file at: ~/.config/keymouse/config.toml
#
# Key names are Linux input-event names: "A".."Z", "SPACE", "LEFT_CTRL",
# "ESC", "SEMICOLON", ... (case-insensitive).

[general]
# Hold for mouse mode, tap to type the key as usual
mouse_mode_key = "D"
# Hold for arrow mode, tap to type the key as usual
arrow_mode_key = "SPACE"
control_key = "LEFT_CTRL"
shift_key = "LEFT_SHIFT"
# Releasing any of these quits keymouse
exit_keys = ["ESC"]

[motion]
# Integrator ticks per second
tick_rate = 60
# Pixels per second for a move binding of length 1
default_speed = 500
# Move and scroll deltas have a resolution of 1/65536 and are limited to
# magnitudes between that and 1000000 (or exactly 0)
# Emit one scroll click immediately when a scroll key goes down
scroll_nudge = false

# Arrow mode: these keys become Up/Left/Down/Right
[arrows]
up = "I"
left = "J"
down = "K"
right = "L"

[[move]]
key = "I"
dy = -1.0

[[move]]
key = "J"
dx = -1.0

[[move]]
key = "K"
dy = 1.0

[[move]]
key = "L"
dx = 1.0

[[move]]
key = "U"
dx = -1.0
dy = -1.0

[[move]]
key = "O"
dx = 1.0
dy = -1.0

[[move]]
key = "N"
dx = -1.0
dy = 1.0

[[move]]
key = "M"
dx = 1.0
dy = 1.0

[[click]]
key = "SPACE"
button = "left"

[[click]]
key = "F"
button = "left"

[[click]]
key = "S"
button = "right"

[[click]]
key = "G"
button = "middle"

[[click]]
key = "B"
button = "back"

[[scroll]]
key = "R"
dy = -10.0

[[scroll]]
key = "V"
dy = 10.0

[[scroll]]
key = "E"
dx = -10.0

[[scroll]]
key = "T"
dx = 10.0

[[speed]]
key = "A"
speed = 100

[[speed]]
key = "C"
speed = 20

[[speed]]
key = "LEFT_ALT"
speed = 2000

[devices]
# Explicit device names or paths; empty means autodetect keyboards
only = []
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_config_parses() {
        let config = Config::builtin().unwrap();
        let engine = &config.engine;
        assert_eq!(engine.keys.mouse_mode, KeyId::from_name("D").unwrap());
        assert_eq!(engine.keys.arrow_mode, KeyId::SPACE);
        assert_eq!(engine.exit_keys, vec![KeyId::ESC]);
        assert_eq!(engine.tick_rate, 60);
        assert_eq!(engine.default_speed, 500);
        assert!(!engine.scroll_nudge);
        assert_eq!(engine.bindings.len(), 8 + 5 + 4 + 3);
        assert!(config.device_filter.is_empty());
        assert!(config.source_path.is_none());
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.engine.keys.control, KeyId::LEFT_CTRL);
        assert_eq!(config.engine.keys.shift, KeyId::LEFT_SHIFT);
        assert_eq!(config.engine.keys.arrows.up, KeyId::from_name("I").unwrap());
        assert_eq!(config.engine.exit_keys, vec![KeyId::ESC]);
        assert!(config.engine.bindings.is_empty());
    }

    #[test]
    fn test_bindings_and_buttons() {
        let toml = r#"
[motion]
tick_rate = 50
default_speed = 10

[[move]]
key = "l"
dx = 1.5

[[click]]
key = "f"
button = 3

[[click]]
key = "f"
button = "Middle"

[[scroll]]
key = "r"
dy = -5

[[speed]]
key = "a"
speed = 100
"#;
        let config = Config::from_toml(toml).unwrap();
        let engine = &config.engine;
        let f = KeyId::from_name("F").unwrap();
        assert_eq!(engine.tick_rate, 50);
        assert_eq!(engine.default_speed, 10);
        assert_eq!(
            engine.bindings.lookup(f),
            &[
                Binding::Click { key: f, button: Button::Right },
                Binding::Click { key: f, button: Button::Middle },
            ]
        );
        let r = KeyId::from_name("R").unwrap();
        assert_eq!(
            engine.bindings.lookup(r),
            &[Binding::Scroll { key: r, dx: 0.0, dy: -5.0 }]
        );
    }

    #[test]
    fn test_unknown_key_is_reported_with_context() {
        let err = Config::from_toml("[[move]]\nkey = \"NOPE\"\ndx = 1.0\n").unwrap_err();
        match err {
            ConfigError::InvalidKey(msg) => {
                assert!(msg.contains("move[0]"));
                assert!(msg.contains("NOPE"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_button() {
        let err = Config::from_toml("[[click]]\nkey = \"F\"\nbutton = 12\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidButton(_)));
        let err = Config::from_toml("[[click]]\nkey = \"F\"\nbutton = \"wheel\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidButton(_)));
    }

    #[test]
    fn test_zero_tick_rate_rejected() {
        let err = Config::from_toml("[motion]\ntick_rate = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }

    #[test]
    fn test_delta_range() {
        for toml in [
            "[[move]]\nkey = \"L\"\ndx = 1e14\n",
            "[[scroll]]\nkey = \"R\"\ndy = -2e6\n",
            "[[move]]\nkey = \"L\"\ndx = 1e-6\n",
            "[[scroll]]\nkey = \"R\"\ndx = -1e-5\n",
        ] {
            let err = Config::from_toml(toml).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidValue(_)), "{toml}");
        }

        let config = Config::from_toml("[[move]]\nkey = \"L\"\ndx = 1e6\ndy = 0.0001\n").unwrap();
        assert_eq!(config.engine.bindings.len(), 1);
    }

    #[test]
    fn test_same_mode_keys_rejected() {
        let toml = "[general]\nmouse_mode_key = \"SPACE\"\narrow_mode_key = \"SPACE\"\n";
        assert!(matches!(
            Config::from_toml(toml),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = Config::from_toml("[general]\nbogus = 1\n").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }

    #[test]
    fn test_from_file_records_source() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[general]\nexit_keys = [\"Q\", \"ESC\"]").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.source_path.as_deref(), Some(file.path()));
        assert_eq!(
            config.engine.exit_keys,
            vec![KeyId::from_name("Q").unwrap(), KeyId::ESC]
        );
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Config::from_file("/nonexistent/keymouse.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_device_filter() {
        let config = Config::from_toml("[devices]\nonly = [\"/dev/input/event3\"]\n").unwrap();
        assert_eq!(config.device_filter, vec!["/dev/input/event3".to_string()]);
    }
}
