use crate::controller::camera_controller::RigConfig;
use crate::controller::input::{KeyBindings, KeyMatch};

/// Enables the debug overlay and world axes.
pub const DEBUG_ENV: &str = "CUBEYARD_DEBUG";
/// `sensitive` or `insensitive` key matching.
pub const KEY_MATCH_ENV: &str = "CUBEYARD_KEY_MATCH";

/// Application settings shared by the WASM and native front ends.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub debug: bool,
    pub key_match: KeyMatch,
    pub bindings: KeyBindings,
    /// Speed multiplier handed to the player's forward/backward commands each frame.
    pub move_speed: f32,
    /// Speed multiplier handed to the player's turn commands each frame.
    pub turn_speed: f32,
    pub rig: RigConfig,
    pub width: u32,
    pub height: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            debug: false,
            key_match: KeyMatch::CaseSensitive,
            bindings: KeyBindings::default(),
            move_speed: 0.25,
            turn_speed: 0.2,
            rig: RigConfig::default(),
            width: 800,
            height: 600,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(v) = lookup(DEBUG_ENV) {
            config.debug = parse_flag(&v);
        }
        if let Some(m) = lookup(KEY_MATCH_ENV).as_deref().and_then(parse_key_match) {
            config.key_match = m;
        }
        config
    }

    /// Browser settings from `location.search`, e.g. `?debug&keys=insensitive`.
    pub fn from_query(search: &str) -> Self {
        let mut config = Self::default();
        let pairs = search
            .trim_start_matches('?')
            .split('&')
            .filter(|p| !p.is_empty())
            .map(|p| p.split_once('=').unwrap_or((p, "")));
        for (key, value) in pairs {
            match key {
                "debug" => config.debug = parse_flag(value),
                "keys" => {
                    if let Some(m) = parse_key_match(value) {
                        config.key_match = m;
                    }
                }
                _ => {}
            }
        }
        config
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "" | "1" | "true" | "yes" | "on"
    )
}

fn parse_key_match(value: &str) -> Option<KeyMatch> {
    match value.trim().to_ascii_lowercase().as_str() {
        "sensitive" | "case-sensitive" => Some(KeyMatch::CaseSensitive),
        "insensitive" | "case-insensitive" => Some(KeyMatch::CaseInsensitive),
        _ => None,
    }
}
