//! Global key-value settings store.
//!
//! Filled at startup (defaults, then command-line overrides) and read by the
//! app shell and engine wiring. Values are typed; typed getters fall back to
//! the caller's default when the key is missing or holds another type.

use std::collections::HashMap;
use std::fmt;

/// Well-known keys read by the app shell.
pub const WINDOW_WIDTH: &str = "window.width";
pub const WINDOW_HEIGHT: &str = "window.height";
pub const WINDOW_FULLSCREEN: &str = "window.fullscreen";
pub const WINDOW_VSYNC: &str = "window.vsync";
pub const RESOURCE_ROOT: &str = "resources.root";

#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl SettingValue {
    /// Parse with type inference: bool, then integer, then float, else string.
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("true") {
            return Self::Bool(true);
        }
        if raw.eq_ignore_ascii_case("false") {
            return Self::Bool(false);
        }
        if let Ok(value) = raw.parse::<i64>() {
            return Self::Int(value);
        }
        if let Ok(value) = raw.parse::<f64>() {
            return Self::Float(value);
        }
        Self::Str(raw.to_string())
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Str(value) => write!(f, "{value}"),
        }
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for SettingValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

#[derive(Debug, Default)]
pub struct GlobalSettings {
    values: HashMap<String, SettingValue>,
}

impl GlobalSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<SettingValue>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.values.get(key)
    }

    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        match self.values.get(key) {
            Some(SettingValue::Bool(value)) => *value,
            _ => default,
        }
    }

    pub fn int_or(&self, key: &str, default: i64) -> i64 {
        match self.values.get(key) {
            Some(SettingValue::Int(value)) => *value,
            _ => default,
        }
    }

    pub fn float_or(&self, key: &str, default: f64) -> f64 {
        match self.values.get(key) {
            Some(SettingValue::Float(value)) => *value,
            Some(SettingValue::Int(value)) => *value as f64,
            _ => default,
        }
    }

    pub fn str_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        match self.values.get(key) {
            Some(SettingValue::Str(value)) => value,
            _ => default,
        }
    }

    /// Apply `key=value` overrides, typically collected from the command line.
    pub fn apply_overrides<'a>(&mut self, pairs: impl IntoIterator<Item = &'a str>) {
        for pair in pairs {
            match pair.split_once('=') {
                Some((key, raw)) if !key.is_empty() => {
                    let value = SettingValue::parse(raw);
                    log::info!("setting override: {key} = {value}");
                    self.values.insert(key.to_string(), value);
                }
                _ => {
                    log::warn!("ignoring malformed setting override '{pair}' (expected key=value)");
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
