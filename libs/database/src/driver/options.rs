use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::common::DriverError;

/// Option key selecting how a driver reports failures
pub const ERROR_MODE: &str = "error_mode";

/// How a driver session reports failed statements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ErrorMode {
    /// Failures are returned as errors
    Raise,
    /// Failures are logged and reported as "no result"
    Warn,
    /// Failures are reported as "no result" without logging
    Silent,
}

impl ErrorMode {
    /// Mode a driver falls back to when `error_mode` is not set
    pub const DRIVER_DEFAULT: ErrorMode = ErrorMode::Silent;
}

/// Value of a single driver option
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Integer(i64),
    Text(String),
}

impl OptionValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            OptionValue::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            OptionValue::Text(value) => Some(value),
            _ => None,
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Integer(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Text(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Text(value)
    }
}

impl From<ErrorMode> for OptionValue {
    fn from(mode: ErrorMode) -> Self {
        OptionValue::Text(mode.to_string())
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(value) => write!(f, "{}", value),
            OptionValue::Integer(value) => write!(f, "{}", value),
            OptionValue::Text(value) => f.write_str(value),
        }
    }
}

/// Infers the value type from text: booleans, then integers, then plain text
impl FromStr for OptionValue {
    type Err = std::convert::Infallible;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        if let Ok(value) = raw.parse::<bool>() {
            return Ok(OptionValue::Bool(value));
        }
        if let Ok(value) = raw.parse::<i64>() {
            return Ok(OptionValue::Integer(value));
        }
        Ok(OptionValue::Text(raw.to_string()))
    }
}

/// Driver-specific options, keyed by option name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DriverOptions(BTreeMap<String, OptionValue>);

impl DriverOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert an option, returning the value it replaced
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<OptionValue>,
    ) -> Option<OptionValue> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The configured error mode, or [`ErrorMode::DRIVER_DEFAULT`] when unset
    pub fn error_mode(&self) -> Result<ErrorMode, DriverError> {
        match self.get(ERROR_MODE) {
            None => Ok(ErrorMode::DRIVER_DEFAULT),
            Some(OptionValue::Text(raw)) => {
                raw.parse().map_err(|_| DriverError::InvalidOption {
                    key: ERROR_MODE.to_string(),
                    reason: format!("unknown error mode '{}'", raw),
                })
            }
            Some(other) => Err(DriverError::InvalidOption {
                key: ERROR_MODE.to_string(),
                reason: format!("expected text, got '{}'", other),
            }),
        }
    }
}

impl<K, V> FromIterator<(K, V)> for DriverOptions
where
    K: Into<String>,
    V: Into<OptionValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

/// Parses `key=value,key=value`; blank entries are skipped
impl FromStr for DriverOptions {
    type Err = DriverError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        parse_pairs(raw)?
            .into_iter()
            .map(|(key, value)| {
                let value: OptionValue = match value.parse() {
                    Ok(value) => value,
                    Err(never) => match never {},
                };
                Ok((key, value))
            })
            .collect()
    }
}

/// Split `key=value,key=value` into trimmed pairs
pub(crate) fn parse_pairs(raw: &str) -> Result<Vec<(String, String)>, DriverError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (key, value) =
                entry
                    .split_once('=')
                    .ok_or_else(|| DriverError::InvalidOption {
                        key: entry.to_string(),
                        reason: "expected key=value".to_string(),
                    })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(DriverError::InvalidOption {
                    key: entry.to_string(),
                    reason: "empty key".to_string(),
                });
            }
            Ok((key.to_string(), value.trim().to_string()))
        })
        .collect()
}
