//! Field resolution for vendor payloads whose shape drifted across API versions.
//!
//! Each logical field is described by an ordered list of dotted paths; the
//! first path that yields a usable value wins.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("invalid JSON payload: {0}")]
    InvalidJson(String),

    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldAliases {
    pub field: &'static str,
    pub paths: &'static [&'static str],
}

impl FieldAliases {
    pub const fn new(field: &'static str, paths: &'static [&'static str]) -> Self {
        Self { field, paths }
    }

    fn first<T>(&self, payload: &Value, convert: impl Fn(&Value) -> Option<T>) -> Option<T> {
        self.paths
            .iter()
            .filter_map(|path| lookup(payload, path))
            .find_map(convert)
    }

    pub fn text(&self, payload: &Value) -> Option<String> {
        self.first(payload, as_text)
    }

    pub fn require_text(&self, payload: &Value) -> Result<String, NormalizeError> {
        self.text(payload).ok_or(NormalizeError::MissingField(self.field))
    }

    /// Amount already expressed in minor units (paise).
    pub fn minor_amount(&self, payload: &Value) -> Option<i64> {
        self.first(payload, |v| as_number(v).map(|n| n.round() as i64))
    }

    /// Amount expressed in major units (rupees), converted to minor units.
    pub fn major_amount(&self, payload: &Value) -> Option<i64> {
        self.first(payload, |v| as_number(v).map(|n| (n * 100.0).round() as i64))
    }
}

pub fn parse_json(body: &[u8]) -> Result<Value, NormalizeError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| NormalizeError::InvalidJson(e.to_string()))?;
    if !value.is_object() {
        return Err(NormalizeError::InvalidJson("expected a JSON object".to_string()));
    }
    Ok(value)
}

fn lookup<'a>(payload: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(payload, |cur, key| cur.get(key))
}

fn as_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}
