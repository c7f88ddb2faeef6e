//! Answer sets and the text rendering of answer values.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Where an answer value is being rendered.
///
/// Field filling and the text overlay share every rule but booleans: form
/// viewers expect the check box tokens `Yes`/`Off`, while the overlay is a
/// human-readable dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rendering {
    /// Value written into an interactive form field
    Field,
    /// Value printed on the "Form Data:" overlay
    Overlay,
}

/// Render an answer value as text.
///
/// | Value  | `Field`        | `Overlay`          |
/// |--------|----------------|--------------------|
/// | true   | `Yes`          | `true`             |
/// | false  | `Off`          | `false`            |
/// | string | verbatim       | verbatim           |
/// | null   | empty string   | empty string       |
/// | number | canonical text | canonical text     |
/// | other  | compact JSON   | compact JSON       |
pub fn render_value(value: &Value, rendering: Rendering) -> String {
    match (value, rendering) {
        (Value::Bool(true), Rendering::Field) => "Yes".to_string(),
        (Value::Bool(false), Rendering::Field) => "Off".to_string(),
        (Value::Bool(b), Rendering::Overlay) => b.to_string(),
        (Value::String(s), _) => s.clone(),
        (Value::Null, _) => String::new(),
        (Value::Number(n), _) => n.to_string(),
        (other, _) => other.to_string(),
    }
}

/// An ordered mapping from field name to answer value.
///
/// Insertion order is preserved and only matters for the text overlay;
/// fields are matched by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSet {
    entries: Map<String, Value>,
}

impl AnswerSet {
    /// Create an empty answer set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an answer set from a JSON object.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Build an answer set from an already-parsed JSON value.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(entries) => Ok(Self { entries }),
            other => Err(Error::InvalidAnswers(format!(
                "expected a JSON object, found {}",
                json_kind(&other)
            ))),
        }
    }

    /// Add or replace an answer. Replacing keeps the original position.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(name.into(), value.into());
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Look up the answer for a field name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    /// Answers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of answers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no answers.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The text a form field receives for `name`, if answered.
    pub fn field_text(&self, name: &str) -> Option<String> {
        self.get(name).map(|v| render_value(v, Rendering::Field))
    }

    /// Overlay lines (`name: value`) in insertion order.
    pub fn overlay_lines(&self) -> Vec<String> {
        self.iter()
            .map(|(name, value)| format!("{}: {}", name, render_value(value, Rendering::Overlay)))
            .collect()
    }
}

impl From<Map<String, Value>> for AnswerSet {
    fn from(entries: Map<String, Value>) -> Self {
        Self { entries }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for AnswerSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (k, v) in iter {
            set.insert(k, v);
        }
        set
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
