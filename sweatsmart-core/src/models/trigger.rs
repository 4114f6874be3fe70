//! Triggers attached to an episode, and the decoding of their stored forms.
//!
//! Stored trigger data comes in three shapes: a JSON object with
//! `type`/`value`/`label`, a string holding such an object encoded as JSON,
//! or a plain string. [`parse_trigger`] turns any of them into a [`Trigger`]
//! and never fails.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::SweatError;

/// Placeholder for a trigger with no usable value or label.
pub const UNKNOWN_TRIGGER: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerType {
    #[default]
    Environmental,
    Emotional,
    Food,
    Physical,
    Medication,
}

impl TriggerType {
    /// Map a stored tag to a category. Unrecognized tags fall back to
    /// [`TriggerType::Environmental`].
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "environmental" => Self::Environmental,
            "emotional" => Self::Emotional,
            "food" => Self::Food,
            "physical" => Self::Physical,
            "medication" => Self::Medication,
            _ => Self::default(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Environmental => "environmental",
            Self::Emotional => "emotional",
            Self::Food => "food",
            Self::Physical => "physical",
            Self::Medication => "medication",
        }
    }
}

impl fmt::Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    #[serde(rename = "type")]
    pub trigger_type: TriggerType,
    pub value: String,
    pub label: String,
}

impl Trigger {
    pub fn new(trigger_type: TriggerType, value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            trigger_type,
            value: value.into(),
            label: label.into(),
        }
    }
}

/// One element of the stored `triggers` column, before normalization.
///
/// Variants are tried in order, so `Other` only catches elements that are
/// neither a string nor an object (null, numbers, booleans, nested arrays).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawTrigger {
    Text(String),
    Structured(Map<String, Value>),
    Other(Value),
}

/// Normalize a stored trigger. Total: every input yields a trigger.
pub fn parse_trigger(raw: RawTrigger) -> Trigger {
    match raw {
        RawTrigger::Structured(fields) => from_fields(&fields, None),
        RawTrigger::Text(text) => match serde_json::from_str::<Map<String, Value>>(&text) {
            Ok(fields) => from_fields(&fields, Some(&text)),
            Err(_) => Trigger::new(TriggerType::Environmental, text.clone(), text),
        },
        RawTrigger::Other(_) => from_fields(&Map::new(), None),
    }
}

/// Decode a whole `triggers` column. A missing or null column is an empty list.
///
/// Only a column that is not an array fails; odd elements inside an array
/// are normalized one by one.
pub fn parse_triggers(raw: Option<&Value>) -> Result<Vec<Trigger>, SweatError> {
    let raw = match raw {
        Some(v) if !v.is_null() => v,
        _ => return Ok(Vec::new()),
    };

    let items = Vec::<RawTrigger>::deserialize(raw)?;
    Ok(items.into_iter().map(parse_trigger).collect())
}

// `fallback` is the original encoded string, when there was one.
fn from_fields(fields: &Map<String, Value>, fallback: Option<&str>) -> Trigger {
    let trigger_type = field_text(fields, "type")
        .map(|t| TriggerType::from_tag(&t))
        .unwrap_or_default();

    let value = field_text(fields, "value");
    let label = field_text(fields, "label")
        .or_else(|| value.clone())
        .or_else(|| fallback.map(str::to_string))
        .unwrap_or_else(|| UNKNOWN_TRIGGER.to_string());
    let value = value
        .or_else(|| fallback.map(str::to_string))
        .unwrap_or_else(|| UNKNOWN_TRIGGER.to_string());

    Trigger {
        trigger_type,
        value,
        label,
    }
}

// Empty strings count as missing.
fn field_text(fields: &Map<String, Value>, key: &str) -> Option<String> {
    match fields.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
