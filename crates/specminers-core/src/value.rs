//! Representation types and the values they govern.
//!
//! Every declared variable has a [`RepType`] that decides how the value lines
//! of a trace record are decoded into a [`Value`] and encoded back again.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The literal Daikon writes for a value that could not be observed.
pub const NONSENSICAL: &str = "nonsensical";

/// Representation type of a declared variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepType {
    Int,
    Float,
    Boolean,
    String,
}

impl RepType {
    /// Canonical spelling of this representation type.
    pub fn as_str(self) -> &'static str {
        match self {
            RepType::Int => "int",
            RepType::Float => "float",
            RepType::Boolean => "boolean",
            RepType::String => "string",
        }
    }

    /// Whether a value of this shape can be written for a variable of this type.
    /// Integers widen to floats; `nonsensical` is valid everywhere.
    pub fn accepts(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (_, Value::Nonsensical)
                | (RepType::Int, Value::Int(_))
                | (RepType::Float, Value::Float(_) | Value::Int(_))
                | (RepType::Boolean, Value::Boolean(_))
                | (RepType::String, Value::String(_))
        )
    }

    /// Decodes a raw value line. Returns `None` if the text is not a value of
    /// this type.
    pub fn decode(self, raw: &str) -> Option<Value> {
        if raw == NONSENSICAL {
            return Some(Value::Nonsensical);
        }
        match self {
            RepType::Int => raw.parse().ok().map(Value::Int),
            RepType::Float => raw.parse().ok().map(Value::Float),
            RepType::Boolean => match raw {
                "true" => Some(Value::Boolean(true)),
                "false" => Some(Value::Boolean(false)),
                _ => None,
            },
            RepType::String => Some(Value::String(raw.to_string())),
        }
    }
}

impl fmt::Display for RepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a `rep-type` spelling is not recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRepType;

impl FromStr for RepType {
    type Err = UnknownRepType;

    /// Accepts the canonical spellings and Daikon's own names for the same
    /// representations.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "int" | "hashcode" => Ok(RepType::Int),
            "float" | "double" => Ok(RepType::Float),
            "boolean" => Ok(RepType::Boolean),
            "string" | "java.lang.String" => Ok(RepType::String),
            _ => Err(UnknownRepType),
        }
    }
}

/// A decoded trace value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
    Boolean(bool),
    /// String values are kept exactly as they appear on the value line.
    String(String),
    Nonsensical,
}

impl Value {
    /// Short name of the variant, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Boolean(_) => "boolean",
            Value::String(_) => "string",
            Value::Nonsensical => NONSENSICAL,
        }
    }

    /// Text of this value on a trace value line; the inverse of [`RepType::decode`].
    pub fn encode(&self) -> String {
        match self {
            Value::Int(n) => n.to_string(),
            Value::Float(x) if *x == f64::INFINITY => "Infinity".to_string(),
            Value::Float(x) if *x == f64::NEG_INFINITY => "-Infinity".to_string(),
            Value::Float(x) => x.to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::String(s) => s.clone(),
            Value::Nonsensical => NONSENSICAL.to_string(),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}
