//! Value Tree
//!
//! Parsed JSON is represented by `serde_json::Value`, which is already the
//! tagged union the engine walks: Null, Bool, Number, String, Array, Object.
//! This module only adds a kind descriptor used in type-mismatch reports.

use std::fmt;

pub use serde_json::Value;

/// Kind of a node in the value tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    /// An integral number that fits in an i64
    Integer,
    /// Any number
    Number,
    String,
    Array,
    Object,
}

impl ValueKind {
    /// Kind of the given node. Numbers that fit in an i64 report `Integer`;
    /// larger unsigned values report `Number`.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Number(n) if n.is_i64() => ValueKind::Integer,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
        }
    }

    /// Whether a node of kind `found` satisfies an expectation of `self`
    pub fn accepts(self, found: ValueKind) -> bool {
        match (self, found) {
            (ValueKind::Number, ValueKind::Integer) => true,
            (expected, found) => expected == found,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Integer => "integer",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
