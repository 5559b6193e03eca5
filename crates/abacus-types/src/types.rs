use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A single scalar value supplied for a calculator input field.
///
/// `Null` and an absent key carry the same meaning: the field was not provided.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum InputValue {
    /// Null value
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Integer(i64),
    /// Floating point value
    Float(f64),
    /// String value
    String(String),
}

/// Returned when a JSON value cannot be represented as an [`InputValue`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected a scalar input value, got {kind}")]
pub struct NonScalarValue {
    /// JSON kind that was rejected (`array` or `object`)
    pub kind: &'static str,
}

impl InputValue {
    /// Returns an `f64` if this value is numeric (`Integer` or `Float`).
    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            #[allow(clippy::cast_precision_loss)]
            Self::Integer(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the string slice for `String` values.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the flag for `Boolean` values.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// True for the `Null` variant.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Type name used in validation messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
        }
    }

    /// Parses a command-line style literal.
    ///
    /// `true`/`false` become booleans, `null` becomes `Null`, anything that
    /// parses as `i64` or `f64` becomes a number, everything else is kept as a
    /// string.
    #[must_use]
    pub fn from_literal(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed {
            "true" => return Self::Boolean(true),
            "false" => return Self::Boolean(false),
            "null" => return Self::Null,
            _ => {}
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return Self::Integer(i);
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            return Self::Float(f);
        }
        Self::String(raw.to_string())
    }
}

impl fmt::Display for InputValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(fl) => write!(f, "{fl}"),
            Self::String(s) => write!(f, "\"{s}\""),
        }
    }
}

impl From<f64> for InputValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<i64> for InputValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for InputValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<bool> for InputValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<&str> for InputValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for InputValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

// -------------------------------------------------------------------------------------------------
// Conversions between `InputValue` and `serde_json::Value`.
// -------------------------------------------------------------------------------------------------

impl TryFrom<serde_json::Value> for InputValue {
    type Error = NonScalarValue;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        match value {
            serde_json::Value::Null => Ok(Self::Null),
            serde_json::Value::Bool(b) => Ok(Self::Boolean(b)),
            serde_json::Value::Number(n) => Ok(n
                .as_i64()
                .map_or_else(|| Self::Float(n.as_f64().unwrap_or(f64::NAN)), Self::Integer)),
            serde_json::Value::String(s) => Ok(Self::String(s)),
            serde_json::Value::Array(_) => Err(NonScalarValue { kind: "array" }),
            serde_json::Value::Object(_) => Err(NonScalarValue { kind: "object" }),
        }
    }
}

impl From<InputValue> for serde_json::Value {
    fn from(value: InputValue) -> Self {
        match value {
            InputValue::Null => Self::Null,
            InputValue::Boolean(b) => Self::Bool(b),
            InputValue::Integer(i) => Self::Number(serde_json::Number::from(i)),
            InputValue::Float(f) => serde_json::Number::from_f64(f).map_or(Self::Null, Self::Number),
            InputValue::String(s) => Self::String(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_accessor_accepts_both_variants() {
        assert_eq!(InputValue::Integer(42).as_number(), Some(42.0));
        assert_eq!(InputValue::Float(2.5).as_number(), Some(2.5));
        assert_eq!(InputValue::from("42").as_number(), None);
        assert_eq!(InputValue::Null.as_number(), None);
    }

    #[test]
    fn literal_parsing() {
        assert_eq!(InputValue::from_literal("true"), InputValue::Boolean(true));
        assert_eq!(InputValue::from_literal("null"), InputValue::Null);
        assert_eq!(InputValue::from_literal("1000"), InputValue::Integer(1000));
        assert_eq!(InputValue::from_literal(" 6.5 "), InputValue::Float(6.5));
        assert_eq!(
            InputValue::from_literal("conventional"),
            InputValue::String("conventional".to_string())
        );
    }

    #[test]
    fn json_conversion_rejects_containers() {
        assert_eq!(InputValue::try_from(json!(12)).unwrap(), InputValue::Integer(12));
        assert_eq!(InputValue::try_from(json!(1.5)).unwrap(), InputValue::Float(1.5));
        assert_eq!(InputValue::try_from(json!(null)).unwrap(), InputValue::Null);
        assert_eq!(InputValue::try_from(json!([1, 2])).unwrap_err().kind, "array");
        assert_eq!(InputValue::try_from(json!({"a": 1})).unwrap_err().kind, "object");
    }

    #[test]
    fn non_finite_floats_serialize_as_null() {
        let value: serde_json::Value = InputValue::Float(f64::INFINITY).into();
        assert_eq!(value, serde_json::Value::Null);
    }

    #[test]
    fn untagged_deserialization() {
        let values: Vec<InputValue> = serde_json::from_str(r#"[null, true, 3, 3.5, "x"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                InputValue::Null,
                InputValue::Boolean(true),
                InputValue::Integer(3),
                InputValue::Float(3.5),
                InputValue::String("x".to_string()),
            ]
        );
    }
}
