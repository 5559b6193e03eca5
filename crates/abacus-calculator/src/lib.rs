//! The calculator plugin system for Abacus.
//!
//! This crate provides the [`Calculator`] contract, the [`CalculatorModule`]
//! stage trait that calculation modules implement, the [`CalculatorEngine`]
//! that sequences validation, computation and analysis, and the
//! [`CalculatorRegistry`] that catalogues calculators by id.
//!
//! ```
//! use abacus_calculator::{CalculatorInputs, RiskLevel, built_in};
//!
//! let registry = built_in::builtin_registry();
//! let inputs = CalculatorInputs::new().with("initialInvestment", 1000).with("returns", 500);
//! let output = registry.invoke("roi", &inputs).unwrap();
//! assert_eq!(output.result, 50.0);
//! assert_eq!(output.analysis.risk_level, RiskLevel::Low);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod analysis;
pub mod built_in;
pub mod catalog;
pub mod concurrent;
pub mod conformance;
pub mod engine;
pub mod error;
pub mod formula;
pub mod plugin;
pub mod primitives;
pub mod registry;
pub mod types;
pub mod validation;

pub use abacus_types::InputValue;
pub use analysis::{Analysis, RecommendationTemplate, RiskLevel, RiskThresholds, TierDirection};
pub use concurrent::ConcurrentRegistry;
pub use engine::{CalculatorEngine, Invocation, ValidatedInputs};
pub use error::{
    CalculatorError, CatalogError, ErrorCode, FieldError, InputError, LookupFailure,
    RegistrationError, ValidationFailure,
};
pub use formula::{Formula, FormulaCalculator};
pub use plugin::{CalculationResult, Calculator, CalculatorModule};
pub use registry::{CalculatorRegistry, DuplicatePolicy, SharedCalculator};
pub use types::{
    CalculationOutput, CalculatorDescriptor, CalculatorExample, CalculatorFamily,
    DEFAULT_EXAMPLE_TOLERANCE, FieldKind, FieldSpec, Metrics, Warning,
};
pub use validation::ValidationReport;

/// Raw inputs for one invocation: field name to scalar value.
///
/// Keys are kept ordered so that anything iterating the inputs is
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalculatorInputs {
    fields: BTreeMap<String, InputValue>,
}

impl CalculatorInputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<InputValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<InputValue>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Raw value, including explicit `Null`.
    pub fn get(&self, name: &str) -> Option<&InputValue> {
        self.fields.get(name)
    }

    /// Value if the field was provided; `Null` counts as not provided.
    pub fn provided(&self, name: &str) -> Option<&InputValue> {
        self.fields.get(name).filter(|v| !v.is_null())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.provided(name).is_some()
    }

    /// Gets a required number.
    pub fn number(&self, name: &str) -> Result<f64, FieldError> {
        self.optional_number(name)?.ok_or_else(|| FieldError::missing(name))
    }

    /// Gets an optional number; absent or `null` is `Ok(None)`.
    pub fn optional_number(&self, name: &str) -> Result<Option<f64>, FieldError> {
        match self.provided(name) {
            None => Ok(None),
            Some(value) => value
                .as_number()
                .map(Some)
                .ok_or_else(|| FieldError::wrong_type(name, "number", value.type_name())),
        }
    }

    /// Gets a required string.
    pub fn text(&self, name: &str) -> Result<&str, FieldError> {
        match self.provided(name) {
            None => Err(FieldError::missing(name)),
            Some(value) => value
                .as_str()
                .ok_or_else(|| FieldError::wrong_type(name, "string", value.type_name())),
        }
    }

    /// Gets an optional boolean; absent or `null` is `Ok(None)`.
    pub fn optional_boolean(&self, name: &str) -> Result<Option<bool>, FieldError> {
        match self.provided(name) {
            None => Ok(None),
            Some(value) => value
                .as_bool()
                .map(Some)
                .ok_or_else(|| FieldError::wrong_type(name, "boolean", value.type_name())),
        }
    }

    /// Every numeric field, in key order.
    pub fn numeric_values(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.fields.iter().filter_map(|(k, v)| v.as_number().map(|n| (k.as_str(), n)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &InputValue)> + '_ {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Overlays `other` on top of `self`; fields in `other` win.
    pub fn merge(mut self, other: CalculatorInputs) -> Self {
        self.fields.extend(other.fields);
        self
    }

    /// Builds inputs from a JSON object of scalars.
    pub fn from_json(value: serde_json::Value) -> Result<Self, InputError> {
        let serde_json::Value::Object(map) = value else {
            return Err(InputError::NotAnObject);
        };
        map.into_iter()
            .map(|(field, raw)| {
                InputValue::try_from(raw)
                    .map(|value| (field.clone(), value))
                    .map_err(|source| InputError::NonScalar { field, source })
            })
            .collect()
    }

    pub fn from_json_str(raw: &str) -> Result<Self, InputError> {
        let value: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| InputError::Json(e.to_string()))?;
        Self::from_json(value)
    }

    /// Parses `FIELD=VALUE` assignments; values go through [`InputValue::from_literal`].
    pub fn from_assignments<I, S>(assignments: I) -> Result<Self, InputError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        assignments
            .into_iter()
            .map(|assignment| {
                let assignment = assignment.as_ref();
                match assignment.split_once('=') {
                    Some((field, raw)) if !field.trim().is_empty() => {
                        Ok((field.trim().to_string(), InputValue::from_literal(raw)))
                    }
                    _ => Err(InputError::MalformedAssignment(assignment.to_string())),
                }
            })
            .collect()
    }
}

impl<K: Into<String>, V: Into<InputValue>> FromIterator<(K, V)> for CalculatorInputs {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self { fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculator_inputs() {
        let inputs = CalculatorInputs::new()
            .with("amount", 42)
            .with("rate", 6.5)
            .with("label", "loan")
            .with("insured", true)
            .with("notes", InputValue::Null);

        assert_eq!(inputs.number("amount").unwrap(), 42.0);
        assert_eq!(inputs.number("rate").unwrap(), 6.5);
        assert_eq!(inputs.text("label").unwrap(), "loan");
        assert_eq!(inputs.optional_boolean("insured").unwrap(), Some(true));

        // Null counts as absent
        assert_eq!(inputs.optional_number("notes").unwrap(), None);
        assert_eq!(inputs.number("notes").unwrap_err().code, ErrorCode::MissingRequiredField);

        // Wrong type
        assert_eq!(inputs.number("label").unwrap_err().code, ErrorCode::InvalidFieldType);
        assert_eq!(inputs.numeric_values().count(), 2);
    }

    #[test]
    fn json_inputs() {
        let inputs =
            CalculatorInputs::from_json_str(r#"{"principal": 1000, "rate": 5.5, "fixed": true}"#)
                .unwrap();
        assert_eq!(inputs.len(), 3);
        assert_eq!(inputs.number("principal").unwrap(), 1000.0);

        assert_eq!(CalculatorInputs::from_json_str("[1, 2]").unwrap_err(), InputError::NotAnObject);
        assert!(matches!(
            CalculatorInputs::from_json_str(r#"{"flows": [1, 2]}"#).unwrap_err(),
            InputError::NonScalar { field, .. } if field == "flows"
        ));
    }

    #[test]
    fn assignment_inputs() {
        let inputs =
            CalculatorInputs::from_assignments(["principal=1000", "rate = 5.5", "kind=fixed"])
                .unwrap();
        assert_eq!(inputs.number("principal").unwrap(), 1000.0);
        assert_eq!(inputs.number("rate").unwrap(), 5.5);
        assert_eq!(inputs.text("kind").unwrap(), "fixed");

        assert!(matches!(
            CalculatorInputs::from_assignments(["=5"]).unwrap_err(),
            InputError::MalformedAssignment(_)
        ));
        assert!(CalculatorInputs::from_assignments(["novalue"]).is_err());
    }

    #[test]
    fn merge_prefers_overlay() {
        let base = CalculatorInputs::new().with("a", 1).with("b", 2);
        let merged = base.merge(CalculatorInputs::new().with("b", 3));
        assert_eq!(merged.number("b").unwrap(), 3.0);
        assert_eq!(merged.number("a").unwrap(), 1.0);
    }
}
