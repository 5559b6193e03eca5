//! Error types for calculator lookup, validation, registration and catalogues.
//!
//! Validation and lookup failures are ordinary outcomes reported to the
//! immediate caller; nothing here is fatal.

use abacus_types::NonScalarValue;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Machine-readable reason attached to a [`FieldError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    MissingRequiredField,
    InvalidFieldType,
    NotFinite,
    Negative,
    OutOfRange,
    InvalidChoice,
    CrossFieldRule,
}

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
    pub code: ErrorCode,
}

impl FieldError {
    pub fn new(field: impl Into<String>, code: ErrorCode, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into(), code }
    }

    pub fn missing(field: &str) -> Self {
        Self::new(field, ErrorCode::MissingRequiredField, format!("{field} is required"))
    }

    pub fn wrong_type(field: &str, expected: &str, actual: &str) -> Self {
        Self::new(
            field,
            ErrorCode::InvalidFieldType,
            format!("{field} must be a {expected}, got {actual}"),
        )
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn join_errors(errors: &[FieldError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Inputs were rejected; computation did not run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validation failed: {}", join_errors(.errors))]
pub struct ValidationFailure {
    errors: Vec<FieldError>,
}

impl ValidationFailure {
    /// `errors` must be non-empty; an empty list is not a failure.
    pub fn new(errors: Vec<FieldError>) -> Self {
        debug_assert!(!errors.is_empty(), "ValidationFailure requires at least one error");
        Self { errors }
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<FieldError> {
        self.errors
    }

    /// Errors reported against `field`, in report order.
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a FieldError> + 'a {
        self.errors.iter().filter(move |e| e.field == field)
    }
}

/// Registry lookup for an id that was never registered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("calculator '{id}' not found")]
pub struct LookupFailure {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("calculator id '{id}' is already registered")]
    DuplicateId { id: String },
    #[error("calculator id must not be empty")]
    EmptyId,
}

/// Outcome of invoking a calculator by id through a registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalculatorError {
    #[error(transparent)]
    NotFound(#[from] LookupFailure),
    #[error(transparent)]
    Validation(#[from] ValidationFailure),
}

impl CalculatorError {
    /// Error category for logging and front-end messages
    pub fn category(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "lookup",
            Self::Validation(_) => "validation",
        }
    }

    /// Both variants are fixed by the caller (correct id or corrected input).
    pub fn is_recoverable(&self) -> bool {
        true
    }
}

/// Raw inputs could not be turned into [`crate::CalculatorInputs`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("calculator inputs must be a JSON object")]
    NotAnObject,
    #[error("invalid JSON inputs: {0}")]
    Json(String),
    #[error("input '{field}' is not a scalar")]
    NonScalar {
        field: String,
        #[source]
        source: NonScalarValue,
    },
    #[error("malformed assignment '{0}', expected FIELD=VALUE")]
    MalformedAssignment(String),
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalogue {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse catalogue: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid calculator definition '{id}': {message}")]
    InvalidDefinition { id: String, message: String },
    #[error("calculator id '{id}' is defined more than once in the catalogue")]
    DuplicateId { id: String },
}

impl CatalogError {
    pub fn category(&self) -> &'static str {
        match self {
            Self::Io { .. } => "io",
            Self::Parse(_) => "parse",
            Self::InvalidDefinition { .. } | Self::DuplicateId { .. } => "definition",
        }
    }

    /// A bad catalogue has to be fixed at its source before it can load.
    pub fn is_recoverable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_failure_display_lists_every_field() {
        let failure = ValidationFailure::new(vec![
            FieldError::missing("principal"),
            FieldError::new("rate", ErrorCode::OutOfRange, "rate must be between 0 and 100"),
        ]);
        assert_eq!(
            failure.to_string(),
            "validation failed: principal: principal is required, rate: rate must be between 0 and 100"
        );
        assert_eq!(failure.for_field("rate").count(), 1);
    }

    #[test]
    fn calculator_error_keeps_lookup_and_validation_apart() {
        let lookup: CalculatorError = LookupFailure { id: "nope".to_string() }.into();
        let invalid: CalculatorError =
            ValidationFailure::new(vec![FieldError::missing("x")]).into();
        assert_eq!(lookup.category(), "lookup");
        assert_eq!(invalid.category(), "validation");
        assert_eq!(lookup.to_string(), "calculator 'nope' not found");
        assert!(matches!(invalid, CalculatorError::Validation(_)));
    }
}
