//! Validation stage conventions.
//!
//! Every numeric field must be finite. Money must be non-negative. Percentages
//! use the 0-100 scale and fractions the 0-1 scale, both inclusive. Explicit
//! `min`/`max` bounds are inclusive too. Optional fields that are absent or
//! `null` are skipped rather than rejected.

use crate::CalculatorInputs;
use crate::error::{ErrorCode, FieldError};
use crate::types::{FieldKind, FieldSpec, Warning};
use abacus_types::InputValue;
use serde::Serialize;

/// Full result of the validation stage plus business-rule warnings.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<FieldError>,
    pub warnings: Vec<Warning>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

pub fn require_finite(field: &str, value: f64) -> Result<f64, FieldError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(FieldError::new(field, ErrorCode::NotFinite, format!("{field} must be a finite number")))
    }
}

pub fn require_non_negative(field: &str, value: f64) -> Result<f64, FieldError> {
    if value >= 0.0 {
        Ok(value)
    } else {
        Err(FieldError::new(field, ErrorCode::Negative, format!("{field} cannot be negative")))
    }
}

pub fn require_positive(field: &str, value: f64) -> Result<f64, FieldError> {
    if value > 0.0 {
        Ok(value)
    } else {
        Err(FieldError::new(
            field,
            ErrorCode::OutOfRange,
            format!("{field} must be greater than zero"),
        ))
    }
}

/// Inclusive range check.
pub fn require_in_range(field: &str, value: f64, min: f64, max: f64) -> Result<f64, FieldError> {
    if value < min {
        Err(FieldError::new(
            field,
            ErrorCode::OutOfRange,
            format!("{field} must be at least {min}"),
        ))
    } else if value > max {
        Err(FieldError::new(
            field,
            ErrorCode::OutOfRange,
            format!("{field} cannot exceed {max}"),
        ))
    } else {
        Ok(value)
    }
}

pub fn require_percentage(field: &str, value: f64) -> Result<f64, FieldError> {
    require_in_range(field, value, 0.0, 100.0)
}

fn check_numeric(spec: &FieldSpec, value: &InputValue) -> Result<(), FieldError> {
    let field = spec.name.as_str();
    let number = value
        .as_number()
        .ok_or_else(|| FieldError::wrong_type(field, "number", value.type_name()))?;
    require_finite(field, number)?;
    match spec.kind {
        FieldKind::Money => {
            require_non_negative(field, number)?;
        }
        FieldKind::Percentage => {
            require_percentage(field, number)?;
        }
        FieldKind::Fraction => {
            require_in_range(field, number, 0.0, 1.0)?;
        }
        FieldKind::Count => {
            require_non_negative(field, number)?;
            if number.fract() != 0.0 {
                return Err(FieldError::new(
                    field,
                    ErrorCode::InvalidFieldType,
                    format!("{field} must be a whole number"),
                ));
            }
        }
        _ => {}
    }
    require_in_range(
        field,
        number,
        spec.min.unwrap_or(f64::NEG_INFINITY),
        spec.max.unwrap_or(f64::INFINITY),
    )?;
    Ok(())
}

/// Checks one provided value against its declaration.
pub fn check_field(spec: &FieldSpec, value: &InputValue) -> Result<(), FieldError> {
    let field = spec.name.as_str();
    match spec.kind {
        kind if kind.is_numeric() => check_numeric(spec, value),
        FieldKind::Text => match value.as_str() {
            Some(text) if spec.required && text.trim().is_empty() => {
                Err(FieldError::missing(field))
            }
            Some(_) => Ok(()),
            None => Err(FieldError::wrong_type(field, "string", value.type_name())),
        },
        FieldKind::Choice => {
            let choice = value
                .as_str()
                .ok_or_else(|| FieldError::wrong_type(field, "string", value.type_name()))?;
            if spec.options.iter().any(|option| option == choice) {
                Ok(())
            } else {
                Err(FieldError::new(
                    field,
                    ErrorCode::InvalidChoice,
                    format!("{field} must be one of: {}", spec.options.join(", ")),
                ))
            }
        }
        FieldKind::Boolean => value
            .as_bool()
            .map(|_| ())
            .ok_or_else(|| FieldError::wrong_type(field, "boolean", value.type_name())),
        _ => Ok(()),
    }
}

/// Validates `inputs` against `specs`, reporting errors in declaration order.
/// At most one error is reported per field.
pub fn validate_fields(specs: &[FieldSpec], inputs: &CalculatorInputs) -> Vec<FieldError> {
    specs
        .iter()
        .filter_map(|spec| match inputs.provided(&spec.name) {
            None if spec.required => Some(FieldError::missing(&spec.name)),
            None => None,
            Some(value) => check_field(spec, value).err(),
        })
        .collect()
}

/// Warns when any money field exceeds `limit`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LargeAmountRule {
    pub limit: f64,
}

impl LargeAmountRule {
    pub const fn new(limit: f64) -> Self {
        Self { limit }
    }

    pub fn check(&self, specs: &[FieldSpec], inputs: &CalculatorInputs) -> Vec<Warning> {
        specs
            .iter()
            .filter(|spec| spec.kind == FieldKind::Money)
            .filter_map(|spec| {
                let amount = inputs.provided(&spec.name)?.as_number()?;
                (amount > self.limit).then(|| {
                    Warning::for_field(
                        spec.name.clone(),
                        format!("unusually large amount: {amount} exceeds {}", self.limit),
                    )
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rate_spec() -> Vec<FieldSpec> {
        vec![FieldSpec::percentage("rate", "Rate").required()]
    }

    #[test]
    fn percentage_bounds_are_inclusive() {
        let specs = rate_spec();
        for (rate, ok) in [(-1.0, false), (0.0, true), (100.0, true), (100.0001, false)] {
            let inputs = CalculatorInputs::new().with("rate", rate);
            assert_eq!(validate_fields(&specs, &inputs).is_empty(), ok, "rate {rate}");
        }
    }

    #[test]
    fn missing_required_and_optional_fields() {
        let specs = vec![
            FieldSpec::money("principal", "Principal").required(),
            FieldSpec::money("fees", "Fees"),
        ];
        let errors = validate_fields(&specs, &CalculatorInputs::new().with("fees", InputValue::Null));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ErrorCode::MissingRequiredField);
        assert_eq!(errors[0].field, "principal");
    }

    #[test]
    fn type_and_finiteness_checks() {
        let specs = vec![
            FieldSpec::number("a", "A").required(),
            FieldSpec::number("b", "B").required(),
            FieldSpec::money("c", "C").required(),
            FieldSpec::count("d", "D").required(),
        ];
        let inputs = CalculatorInputs::new()
            .with("a", "ten")
            .with("b", f64::NAN)
            .with("c", -5.0)
            .with("d", 2.5);
        let codes: Vec<ErrorCode> =
            validate_fields(&specs, &inputs).into_iter().map(|e| e.code).collect();
        assert_eq!(
            codes,
            vec![
                ErrorCode::InvalidFieldType,
                ErrorCode::NotFinite,
                ErrorCode::Negative,
                ErrorCode::InvalidFieldType,
            ]
        );
    }

    #[test]
    fn choice_and_explicit_bounds() {
        let specs = vec![
            FieldSpec::choice("loanType", "Loan type", ["fixed", "variable"]).required(),
            FieldSpec::number("years", "Years").min(1.0).max(50.0),
        ];
        let ok = CalculatorInputs::new().with("loanType", "fixed").with("years", 50);
        assert!(validate_fields(&specs, &ok).is_empty());

        let bad = CalculatorInputs::new().with("loanType", "balloon").with("years", 0);
        let errors = validate_fields(&specs, &bad);
        assert_eq!(errors[0].code, ErrorCode::InvalidChoice);
        assert_eq!(errors[1].message, "years must be at least 1");
    }

    #[test]
    fn large_amount_rule_only_warns_on_money() {
        let specs = vec![
            FieldSpec::money("principal", "Principal"),
            FieldSpec::number("score", "Score"),
        ];
        let inputs = CalculatorInputs::new().with("principal", 5_000_000).with("score", 9_000_000);
        let warnings = LargeAmountRule::new(1_000_000.0).check(&specs, &inputs);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field.as_deref(), Some("principal"));
    }
}
