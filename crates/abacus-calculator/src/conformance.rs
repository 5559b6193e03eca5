//! Contract checks run against a calculator's own examples.
//!
//! For every example a conforming calculator must accept the inputs, agree
//! with itself between `validate` and `validation_report`, produce a finite
//! result tagged with its own id, match the example's expected figures within
//! its tolerance, and produce the same output when invoked twice.

use crate::analysis::RiskLevel;
use crate::plugin::Calculator;
use crate::registry::CalculatorRegistry;
use crate::types::{CalculatorExample, Metrics};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExampleOutcome {
    Passed { result: f64, risk_level: RiskLevel },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExampleCheck {
    pub example: String,
    #[serde(flatten)]
    pub outcome: ExampleOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConformanceReport {
    pub calculator_id: String,
    pub checks: Vec<ExampleCheck>,
}

impl ConformanceReport {
    /// Nothing to check: the calculator declares no examples.
    pub fn is_skipped(&self) -> bool {
        self.checks.is_empty()
    }

    pub fn passed(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ExampleCheck> + '_ {
        self.checks.iter().filter(|c| matches!(c.outcome, ExampleOutcome::Failed { .. }))
    }
}

/// Expected figures of zero are compared absolutely against this bound.
const ZERO_EPSILON: f64 = 1e-9;

fn within_tolerance(actual: f64, expected: f64, percent: f64) -> bool {
    if expected == 0.0 {
        return actual.abs() <= ZERO_EPSILON;
    }
    (actual - expected).abs() / expected.abs() * 100.0 <= percent
}

fn compare_expected(example: &CalculatorExample, metrics: &Metrics) -> Result<(), String> {
    let tolerance = example.tolerance_percent();
    if !tolerance.is_finite() || tolerance < 0.0 {
        return Err(format!("tolerance must be a non-negative percentage, got {tolerance}"));
    }
    for (name, &expected) in &example.expected {
        let actual = metrics
            .figure(name)
            .ok_or_else(|| format!("expected metric '{name}' was not produced"))?;
        if !within_tolerance(actual, expected, tolerance) {
            return Err(format!(
                "expected {name} = {expected}, got {actual} (tolerance {tolerance}%)"
            ));
        }
    }
    Ok(())
}

fn check_example(
    calculator: &dyn Calculator,
    example: &CalculatorExample,
) -> Result<(f64, RiskLevel), String> {
    let descriptor = calculator.descriptor();
    if let Some((field, _)) =
        example.inputs.iter().find(|(field, _)| descriptor.field_spec(field).is_none())
    {
        return Err(format!("example sets undeclared field '{field}'"));
    }

    let accepted = calculator.validate(&example.inputs);
    let report = calculator.validation_report(&example.inputs);
    if accepted != report.is_valid() {
        return Err("validate and validation_report disagree".to_string());
    }
    if !accepted {
        let errors: Vec<String> = report.errors.iter().map(ToString::to_string).collect();
        return Err(format!("rejected by validation: {}", errors.join(", ")));
    }

    let first = calculator
        .calculate(&example.inputs)
        .map_err(|failure| format!("calculate rejected validated inputs: {failure}"))?;
    if first.calculator_id != calculator.id() {
        return Err(format!("output tagged with '{}'", first.calculator_id));
    }
    if !first.result.is_finite() {
        return Err(format!("non-finite result {}", first.result));
    }
    compare_expected(example, &first.metrics)?;

    let second = calculator
        .calculate(&example.inputs)
        .map_err(|failure| format!("second invocation failed: {failure}"))?;
    if first != second {
        return Err("repeated invocation produced a different output".to_string());
    }

    Ok((first.result, first.analysis.risk_level))
}

pub fn check_calculator(calculator: &dyn Calculator) -> ConformanceReport {
    let checks = calculator
        .descriptor()
        .examples
        .iter()
        .map(|example| ExampleCheck {
            example: example.name.clone(),
            outcome: match check_example(calculator, example) {
                Ok((result, risk_level)) => ExampleOutcome::Passed { result, risk_level },
                Err(reason) => ExampleOutcome::Failed { reason },
            },
        })
        .collect();
    ConformanceReport { calculator_id: calculator.id().to_string(), checks }
}

/// Reports for every registered calculator, in id order.
pub fn check_registry(registry: &CalculatorRegistry) -> Vec<ConformanceReport> {
    registry.list().into_iter().map(check_calculator).collect()
}
