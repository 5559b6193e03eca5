//! The invocation pipeline: `Pending -> Validated -> Computed -> CalculationOutput`,
//! with `Err(ValidationFailure)` as the rejected terminal state.
//!
//! [`ValidatedInputs`] can only be obtained by passing validation, so a
//! module's compute stage is unreachable for rejected inputs. The engine is
//! pure: it performs no logging and no I/O.

use crate::CalculatorInputs;
use crate::error::ValidationFailure;
use crate::plugin::{CalculationResult, Calculator, CalculatorModule};
use crate::types::{CalculationOutput, CalculatorDescriptor, Metrics, Warning};
use crate::validation::ValidationReport;
use std::sync::Arc;

/// Inputs that passed the validation stage.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedInputs<'a> {
    inputs: &'a CalculatorInputs,
}

impl<'a> ValidatedInputs<'a> {
    pub(crate) fn new(inputs: &'a CalculatorInputs) -> Self {
        Self { inputs }
    }

    /// Numeric value of a field; `0.0` when an optional field was not provided.
    pub fn number(&self, name: &str) -> f64 {
        self.optional_number(name).unwrap_or(0.0)
    }

    pub fn optional_number(&self, name: &str) -> Option<f64> {
        self.inputs.provided(name).and_then(|v| v.as_number())
    }

    pub fn text(&self, name: &str) -> Option<&'a str> {
        self.inputs.provided(name).and_then(|v| v.as_str())
    }

    pub fn flag(&self, name: &str) -> Option<bool> {
        self.inputs.provided(name).and_then(|v| v.as_bool())
    }

    pub fn raw(&self) -> &'a CalculatorInputs {
        self.inputs
    }
}

pub struct Pending;

pub struct Validated {
    warnings: Vec<Warning>,
}

pub struct Computed {
    warnings: Vec<Warning>,
    metrics: Metrics,
}

/// One pass through a module's stages.
pub struct Invocation<'a, M: ?Sized, S> {
    module: &'a M,
    inputs: &'a CalculatorInputs,
    state: S,
}

impl<'a, M: CalculatorModule + ?Sized> Invocation<'a, M, Pending> {
    pub fn new(module: &'a M, inputs: &'a CalculatorInputs) -> Self {
        Self { module, inputs, state: Pending }
    }

    pub fn validate(self) -> Result<Invocation<'a, M, Validated>, ValidationFailure> {
        let errors = self.module.validate_inputs(self.inputs);
        if !errors.is_empty() {
            return Err(ValidationFailure::new(errors));
        }
        let warnings = self.module.business_rules(self.inputs);
        Ok(Invocation { module: self.module, inputs: self.inputs, state: Validated { warnings } })
    }
}

impl<'a, M: CalculatorModule + ?Sized> Invocation<'a, M, Validated> {
    pub fn warnings(&self) -> &[Warning] {
        &self.state.warnings
    }

    pub fn compute(self) -> Invocation<'a, M, Computed> {
        let metrics = self.module.calculate_result(&ValidatedInputs::new(self.inputs));
        Invocation {
            module: self.module,
            inputs: self.inputs,
            state: Computed { warnings: self.state.warnings, metrics },
        }
    }
}

impl<M: CalculatorModule + ?Sized> Invocation<'_, M, Computed> {
    pub fn metrics(&self) -> &Metrics {
        &self.state.metrics
    }

    pub fn analyze(self) -> CalculationOutput {
        let Computed { warnings, metrics } = self.state;
        let analysis = self.module.generate_analysis(self.inputs, &metrics);
        CalculationOutput {
            calculator_id: self.module.descriptor().id.clone(),
            result: metrics.result,
            metrics,
            analysis,
            warnings,
        }
    }
}

/// Adapts a [`CalculatorModule`] to the [`Calculator`] contract.
#[derive(Debug, Clone)]
pub struct CalculatorEngine<M> {
    module: M,
}

impl<M: CalculatorModule> CalculatorEngine<M> {
    pub fn new(module: M) -> Self {
        Self { module }
    }

    pub fn module(&self) -> &M {
        &self.module
    }
}

impl<M: CalculatorModule + 'static> CalculatorEngine<M> {
    /// Wraps `module` ready for registration.
    pub fn shared(module: M) -> Arc<dyn Calculator> {
        Arc::new(Self::new(module))
    }
}

impl<M: CalculatorModule> Calculator for CalculatorEngine<M> {
    fn descriptor(&self) -> &CalculatorDescriptor {
        self.module.descriptor()
    }

    fn validate(&self, inputs: &CalculatorInputs) -> bool {
        self.module.validate_inputs(inputs).is_empty()
    }

    fn validation_report(&self, inputs: &CalculatorInputs) -> ValidationReport {
        let errors = self.module.validate_inputs(inputs);
        let warnings =
            if errors.is_empty() { self.module.business_rules(inputs) } else { Vec::new() };
        ValidationReport { errors, warnings }
    }

    fn calculate(&self, inputs: &CalculatorInputs) -> CalculationResult {
        Ok(Invocation::new(&self.module, inputs).validate()?.compute().analyze())
    }
}
