use crate::CalculatorInputs;
use crate::analysis::Analysis;
use crate::engine::ValidatedInputs;
use crate::error::{FieldError, ValidationFailure};
use crate::types::{CalculationOutput, CalculatorDescriptor, Metrics, Warning};
use crate::validation::{ValidationReport, validate_fields};

pub type CalculationResult = Result<CalculationOutput, ValidationFailure>;

/// The uniform surface every registered calculator exposes.
///
/// Calculators are stateless and thread-safe. `calculate` is a pure function
/// of its inputs and never computes on inputs that `validate` rejects.
pub trait Calculator: Send + Sync {
    fn descriptor(&self) -> &CalculatorDescriptor;

    fn id(&self) -> &str {
        &self.descriptor().id
    }

    fn name(&self) -> &str {
        &self.descriptor().name
    }

    fn description(&self) -> &str {
        &self.descriptor().description
    }

    /// Runs only the validation stage.
    fn validate(&self, inputs: &CalculatorInputs) -> bool;

    /// Validation errors plus, for valid inputs, business-rule warnings.
    fn validation_report(&self, inputs: &CalculatorInputs) -> ValidationReport;

    /// First validation message for `field`, if any. Used for per-field
    /// feedback while a form is being filled in.
    fn validate_field(&self, field: &str, inputs: &CalculatorInputs) -> Option<String> {
        self.validation_report(inputs)
            .errors
            .into_iter()
            .find(|e| e.field == field)
            .map(|e| e.message)
    }

    /// Validates, computes and analyzes.
    fn calculate(&self, inputs: &CalculatorInputs) -> CalculationResult;
}

/// The three stages a calculation module supplies. Wrap a module in
/// [`crate::CalculatorEngine`] to obtain a [`Calculator`].
pub trait CalculatorModule: Send + Sync {
    fn descriptor(&self) -> &CalculatorDescriptor;

    /// Defaults to checking the declared field specs.
    fn validate_inputs(&self, inputs: &CalculatorInputs) -> Vec<FieldError> {
        validate_fields(&self.descriptor().fields, inputs)
    }

    /// Non-blocking warnings; only consulted for valid inputs.
    fn business_rules(&self, _inputs: &CalculatorInputs) -> Vec<Warning> {
        Vec::new()
    }

    fn calculate_result(&self, inputs: &ValidatedInputs<'_>) -> Metrics;

    fn generate_analysis(&self, inputs: &CalculatorInputs, metrics: &Metrics) -> Analysis;
}
