//! Future value of a lump sum under periodic compounding.

use crate::CalculatorInputs;
use crate::analysis::{Analysis, RecommendationTemplate, RiskThresholds, tiered_analysis};
use crate::engine::ValidatedInputs;
use crate::plugin::CalculatorModule;
use crate::primitives;
use crate::types::{
    CalculatorDescriptor, CalculatorExample, CalculatorFamily, FieldSpec, Metrics, Warning,
};
use crate::validation::LargeAmountRule;

use super::DEFAULT_LARGE_AMOUNT_LIMIT;

/// Rates above this are accepted but flagged.
const HIGH_RATE: f64 = 25.0;

#[derive(Debug, Clone)]
pub struct CompoundInterestCalculator {
    descriptor: CalculatorDescriptor,
    thresholds: RiskThresholds,
    recommendations: RecommendationTemplate,
    large_amount: LargeAmountRule,
}

impl Default for CompoundInterestCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_LARGE_AMOUNT_LIMIT)
    }
}

impl CompoundInterestCalculator {
    pub fn new(large_amount_limit: f64) -> Self {
        let descriptor = CalculatorDescriptor::new(
            "compound-interest",
            "Compound Interest",
            CalculatorFamily::Finance,
        )
        .with_description("Future value of a principal compounded at a fixed annual rate")
        .with_tags(["savings", "interest", "growth"])
        .with_field(FieldSpec::money("principal", "Principal").required())
        .with_field(FieldSpec::percentage("annualRate", "Annual rate (%)").required())
        .with_field(FieldSpec::number("years", "Years").required().min(0.0).max(100.0))
        .with_field(
            FieldSpec::count("compoundingFrequency", "Compounding periods per year")
                .min(1.0)
                .max(365.0)
                .describe("Defaults to annual compounding"),
        )
        .with_example_case(
            CalculatorExample::new(
                "monthly savings",
                CalculatorInputs::new()
                    .with("principal", 10_000)
                    .with("annualRate", 5)
                    .with("years", 10)
                    .with("compoundingFrequency", 12),
            )
            .expecting("result", 16_470.09)
            .expecting("totalInterest", 6_470.09)
            .expecting("effectiveAnnualRate", 5.1162),
        );
        Self {
            descriptor,
            thresholds: CalculatorFamily::Finance.default_thresholds(),
            recommendations: RecommendationTemplate::new(
                "Modest balance; suitable for short-term savings goals",
                "Meaningful growth; review how the balance fits long-term plans",
                "Large projected balance; consider tax treatment and diversification",
            ),
            large_amount: LargeAmountRule::new(large_amount_limit),
        }
    }
}

impl CalculatorModule for CompoundInterestCalculator {
    fn descriptor(&self) -> &CalculatorDescriptor {
        &self.descriptor
    }

    fn business_rules(&self, inputs: &CalculatorInputs) -> Vec<Warning> {
        let mut warnings = self.large_amount.check(&self.descriptor.fields, inputs);
        if let Ok(rate) = inputs.number("annualRate") {
            if rate > HIGH_RATE {
                warnings.push(Warning::for_field(
                    "annualRate",
                    format!("rate of {rate}% is unusually high for a savings product"),
                ));
            }
        }
        warnings
    }

    fn calculate_result(&self, inputs: &ValidatedInputs<'_>) -> Metrics {
        let principal = inputs.number("principal");
        let rate = inputs.number("annualRate");
        let frequency = inputs.optional_number("compoundingFrequency").unwrap_or(1.0);
        let future =
            primitives::compound_future_value(principal, rate, frequency, inputs.number("years"));
        let effective = primitives::compound_future_value(100.0, rate, frequency, 1.0) - 100.0;
        Metrics::new(future)
            .with("totalInterest", future - principal)
            .with("effectiveAnnualRate", effective)
    }

    fn generate_analysis(&self, _inputs: &CalculatorInputs, metrics: &Metrics) -> Analysis {
        tiered_analysis(&self.thresholds, &self.recommendations, metrics.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::RiskLevel;
    use crate::engine::CalculatorEngine;
    use crate::plugin::Calculator;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn annual_compounding_by_default() {
        let engine = CalculatorEngine::new(CompoundInterestCalculator::default());
        let inputs = CalculatorInputs::new()
            .with("principal", 1000)
            .with("annualRate", 10)
            .with("years", 2);
        let output = engine.calculate(&inputs).unwrap();
        assert!(close(output.result, 1210.0));
        assert!(close(output.metrics.get("totalInterest").unwrap(), 210.0));
        assert!(close(output.metrics.get("effectiveAnnualRate").unwrap(), 10.0));
        assert_eq!(output.analysis.risk_level, RiskLevel::Low);
    }

    #[test]
    fn high_rates_warn_but_compute() {
        let engine = CalculatorEngine::new(CompoundInterestCalculator::default());
        let inputs = CalculatorInputs::new()
            .with("principal", 50_000)
            .with("annualRate", 30)
            .with("years", 5)
            .with("compoundingFrequency", 4);
        let output = engine.calculate(&inputs).unwrap();
        assert_eq!(output.warnings.len(), 1);
        assert_eq!(output.warnings[0].field.as_deref(), Some("annualRate"));
        assert_eq!(output.analysis.risk_level, RiskLevel::High);
    }

    #[test]
    fn frequency_must_be_a_whole_number_in_range() {
        let engine = CalculatorEngine::new(CompoundInterestCalculator::default());
        let base = CalculatorInputs::new()
            .with("principal", 1000)
            .with("annualRate", 5)
            .with("years", 1);
        assert!(!engine.validate(&base.clone().with("compoundingFrequency", 0)));
        assert!(!engine.validate(&base.clone().with("compoundingFrequency", 2.5)));
        assert!(!engine.validate(&base.clone().with("compoundingFrequency", 366)));
        assert!(engine.validate(&base.with("compoundingFrequency", 365)));
    }
}
