//! Return on investment.
//!
//! `returns` is the net gain (or loss) on top of the initial investment, so the
//! final value is `initialInvestment + returns`. Tiering uses the finance
//! family magnitudes; the recommendation is chosen by how the ROI compares to
//! a 15% benchmark.

use crate::CalculatorInputs;
use crate::analysis::{Analysis, RiskThresholds};
use crate::engine::ValidatedInputs;
use crate::error::FieldError;
use crate::plugin::CalculatorModule;
use crate::primitives;
use crate::types::{
    CalculatorDescriptor, CalculatorExample, CalculatorFamily, FieldSpec, Metrics, Warning,
};
use crate::validation::{LargeAmountRule, require_positive, validate_fields};

use super::DEFAULT_LARGE_AMOUNT_LIMIT;

const STRONG_ROI: f64 = 15.0;

#[derive(Debug, Clone)]
pub struct RoiCalculator {
    descriptor: CalculatorDescriptor,
    thresholds: RiskThresholds,
    large_amount: LargeAmountRule,
}

impl Default for RoiCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_LARGE_AMOUNT_LIMIT)
    }
}

impl RoiCalculator {
    pub fn new(large_amount_limit: f64) -> Self {
        let descriptor =
            CalculatorDescriptor::new("roi", "Return on Investment", CalculatorFamily::Finance)
                .with_description("Percentage gain or loss relative to the initial investment")
                .with_tags(["investment", "profitability", "returns"])
                .with_field(
                    FieldSpec::money("initialInvestment", "Initial investment")
                        .required()
                        .describe("Amount invested up front; must be greater than zero"),
                )
                .with_field(
                    FieldSpec::number("returns", "Returns")
                        .required()
                        .describe("Net gain on the investment; negative for a loss"),
                )
                .with_field(
                    FieldSpec::count("investmentPeriod", "Investment period (months)")
                        .min(1.0)
                        .max(600.0),
                )
                .with_example_case(
                    CalculatorExample::new(
                        "half again",
                        CalculatorInputs::new()
                            .with("initialInvestment", 1000)
                            .with("returns", 500),
                    )
                    .expecting("result", 50.0)
                    .expecting("finalValue", 1_500.0)
                    .expecting("netGain", 500.0),
                )
                .with_example_case(
                    CalculatorExample::new(
                        "two year loss",
                        CalculatorInputs::new()
                            .with("initialInvestment", 25_000)
                            .with("returns", -4_000)
                            .with("investmentPeriod", 24),
                    )
                    .expecting("result", -16.0)
                    .expecting("netGain", -4_000.0)
                    .expecting("annualizedRoi", -8.3485),
                );
        Self {
            descriptor,
            thresholds: CalculatorFamily::Finance.default_thresholds(),
            large_amount: LargeAmountRule::new(large_amount_limit),
        }
    }
}

impl CalculatorModule for RoiCalculator {
    fn descriptor(&self) -> &CalculatorDescriptor {
        &self.descriptor
    }

    fn validate_inputs(&self, inputs: &CalculatorInputs) -> Vec<FieldError> {
        let mut errors = validate_fields(&self.descriptor.fields, inputs);
        if errors.iter().all(|e| e.field != "initialInvestment") {
            if let Ok(Some(investment)) = inputs.optional_number("initialInvestment") {
                if let Err(error) = require_positive("initialInvestment", investment) {
                    errors.insert(0, error);
                }
            }
        }
        errors
    }

    fn business_rules(&self, inputs: &CalculatorInputs) -> Vec<Warning> {
        let mut warnings = self.large_amount.check(&self.descriptor.fields, inputs);
        if let (Ok(investment), Ok(returns)) =
            (inputs.number("initialInvestment"), inputs.number("returns"))
        {
            if returns < -investment {
                warnings.push(Warning::for_field(
                    "returns",
                    "loss exceeds the initial investment",
                ));
            }
        }
        warnings
    }

    fn calculate_result(&self, inputs: &ValidatedInputs<'_>) -> Metrics {
        let investment = inputs.number("initialInvestment");
        let final_value = investment + inputs.number("returns");
        let mut metrics = Metrics::new(primitives::roi(investment, final_value))
            .with("finalValue", final_value)
            .with("netGain", final_value - investment);
        if let Some(months) = inputs.optional_number("investmentPeriod") {
            metrics = metrics
                .with("annualizedRoi", primitives::annualized_roi(investment, final_value, months));
        }
        metrics
    }

    fn generate_analysis(&self, _inputs: &CalculatorInputs, metrics: &Metrics) -> Analysis {
        let roi = metrics.result;
        let recommendation = if roi >= STRONG_ROI {
            "Strong return; the investment outperforms a typical benchmark"
        } else if roi < 0.0 {
            "Negative return; reconsider the investment or its cost basis"
        } else {
            "Positive but below-average return; compare against alternatives"
        };
        Analysis {
            risk_level: self.thresholds.classify(roi),
            recommendation: recommendation.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::RiskLevel;
    use crate::engine::CalculatorEngine;
    use crate::error::ErrorCode;
    use crate::plugin::Calculator;

    #[test]
    fn zero_investment_is_rejected() {
        let engine = CalculatorEngine::new(RoiCalculator::default());
        let inputs = CalculatorInputs::new().with("initialInvestment", 0).with("returns", 10);
        let failure = engine.calculate(&inputs).unwrap_err();
        assert_eq!(failure.errors().len(), 1);
        assert_eq!(failure.errors()[0].code, ErrorCode::OutOfRange);
        assert_eq!(failure.errors()[0].field, "initialInvestment");
    }

    #[test]
    fn annualized_roi_only_with_period() {
        let engine = CalculatorEngine::new(RoiCalculator::default());
        let inputs = CalculatorInputs::new()
            .with("initialInvestment", 1000)
            .with("returns", 210)
            .with("investmentPeriod", 24);
        let output = engine.calculate(&inputs).unwrap();
        assert!((output.result - 21.0).abs() < 1e-9);
        assert!((output.metrics.get("annualizedRoi").unwrap() - 10.0).abs() < 1e-9);
        assert_eq!(output.analysis.risk_level, RiskLevel::Low);
        assert!(output.analysis.recommendation.starts_with("Strong return"));

        let output = engine
            .calculate(&CalculatorInputs::new().with("initialInvestment", 1000).with("returns", 50))
            .unwrap();
        assert_eq!(output.metrics.get("annualizedRoi"), None);
    }

    #[test]
    fn total_loss_warns() {
        let engine = CalculatorEngine::new(RoiCalculator::new(10_000.0));
        let inputs = CalculatorInputs::new().with("initialInvestment", 20_000).with("returns", -25_000);
        let output = engine.calculate(&inputs).unwrap();
        assert_eq!(output.result, -125.0);
        let fields: Vec<Option<&str>> = output.warnings.iter().map(|w| w.field.as_deref()).collect();
        assert_eq!(fields, vec![Some("initialInvestment"), Some("returns")]);
        assert!(output.analysis.recommendation.starts_with("Negative return"));
    }
}
