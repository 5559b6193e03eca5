//! Calculators defined entirely by data: a descriptor, one of a handful of
//! shared formulas, and tiering parameters.

use crate::CalculatorInputs;
use crate::analysis::{Analysis, RecommendationTemplate, RiskThresholds, tiered_analysis};
use crate::engine::ValidatedInputs;
use crate::plugin::CalculatorModule;
use crate::primitives;
use crate::types::{CalculatorDescriptor, FieldKind, FieldSpec, Metrics, Warning};
use crate::validation::LargeAmountRule;
use serde::{Deserialize, Serialize};

/// Shared compute shapes. Field names refer to the calculator's inputs; rates
/// are percentages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Formula {
    /// Sum of the listed fields, or of every declared numeric field when
    /// `fields` is empty.
    Sum {
        #[serde(default)]
        fields: Vec<String>,
    },
    /// Mean of the listed fields, or of every declared numeric field when
    /// `fields` is empty.
    Average {
        #[serde(default)]
        fields: Vec<String>,
    },
    /// ROI where the final value is `investment + returns`.
    Roi { investment: String, returns: String },
    CompoundFutureValue {
        principal: String,
        rate: String,
        years: String,
        /// Compounding periods per year; annual when omitted.
        #[serde(default)]
        frequency: Option<String>,
    },
    /// Flows are discounted from period 1; an initial investment, when named,
    /// is an undiscounted outflow at period 0.
    NetPresentValue {
        rate: String,
        #[serde(default)]
        initial_investment: Option<String>,
        flows: Vec<String>,
    },
    AmortizedPayment { principal: String, rate: String, months: String },
}

impl Formula {
    /// Input fields the formula reads.
    pub fn referenced_fields(&self) -> Vec<&str> {
        match self {
            Formula::Sum { fields } | Formula::Average { fields } => {
                fields.iter().map(String::as_str).collect()
            }
            Formula::Roi { investment, returns } => vec![investment.as_str(), returns.as_str()],
            Formula::CompoundFutureValue { principal, rate, years, frequency } => {
                let mut fields = vec![principal.as_str(), rate.as_str(), years.as_str()];
                fields.extend(frequency.as_deref());
                fields
            }
            Formula::NetPresentValue { rate, initial_investment, flows } => {
                let mut fields = vec![rate.as_str()];
                fields.extend(initial_investment.as_deref());
                fields.extend(flows.iter().map(String::as_str));
                fields
            }
            Formula::AmortizedPayment { principal, rate, months } => {
                vec![principal.as_str(), rate.as_str(), months.as_str()]
            }
        }
    }

    /// Inputs outside `declared` are never read.
    pub fn evaluate(&self, declared: &[FieldSpec], inputs: &ValidatedInputs<'_>) -> Metrics {
        match self {
            Formula::Sum { fields } => {
                let values = selected_values(declared, inputs, fields);
                Metrics::new(primitives::sum(values.iter().copied()))
                    .with("count", values.len() as f64)
            }
            Formula::Average { fields } => {
                let values = selected_values(declared, inputs, fields);
                Metrics::new(primitives::average(values.iter().copied()))
                    .with("count", values.len() as f64)
                    .with("total", primitives::sum(values.iter().copied()))
            }
            Formula::Roi { investment, returns } => {
                let initial = inputs.number(investment);
                let gain = inputs.number(returns);
                Metrics::new(primitives::roi(initial, initial + gain))
                    .with("finalValue", initial + gain)
                    .with("netGain", gain)
            }
            Formula::CompoundFutureValue { principal, rate, years, frequency } => {
                let principal = inputs.number(principal);
                let frequency = frequency.as_deref().map_or(1.0, |f| inputs.number(f));
                let future = primitives::compound_future_value(
                    principal,
                    inputs.number(rate),
                    frequency,
                    inputs.number(years),
                );
                Metrics::new(future).with("totalInterest", future - principal)
            }
            Formula::NetPresentValue { rate, initial_investment, flows } => {
                let initial = initial_investment.as_deref().map_or(0.0, |f| inputs.number(f));
                let mut cash_flows = vec![-initial];
                cash_flows.extend(flows.iter().map(|f| inputs.number(f)));
                let npv = primitives::net_present_value(inputs.number(rate), &cash_flows);
                Metrics::new(npv).with("presentValueOfInflows", npv + initial)
            }
            Formula::AmortizedPayment { principal, rate, months } => {
                let principal = inputs.number(principal);
                let payments = inputs.number(months);
                let payment = primitives::amortized_payment(principal, inputs.number(rate), payments);
                Metrics::new(payment)
                    .with("totalPaid", payment * payments)
                    .with("totalInterest", payment * payments - principal)
            }
        }
    }
}

fn selected_values(
    declared: &[FieldSpec],
    inputs: &ValidatedInputs<'_>,
    fields: &[String],
) -> Vec<f64> {
    if fields.is_empty() {
        declared
            .iter()
            .filter(|spec| spec.kind.is_numeric())
            .filter_map(|spec| inputs.optional_number(&spec.name))
            .collect()
    } else {
        fields.iter().filter_map(|f| inputs.optional_number(f)).collect()
    }
}

/// A [`CalculatorModule`] assembled from a descriptor and a [`Formula`].
#[derive(Debug, Clone, PartialEq)]
pub struct FormulaCalculator {
    descriptor: CalculatorDescriptor,
    formula: Formula,
    thresholds: RiskThresholds,
    recommendations: RecommendationTemplate,
    large_amount: Option<LargeAmountRule>,
}

impl FormulaCalculator {
    /// Uses the family's default thresholds and recommendation wording.
    pub fn new(descriptor: CalculatorDescriptor, formula: Formula) -> Self {
        let thresholds = descriptor.category.default_thresholds();
        let recommendations = descriptor.category.default_recommendations();
        Self { descriptor, formula, thresholds, recommendations, large_amount: None }
    }

    pub fn with_thresholds(mut self, thresholds: RiskThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_recommendations(mut self, recommendations: RecommendationTemplate) -> Self {
        self.recommendations = recommendations;
        self
    }

    pub fn with_large_amount_limit(mut self, limit: f64) -> Self {
        self.large_amount = Some(LargeAmountRule::new(limit));
        self
    }

    pub fn formula(&self) -> &Formula {
        &self.formula
    }

    pub fn thresholds(&self) -> &RiskThresholds {
        &self.thresholds
    }

    pub fn large_amount_limit(&self) -> Option<f64> {
        self.large_amount.map(|rule| rule.limit)
    }

    /// Checks the definition is internally consistent: every referenced field
    /// is declared and numeric, field ranges are not inverted, and the
    /// thresholds are well ordered.
    pub fn check(&self) -> Result<(), String> {
        if self.descriptor.id.trim().is_empty() {
            return Err("id must not be empty".to_string());
        }
        for field in self.formula.referenced_fields() {
            match self.descriptor.field_spec(field) {
                None => return Err(format!("formula reads undeclared field '{field}'")),
                Some(spec) if !spec.kind.is_numeric() => {
                    return Err(format!(
                        "formula reads field '{field}' declared as {}",
                        spec.kind.as_str()
                    ));
                }
                Some(_) => {}
            }
        }
        for spec in &self.descriptor.fields {
            if spec.kind == FieldKind::Choice && spec.options.is_empty() {
                return Err(format!("choice field '{}' declares no options", spec.name));
            }
            if let (Some(min), Some(max)) = (spec.min, spec.max) {
                if min > max {
                    return Err(format!(
                        "field '{}' has min {min} greater than max {max}",
                        spec.name
                    ));
                }
            }
        }
        self.thresholds.check()
    }
}

impl CalculatorModule for FormulaCalculator {
    fn descriptor(&self) -> &CalculatorDescriptor {
        &self.descriptor
    }

    fn business_rules(&self, inputs: &CalculatorInputs) -> Vec<Warning> {
        self.large_amount
            .map(|rule| rule.check(&self.descriptor.fields, inputs))
            .unwrap_or_default()
    }

    fn calculate_result(&self, inputs: &ValidatedInputs<'_>) -> Metrics {
        self.formula.evaluate(&self.descriptor.fields, inputs)
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
    use crate::types::CalculatorFamily;

    fn fee_total() -> FormulaCalculator {
        let descriptor =
            CalculatorDescriptor::new("legal-fees", "Legal Fees", CalculatorFamily::Legal)
                .with_field(FieldSpec::money("filingFee", "Filing fee").required())
                .with_field(FieldSpec::money("attorneyFee", "Attorney fee"));
        FormulaCalculator::new(descriptor, Formula::Sum { fields: Vec::new() })
    }

    #[test]
    fn sum_over_declared_numeric_fields() {
        let engine = CalculatorEngine::new(fee_total());
        let output = engine
            .calculate(&CalculatorInputs::new().with("filingFee", 100).with("attorneyFee", 250))
            .unwrap();
        assert_eq!(output.result, 350.0);
        assert_eq!(output.metrics.get("count"), Some(2.0));
        // legal family tiers at 1,000 / 100
        assert_eq!(output.analysis.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn undeclared_inputs_are_left_out_of_the_sum() {
        let engine = CalculatorEngine::new(fee_total());
        let output = engine
            .calculate(
                &CalculatorInputs::new()
                    .with("filingFee", 100)
                    .with("junk", f64::NAN)
                    .with("typoAttorneyFee", -5000),
            )
            .unwrap();
        assert_eq!(output.result, 100.0);
        assert_eq!(output.metrics.get("count"), Some(1.0));
    }

    #[test]
    fn listed_fields_skip_absent_optionals() {
        let mut calculator = fee_total();
        calculator.formula = Formula::Average {
            fields: vec!["filingFee".to_string(), "attorneyFee".to_string()],
        };
        let engine = CalculatorEngine::new(calculator);
        let output = engine.calculate(&CalculatorInputs::new().with("filingFee", 80)).unwrap();
        assert_eq!(output.result, 80.0);
        assert_eq!(output.analysis.risk_level, RiskLevel::Low);
    }

    #[test]
    fn check_catches_undeclared_fields() {
        let calculator = FormulaCalculator::new(
            CalculatorDescriptor::new("bad", "Bad", CalculatorFamily::Math),
            Formula::Roi { investment: "cost".to_string(), returns: "gain".to_string() },
        );
        assert_eq!(calculator.check().unwrap_err(), "formula reads undeclared field 'cost'");
        assert!(fee_total().check().is_ok());
    }

    #[test]
    fn check_rejects_inverted_ranges() {
        let descriptor = CalculatorDescriptor::new("steps", "Steps", CalculatorFamily::Health)
            .with_field(FieldSpec::number("steps", "Steps").min(100.0).max(10.0));
        let calculator = FormulaCalculator::new(descriptor, Formula::Sum { fields: Vec::new() });
        assert_eq!(
            calculator.check().unwrap_err(),
            "field 'steps' has min 100 greater than max 10"
        );

        let descriptor = CalculatorDescriptor::new("steps", "Steps", CalculatorFamily::Health)
            .with_field(FieldSpec::number("steps", "Steps").min(10.0).max(10.0));
        let calculator = FormulaCalculator::new(descriptor, Formula::Sum { fields: Vec::new() });
        assert!(calculator.check().is_ok());
    }

    #[test]
    fn npv_formula_treats_initial_investment_as_outflow() {
        let descriptor = CalculatorDescriptor::new("npv", "NPV", CalculatorFamily::Finance)
            .with_field(FieldSpec::percentage("rate", "Rate").required())
            .with_field(FieldSpec::money("cost", "Cost").required())
            .with_field(FieldSpec::number("y1", "Year 1"))
            .with_field(FieldSpec::number("y2", "Year 2"));
        let formula = Formula::NetPresentValue {
            rate: "rate".to_string(),
            initial_investment: Some("cost".to_string()),
            flows: vec!["y1".to_string(), "y2".to_string()],
        };
        let engine = CalculatorEngine::new(FormulaCalculator::new(descriptor, formula));
        let output = engine
            .calculate(
                &CalculatorInputs::new()
                    .with("rate", 10)
                    .with("cost", 1000)
                    .with("y1", 550)
                    .with("y2", 605),
            )
            .unwrap();
        assert!(output.result.abs() < 1e-9);
        assert!((output.metrics.get("presentValueOfInflows").unwrap() - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn formula_serde_uses_type_tag() {
        let formula: Formula = serde_json::from_str(
            r#"{"type": "amortized_payment", "principal": "p", "rate": "r", "months": "m"}"#,
        )
        .unwrap();
        assert_eq!(formula.referenced_fields(), vec!["p", "r", "m"]);
    }
}
