//! Net present value of up to ten yearly cash flows against an up-front cost.
//!
//! Risk runs the other way round from the magnitude families: a negative NPV is
//! high risk, and a positive NPV under 10% of the investment is marginal.

use crate::CalculatorInputs;
use crate::analysis::{Analysis, RecommendationTemplate, RiskThresholds, tiered_analysis};
use crate::engine::ValidatedInputs;
use crate::error::{ErrorCode, FieldError};
use crate::plugin::CalculatorModule;
use crate::primitives;
use crate::types::{
    CalculatorDescriptor, CalculatorExample, CalculatorFamily, FieldSpec, Metrics, Warning,
};
use crate::validation::{LargeAmountRule, validate_fields};

use super::DEFAULT_LARGE_AMOUNT_LIMIT;

pub const MAX_CASH_FLOWS: usize = 10;

/// Share of the investment a positive NPV must exceed to rate as low risk.
const MARGINAL_SHARE: f64 = 0.10;

fn cash_flow_field(period: usize) -> String {
    format!("cashFlow{period}")
}

/// Yearly flows up to the last provided year; gaps before it count as zero.
fn cash_flows(value: impl Fn(&str) -> Option<f64>) -> Vec<f64> {
    let provided: Vec<Option<f64>> =
        (1..=MAX_CASH_FLOWS).map(|period| value(&cash_flow_field(period))).collect();
    let last = provided.iter().rposition(Option::is_some).map_or(0, |i| i + 1);
    provided[..last].iter().map(|flow| flow.unwrap_or(0.0)).collect()
}

#[derive(Debug, Clone)]
pub struct NetPresentValueCalculator {
    descriptor: CalculatorDescriptor,
    recommendations: RecommendationTemplate,
    large_amount: LargeAmountRule,
}

impl Default for NetPresentValueCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_LARGE_AMOUNT_LIMIT)
    }
}

impl NetPresentValueCalculator {
    pub fn new(large_amount_limit: f64) -> Self {
        let mut descriptor = CalculatorDescriptor::new(
            "net-present-value",
            "Net Present Value",
            CalculatorFamily::Finance,
        )
        .with_description("Discounted value of future cash flows less the initial investment")
        .with_tags(["npv", "capital budgeting", "discounting"])
        .with_field(FieldSpec::percentage("discountRate", "Discount rate (%)").required())
        .with_field(FieldSpec::money("initialInvestment", "Initial investment").required());
        for period in 1..=MAX_CASH_FLOWS {
            descriptor = descriptor.with_field(
                FieldSpec::number(cash_flow_field(period), format!("Cash flow, year {period}"))
                    .describe("Negative for a net outflow"),
            );
        }
        let descriptor = descriptor.with_example_case(
            CalculatorExample::new(
                "three year project",
                CalculatorInputs::new()
                    .with("discountRate", 8)
                    .with("initialInvestment", 10_000)
                    .with("cashFlow1", 3_000)
                    .with("cashFlow2", 4_200)
                    .with("cashFlow3", 6_800),
            )
            .expecting("result", 1_776.66)
            .expecting("presentValueOfInflows", 11_776.66)
            .expecting("profitabilityIndex", 1.1777)
            .expecting("periods", 3.0),
        );

        Self {
            descriptor,
            recommendations: RecommendationTemplate::new(
                "Positive NPV; the project clears the discount rate comfortably",
                "Marginal NPV; small changes in assumptions could make it unprofitable",
                "Negative NPV; the project destroys value at this discount rate",
            ),
            large_amount: LargeAmountRule::new(large_amount_limit),
        }
    }
}

impl CalculatorModule for NetPresentValueCalculator {
    fn descriptor(&self) -> &CalculatorDescriptor {
        &self.descriptor
    }

    fn validate_inputs(&self, inputs: &CalculatorInputs) -> Vec<FieldError> {
        let mut errors = validate_fields(&self.descriptor.fields, inputs);
        let any_flow = (1..=MAX_CASH_FLOWS).any(|period| inputs.contains(&cash_flow_field(period)));
        if !any_flow {
            errors.push(FieldError::new(
                cash_flow_field(1),
                ErrorCode::CrossFieldRule,
                "at least one cash flow is required",
            ));
        }
        errors
    }

    fn business_rules(&self, inputs: &CalculatorInputs) -> Vec<Warning> {
        let mut warnings = self.large_amount.check(&self.descriptor.fields, inputs);
        if let Ok(rate) = inputs.number("discountRate") {
            if rate == 0.0 {
                warnings.push(Warning::for_field(
                    "discountRate",
                    "a zero discount rate ignores the time value of money",
                ));
            }
        }
        warnings
    }

    fn calculate_result(&self, inputs: &ValidatedInputs<'_>) -> Metrics {
        let initial = inputs.number("initialInvestment");
        let flows = cash_flows(|field| inputs.optional_number(field));
        // period 0 carries no inflow; the investment is subtracted undiscounted below
        let mut schedule = vec![0.0];
        schedule.extend_from_slice(&flows);
        let present_value = primitives::net_present_value(inputs.number("discountRate"), &schedule);
        let profitability_index = if initial > 0.0 { present_value / initial } else { 0.0 };
        let mut metrics = Metrics::new(present_value - initial)
            .with("presentValueOfInflows", present_value)
            .with("profitabilityIndex", profitability_index)
            .with("periods", flows.len() as f64);
        // simple payback on the average undiscounted flow
        let average_flow = primitives::average(flows.iter().copied());
        if let Some(years) = primitives::payback_period(initial, average_flow) {
            metrics = metrics.with("paybackPeriod", years);
        }
        metrics
    }

    fn generate_analysis(&self, inputs: &CalculatorInputs, metrics: &Metrics) -> Analysis {
        let initial = inputs.number("initialInvestment").unwrap_or(0.0);
        let thresholds = RiskThresholds::floor(0.0, initial * MARGINAL_SHARE);
        tiered_analysis(&thresholds, &self.recommendations, metrics.result)
    }
}
