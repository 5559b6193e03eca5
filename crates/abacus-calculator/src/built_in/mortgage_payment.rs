//! Monthly payment on a fixed-rate, fully amortizing mortgage.
//!
//! The primary result is principal and interest only. Optional annual
//! property tax and insurance are spread over twelve months into
//! `totalMonthlyPayment`. Tiers are on the monthly payment: above 5,000 is
//! high, above 2,000 medium.

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

const STANDARD_TERM_YEARS: f64 = 30.0;
const HIGH_MORTGAGE_RATE: f64 = 12.0;

#[derive(Debug, Clone)]
pub struct MortgagePaymentCalculator {
    descriptor: CalculatorDescriptor,
    thresholds: RiskThresholds,
    recommendations: RecommendationTemplate,
    large_amount: LargeAmountRule,
}

impl Default for MortgagePaymentCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_LARGE_AMOUNT_LIMIT)
    }
}

impl MortgagePaymentCalculator {
    pub fn new(large_amount_limit: f64) -> Self {
        let descriptor = CalculatorDescriptor::new(
            "mortgage-payment",
            "Mortgage Payment",
            CalculatorFamily::Finance,
        )
        .with_description("Monthly principal and interest on a fixed-rate mortgage")
        .with_tags(["mortgage", "loan", "housing", "amortization"])
        .with_field(FieldSpec::money("loanAmount", "Loan amount").required())
        .with_field(FieldSpec::percentage("interestRate", "Interest rate (%)").required())
        .with_field(FieldSpec::count("loanTerm", "Loan term (years)").required().min(1.0).max(50.0))
        .with_field(FieldSpec::money("propertyTax", "Annual property tax"))
        .with_field(FieldSpec::money("homeInsurance", "Annual home insurance"))
        .with_example_case(
            CalculatorExample::new(
                "thirty year fixed",
                CalculatorInputs::new()
                    .with("loanAmount", 300_000)
                    .with("interestRate", 6.5)
                    .with("loanTerm", 30),
            )
            .expecting("result", 1_896.20)
            .expecting("totalPaid", 682_633.47)
            .expecting("numberOfPayments", 360.0),
        )
        .with_example_case(
            CalculatorExample::new(
                "fifteen year with escrow",
                CalculatorInputs::new()
                    .with("loanAmount", 250_000)
                    .with("interestRate", 5.75)
                    .with("loanTerm", 15)
                    .with("propertyTax", 4_800)
                    .with("homeInsurance", 1_200),
            )
            .expecting("result", 2_076.03)
            .expecting("totalMonthlyPayment", 2_576.03),
        );
        Self {
            descriptor,
            thresholds: RiskThresholds::magnitude(5_000.0, 2_000.0),
            recommendations: RecommendationTemplate::new(
                "Payment is manageable for most household budgets",
                "Payment is substantial; confirm it stays under 28% of gross income",
                "Payment is very high; consider a larger down payment or a longer term",
            ),
            large_amount: LargeAmountRule::new(large_amount_limit),
        }
    }
}

impl CalculatorModule for MortgagePaymentCalculator {
    fn descriptor(&self) -> &CalculatorDescriptor {
        &self.descriptor
    }

    fn business_rules(&self, inputs: &CalculatorInputs) -> Vec<Warning> {
        let mut warnings = self.large_amount.check(&self.descriptor.fields, inputs);
        if let Ok(term) = inputs.number("loanTerm") {
            if term > STANDARD_TERM_YEARS {
                warnings.push(Warning::for_field(
                    "loanTerm",
                    format!("term of {term} years is longer than a standard 30-year mortgage"),
                ));
            }
        }
        if let Ok(rate) = inputs.number("interestRate") {
            if rate > HIGH_MORTGAGE_RATE {
                warnings.push(Warning::for_field(
                    "interestRate",
                    format!("rate of {rate}% is well above typical mortgage rates"),
                ));
            }
        }
        warnings
    }

    fn calculate_result(&self, inputs: &ValidatedInputs<'_>) -> Metrics {
        let principal = inputs.number("loanAmount");
        let payments = inputs.number("loanTerm") * 12.0;
        let payment =
            primitives::amortized_payment(principal, inputs.number("interestRate"), payments);
        let escrow = (inputs.number("propertyTax") + inputs.number("homeInsurance")) / 12.0;
        let total_paid = payment * payments;
        Metrics::new(payment)
            .with("totalMonthlyPayment", payment + escrow)
            .with("totalPaid", total_paid)
            .with("totalInterest", total_paid - principal)
            .with("numberOfPayments", payments)
    }

    fn generate_analysis(&self, _inputs: &CalculatorInputs, metrics: &Metrics) -> Analysis {
        tiered_analysis(&self.thresholds, &self.recommendations, metrics.result)
    }
}
