//! Reusable compute-stage formulas.
//!
//! All rates are percentages and are divided by 100 before use. Degenerate
//! inputs (zero investment, zero periods) return a neutral value instead of
//! dividing by zero.

/// Converts a percentage (e.g. `6.5`) to a rate (`0.065`).
pub fn percent_to_rate(percent: f64) -> f64 {
    percent / 100.0
}

pub fn sum<I: IntoIterator<Item = f64>>(values: I) -> f64 {
    values.into_iter().sum()
}

/// Arithmetic mean; an empty input averages to `0.0`.
pub fn average<I: IntoIterator<Item = f64>>(values: I) -> f64 {
    let (total, count) = values.into_iter().fold((0.0, 0u64), |(t, c), v| (t + v, c + 1));
    if count == 0 { 0.0 } else { total / count as f64 }
}

/// Return on investment as a percentage: `(final - initial) / initial * 100`.
pub fn roi(initial_investment: f64, final_value: f64) -> f64 {
    if initial_investment <= 0.0 {
        return 0.0;
    }
    (final_value - initial_investment) / initial_investment * 100.0
}

/// Compound annual growth rate of an investment held for `months`, as a percentage.
/// A final value of zero or less is a total loss (`-100`).
pub fn annualized_roi(initial_investment: f64, final_value: f64, months: f64) -> f64 {
    if initial_investment <= 0.0 || months <= 0.0 {
        return 0.0;
    }
    if final_value <= 0.0 {
        return -100.0;
    }
    let total_return = (final_value - initial_investment) / initial_investment;
    let years = months / 12.0;
    ((1.0 + total_return).powf(1.0 / years) - 1.0) * 100.0
}

/// `principal * (1 + rate/100/frequency)^(frequency * years)`.
///
/// A non-positive `compounding_per_year` is treated as annual compounding.
pub fn compound_future_value(
    principal: f64,
    annual_rate_percent: f64,
    compounding_per_year: f64,
    years: f64,
) -> f64 {
    let frequency = if compounding_per_year > 0.0 { compounding_per_year } else { 1.0 };
    let periodic_rate = percent_to_rate(annual_rate_percent) / frequency;
    principal * (1.0 + periodic_rate).powf(frequency * years)
}

/// `Σ cash_flows[i] / (1 + rate/100)^i`; index 0 is undiscounted.
pub fn net_present_value(rate_percent: f64, cash_flows: &[f64]) -> f64 {
    let base = 1.0 + percent_to_rate(rate_percent);
    cash_flows
        .iter()
        .enumerate()
        .map(|(period, flow)| flow / base.powi(period as i32))
        .sum()
}

/// Monthly payment for a fully amortizing loan.
///
/// A zero rate degrades to linear division; zero payments yields `0.0`.
pub fn amortized_payment(principal: f64, annual_rate_percent: f64, payments: f64) -> f64 {
    if payments <= 0.0 {
        return 0.0;
    }
    let monthly_rate = percent_to_rate(annual_rate_percent) / 12.0;
    if monthly_rate == 0.0 {
        return principal / payments;
    }
    let growth = (1.0 + monthly_rate).powf(payments);
    principal * (monthly_rate * growth) / (growth - 1.0)
}

/// Periods needed to recover `investment` from a constant cash flow.
/// `None` when the flow never pays it back.
pub fn payback_period(investment: f64, cash_flow_per_period: f64) -> Option<f64> {
    if investment <= 0.0 {
        return Some(0.0);
    }
    if cash_flow_per_period <= 0.0 {
        return None;
    }
    Some(investment / cash_flow_per_period)
}
