//! Built-in calculators shipped with Abacus.

use crate::registry::CalculatorRegistry;

// Investment calculators
pub mod compound_interest;
pub mod net_present_value;
pub mod roi;

// Lending calculators
pub mod mortgage_payment;

pub use compound_interest::CompoundInterestCalculator;
pub use mortgage_payment::MortgagePaymentCalculator;
pub use net_present_value::NetPresentValueCalculator;
pub use roi::RoiCalculator;

/// Money inputs above this produce an "unusually large amount" warning.
pub const DEFAULT_LARGE_AMOUNT_LIMIT: f64 = 1_000_000.0;

/// Registers every built-in calculator, replacing any entry with the same id.
pub fn register_builtins(registry: &mut CalculatorRegistry, large_amount_limit: f64) {
    registry.register_module(RoiCalculator::new(large_amount_limit));
    registry.register_module(CompoundInterestCalculator::new(large_amount_limit));
    registry.register_module(NetPresentValueCalculator::new(large_amount_limit));
    registry.register_module(MortgagePaymentCalculator::new(large_amount_limit));
}

pub fn builtin_registry() -> CalculatorRegistry {
    let mut registry = CalculatorRegistry::new();
    register_builtins(&mut registry, DEFAULT_LARGE_AMOUNT_LIMIT);
    registry
}
