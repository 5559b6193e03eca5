use crate::CalculatorInputs;
use crate::engine::CalculatorEngine;
use crate::error::{CalculatorError, LookupFailure, RegistrationError};
use crate::plugin::{Calculator, CalculatorModule};
use crate::types::{CalculationOutput, CalculatorFamily};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

pub type SharedCalculator = Arc<dyn Calculator>;

/// What `try_register` does when an id is already taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Last registration wins.
    #[default]
    Replace,
    Reject,
}

impl FromStr for DuplicatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "replace" => Ok(Self::Replace),
            "reject" => Ok(Self::Reject),
            other => Err(format!("unknown duplicate policy '{other}', expected replace or reject")),
        }
    }
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Replace => f.write_str("replace"),
            Self::Reject => f.write_str("reject"),
        }
    }
}

/// Catalogue of calculators addressable by id.
///
/// Populate it during startup, then share it read-only (for example behind an
/// `Arc`). For registration that races with lookups use
/// [`crate::ConcurrentRegistry`].
#[derive(Default)]
pub struct CalculatorRegistry {
    calculators: HashMap<String, SharedCalculator>,
    policy: DuplicatePolicy,
}

impl CalculatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: DuplicatePolicy) -> Self {
        Self { calculators: HashMap::new(), policy }
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Inserts or replaces the entry for `calculator.id()`, returning the
    /// replaced instance. Ignores the duplicate policy.
    pub fn register(&mut self, calculator: SharedCalculator) -> Option<SharedCalculator> {
        let id = calculator.id().to_string();
        let previous = self.calculators.insert(id.clone(), calculator);
        if previous.is_some() {
            warn!(calculator_id = %id, "Replacing previously registered calculator");
        } else {
            debug!(calculator_id = %id, "Registered calculator");
        }
        previous
    }

    /// Registers honoring the registry's [`DuplicatePolicy`].
    pub fn try_register(
        &mut self,
        calculator: SharedCalculator,
    ) -> Result<Option<SharedCalculator>, RegistrationError> {
        if calculator.id().is_empty() {
            return Err(RegistrationError::EmptyId);
        }
        if self.policy == DuplicatePolicy::Reject && self.calculators.contains_key(calculator.id()) {
            return Err(RegistrationError::DuplicateId { id: calculator.id().to_string() });
        }
        Ok(self.register(calculator))
    }

    pub fn register_module<M: CalculatorModule + 'static>(
        &mut self,
        module: M,
    ) -> Option<SharedCalculator> {
        self.register(CalculatorEngine::shared(module))
    }

    pub fn get(&self, id: &str) -> Option<&dyn Calculator> {
        self.calculators.get(id).map(|c| c.as_ref())
    }

    /// Like [`Self::get`] but hands out an owned handle.
    pub fn get_shared(&self, id: &str) -> Option<SharedCalculator> {
        self.calculators.get(id).cloned()
    }

    pub fn lookup(&self, id: &str) -> Result<&dyn Calculator, LookupFailure> {
        self.get(id).ok_or_else(|| LookupFailure { id: id.to_string() })
    }

    /// Every registered calculator, sorted by id.
    pub fn list(&self) -> Vec<&dyn Calculator> {
        let mut calculators: Vec<&dyn Calculator> =
            self.calculators.values().map(|c| c.as_ref()).collect();
        calculators.sort_by(|a, b| a.id().cmp(b.id()));
        calculators
    }

    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.calculators.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn by_category(&self, family: CalculatorFamily) -> Vec<&dyn Calculator> {
        self.list().into_iter().filter(|c| c.descriptor().category == family).collect()
    }

    /// Case-insensitive search over id, name and tags.
    pub fn search(&self, query: &str) -> Vec<&dyn Calculator> {
        self.list().into_iter().filter(|c| c.descriptor().matches(query)).collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.calculators.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.calculators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calculators.is_empty()
    }

    /// Looks up `id` and runs the full pipeline, keeping "not found" and
    /// "invalid input" distinct.
    pub fn invoke(
        &self,
        id: &str,
        inputs: &CalculatorInputs,
    ) -> Result<CalculationOutput, CalculatorError> {
        let calculator = self.lookup(id)?;
        Ok(calculator.calculate(inputs)?)
    }
}

impl fmt::Debug for CalculatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalculatorRegistry")
            .field("calculators", &self.ids())
            .field("policy", &self.policy)
            .finish()
    }
}

impl Extend<SharedCalculator> for CalculatorRegistry {
    fn extend<T: IntoIterator<Item = SharedCalculator>>(&mut self, iter: T) {
        for calculator in iter {
            self.register(calculator);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Analysis, RiskLevel};
    use crate::engine::ValidatedInputs;
    use crate::types::{CalculatorDescriptor, Metrics};

    struct Constant {
        descriptor: CalculatorDescriptor,
        value: f64,
    }

    impl Constant {
        fn new(id: &str, value: f64) -> Self {
            Self {
                descriptor: CalculatorDescriptor::new(id, id.to_uppercase(), CalculatorFamily::Math),
                value,
            }
        }
    }

    impl CalculatorModule for Constant {
        fn descriptor(&self) -> &CalculatorDescriptor {
            &self.descriptor
        }

        fn calculate_result(&self, _inputs: &ValidatedInputs<'_>) -> Metrics {
            Metrics::new(self.value)
        }

        fn generate_analysis(&self, _inputs: &CalculatorInputs, _metrics: &Metrics) -> Analysis {
            Analysis { risk_level: RiskLevel::Low, recommendation: String::new() }
        }
    }

    #[test]
    fn reject_policy_refuses_duplicates() {
        let mut registry = CalculatorRegistry::with_policy(DuplicatePolicy::Reject);
        registry.try_register(CalculatorEngine::shared(Constant::new("a", 1.0))).unwrap();
        let err = registry
            .try_register(CalculatorEngine::shared(Constant::new("a", 2.0)))
            .err()
            .unwrap();
        assert_eq!(err, RegistrationError::DuplicateId { id: "a".to_string() });

        let output = registry.invoke("a", &CalculatorInputs::new()).unwrap();
        assert_eq!(output.result, 1.0);
    }

    #[test]
    fn empty_ids_are_refused() {
        let mut registry = CalculatorRegistry::new();
        let err = registry.try_register(CalculatorEngine::shared(Constant::new("", 1.0)));
        assert_eq!(err.err(), Some(RegistrationError::EmptyId));
        assert!(registry.is_empty());
    }

    #[test]
    fn policy_parsing() {
        assert_eq!("Reject".parse::<DuplicatePolicy>().unwrap(), DuplicatePolicy::Reject);
        assert_eq!("replace".parse::<DuplicatePolicy>().unwrap(), DuplicatePolicy::Replace);
        assert!("ignore".parse::<DuplicatePolicy>().is_err());
    }

    #[test]
    fn debug_lists_ids() {
        let mut registry = CalculatorRegistry::new();
        registry.register_module(Constant::new("b", 1.0));
        registry.register_module(Constant::new("a", 1.0));
        assert_eq!(
            format!("{registry:?}"),
            r#"CalculatorRegistry { calculators: ["a", "b"], policy: Replace }"#
        );
    }
}
