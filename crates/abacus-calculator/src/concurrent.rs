//! Registry variant for processes that register calculators while other
//! threads are already looking them up (lazily loaded catalogues and the like).
//!
//! Each entry holds an `Arc`, and replacement swaps the `Arc` under the
//! shard lock, so a reader sees either the old or the new calculator, never a
//! partially constructed one. Handles are cloned out before invocation; no
//! shard lock is held while a calculator runs.

use crate::CalculatorInputs;
use crate::error::{CalculatorError, LookupFailure, RegistrationError};
use crate::registry::{CalculatorRegistry, DuplicatePolicy, SharedCalculator};
use crate::types::CalculationOutput;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Default)]
pub struct ConcurrentRegistry {
    calculators: DashMap<String, SharedCalculator>,
    policy: DuplicatePolicy,
}

impl ConcurrentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: DuplicatePolicy) -> Self {
        Self { calculators: DashMap::new(), policy }
    }

    /// Last-write-wins insert; returns the replaced instance.
    pub fn register(&self, calculator: SharedCalculator) -> Option<SharedCalculator> {
        let id = calculator.id().to_string();
        let previous = self.calculators.insert(id.clone(), calculator);
        if previous.is_some() {
            warn!(calculator_id = %id, "Replacing previously registered calculator");
        } else {
            debug!(calculator_id = %id, "Registered calculator");
        }
        previous
    }

    /// Registers honoring the duplicate policy. The check and the insert
    /// happen under the same entry lock.
    pub fn try_register(
        &self,
        calculator: SharedCalculator,
    ) -> Result<Option<SharedCalculator>, RegistrationError> {
        if calculator.id().is_empty() {
            return Err(RegistrationError::EmptyId);
        }
        let id = calculator.id().to_string();
        match self.calculators.entry(id.clone()) {
            Entry::Occupied(_) if self.policy == DuplicatePolicy::Reject => {
                Err(RegistrationError::DuplicateId { id })
            }
            Entry::Occupied(mut occupied) => {
                warn!(calculator_id = %id, "Replacing previously registered calculator");
                Ok(Some(occupied.insert(calculator)))
            }
            Entry::Vacant(vacant) => {
                vacant.insert(calculator);
                debug!(calculator_id = %id, "Registered calculator");
                Ok(None)
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<SharedCalculator> {
        self.calculators.get(id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn lookup(&self, id: &str) -> Result<SharedCalculator, LookupFailure> {
        self.get(id).ok_or_else(|| LookupFailure { id: id.to_string() })
    }

    /// Point-in-time listing, sorted by id.
    pub fn list(&self) -> Vec<SharedCalculator> {
        let mut calculators: Vec<SharedCalculator> =
            self.calculators.iter().map(|entry| Arc::clone(entry.value())).collect();
        calculators.sort_by(|a, b| a.id().cmp(b.id()));
        calculators
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

    pub fn invoke(
        &self,
        id: &str,
        inputs: &CalculatorInputs,
    ) -> Result<CalculationOutput, CalculatorError> {
        let calculator = self.lookup(id)?;
        Ok(calculator.calculate(inputs)?)
    }

    /// Freezes the current contents into a plain registry for read-only sharing.
    pub fn snapshot(&self) -> CalculatorRegistry {
        let mut registry = CalculatorRegistry::with_policy(self.policy);
        registry.extend(self.list());
        registry
    }
}

impl From<CalculatorRegistry> for ConcurrentRegistry {
    fn from(registry: CalculatorRegistry) -> Self {
        let concurrent = Self::with_policy(registry.policy());
        for id in registry.ids() {
            if let Some(calculator) = registry.get_shared(id) {
                concurrent.calculators.insert(id.to_string(), calculator);
            }
        }
        concurrent
    }
}
