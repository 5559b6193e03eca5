use std::sync::Arc;
use std::thread;

use abacus_calculator::{
    Analysis, CalculatorDescriptor, CalculatorEngine, CalculatorError, CalculatorFamily,
    CalculatorInputs, CalculatorModule, CalculatorRegistry, ConcurrentRegistry, DuplicatePolicy,
    Metrics, RegistrationError, RiskLevel, ValidatedInputs,
};

/// Always returns `value`; `name` tells instances with the same id apart.
struct Fixed {
    descriptor: CalculatorDescriptor,
    value: f64,
}

impl Fixed {
    fn shared(id: &str, name: &str, value: f64) -> Arc<dyn abacus_calculator::Calculator> {
        CalculatorEngine::shared(Self {
            descriptor: CalculatorDescriptor::new(id, name, CalculatorFamily::Math)
                .with_tags(["fixed"]),
            value,
        })
    }
}

impl CalculatorModule for Fixed {
    fn descriptor(&self) -> &CalculatorDescriptor {
        &self.descriptor
    }

    fn calculate_result(&self, _inputs: &ValidatedInputs<'_>) -> Metrics {
        Metrics::new(self.value)
    }

    fn generate_analysis(&self, _inputs: &CalculatorInputs, _metrics: &Metrics) -> Analysis {
        Analysis { risk_level: RiskLevel::Low, recommendation: "fixed".to_string() }
    }
}

#[test]
fn last_registration_wins() {
    let mut registry = CalculatorRegistry::new();
    assert!(registry.register(Fixed::shared("a", "A1", 1.0)).is_none());
    assert!(registry.register(Fixed::shared("b", "B", 2.0)).is_none());
    let replaced = registry.register(Fixed::shared("a", "A2", 3.0)).unwrap();

    assert_eq!(replaced.name(), "A1");
    assert_eq!(registry.get("a").unwrap().name(), "A2");
    assert_eq!(registry.list().len(), 2);
    assert_eq!(registry.invoke("a", &CalculatorInputs::new()).unwrap().result, 3.0);
}

#[test]
fn unknown_id_is_a_lookup_failure() {
    let registry = CalculatorRegistry::new();
    assert!(registry.get("does-not-exist").is_none());

    let failure = registry.lookup("does-not-exist").err().unwrap();
    assert_eq!(failure.id, "does-not-exist");

    let err = registry.invoke("does-not-exist", &CalculatorInputs::new()).unwrap_err();
    assert!(matches!(err, CalculatorError::NotFound(_)));
    assert_eq!(err.category(), "lookup");
}

#[test]
fn list_is_sorted_and_searchable() {
    let mut registry = CalculatorRegistry::new();
    for id in ["zeta", "alpha", "mid"] {
        registry.register(Fixed::shared(id, &id.to_uppercase(), 0.0));
    }
    let ids: Vec<&str> = registry.list().iter().map(|c| c.id()).collect();
    assert_eq!(ids, vec!["alpha", "mid", "zeta"]);
    assert_eq!(registry.search("ALP").len(), 1);
    assert_eq!(registry.search("fixed").len(), 3);
    assert!(registry.search("nothing").is_empty());
}

#[test]
fn isolated_registries_do_not_share_state() {
    let mut first = CalculatorRegistry::new();
    first.register(Fixed::shared("a", "A", 1.0));
    let second = CalculatorRegistry::new();
    assert!(first.contains("a"));
    assert!(!second.contains("a"));
}

#[test]
fn concurrent_registration_keeps_one_entry_per_id() {
    let registry = Arc::new(ConcurrentRegistry::new());
    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for round in 0..50 {
                    let id = format!("calc-{}", round % 10);
                    registry.register(Fixed::shared(&id, "worker", worker as f64));
                    // every reader sees a complete calculator
                    let found = registry.get(&id).unwrap();
                    assert_eq!(found.id(), id);
                    assert!(registry.invoke(&id, &CalculatorInputs::new()).is_ok());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(registry.len(), 10);
    let snapshot = registry.snapshot();
    assert_eq!(snapshot.len(), 10);
    assert_eq!(snapshot.ids()[0], "calc-0");
}

#[test]
fn concurrent_reject_policy() {
    let registry = ConcurrentRegistry::with_policy(DuplicatePolicy::Reject);
    registry.try_register(Fixed::shared("a", "A1", 1.0)).unwrap();
    let err = registry.try_register(Fixed::shared("a", "A2", 2.0)).err().unwrap();
    assert_eq!(err, RegistrationError::DuplicateId { id: "a".to_string() });
    assert_eq!(registry.lookup("a").unwrap().name(), "A1");
}

#[test]
fn concurrent_registry_from_plain_registry() {
    let mut plain = CalculatorRegistry::with_policy(DuplicatePolicy::Reject);
    plain.register(Fixed::shared("a", "A", 1.0));
    plain.register(Fixed::shared("b", "B", 2.0));

    let concurrent = ConcurrentRegistry::from(plain);
    assert_eq!(concurrent.len(), 2);
    assert!(concurrent.try_register(Fixed::shared("b", "B2", 3.0)).is_err());
    let ids: Vec<String> = concurrent.list().iter().map(|c| c.id().to_string()).collect();
    assert_eq!(ids, vec!["a", "b"]);
}
