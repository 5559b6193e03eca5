//! TOML catalogues of formula-backed calculators.
//!
//! ```toml
//! [[calculator]]
//! id = "legal-fees"
//! name = "Legal Fee Total"
//! category = "legal"
//! formula = { type = "sum" }
//!
//! [[calculator.fields]]
//! name = "filingFee"
//! kind = "money"
//! required = true
//! ```

use crate::analysis::{RecommendationTemplate, RiskThresholds};
use crate::error::CatalogError;
use crate::formula::{Formula, FormulaCalculator};
use crate::plugin::CalculatorModule;
use crate::types::{CalculatorDescriptor, CalculatorExample, CalculatorFamily, FieldSpec};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Catalog {
    #[serde(default, rename = "calculator")]
    calculators: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogEntry {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    category: CalculatorFamily,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    fields: Vec<FieldSpec>,
    #[serde(default)]
    examples: Vec<CalculatorExample>,
    formula: Formula,
    #[serde(default)]
    thresholds: Option<RiskThresholds>,
    #[serde(default)]
    recommendations: Option<RecommendationTemplate>,
    #[serde(default)]
    large_amount_limit: Option<f64>,
}

impl CatalogEntry {
    fn into_calculator(self) -> Result<FormulaCalculator, CatalogError> {
        let id = self.id.clone();
        let descriptor = CalculatorDescriptor {
            id: self.id,
            name: self.name,
            description: self.description,
            category: self.category,
            tags: self.tags,
            fields: self.fields,
            examples: self.examples,
        };

        let mut calculator = FormulaCalculator::new(descriptor, self.formula);
        if let Some(thresholds) = self.thresholds {
            calculator = calculator.with_thresholds(thresholds);
        }
        if let Some(recommendations) = self.recommendations {
            calculator = calculator.with_recommendations(recommendations);
        }
        if let Some(limit) = self.large_amount_limit {
            calculator = calculator.with_large_amount_limit(limit);
        }

        calculator
            .check()
            .map_err(|message| CatalogError::InvalidDefinition { id, message })?;
        Ok(calculator)
    }
}

/// Parses catalogue text. Every definition is checked, and ids must be unique
/// within one catalogue.
pub fn parse_catalog(source: &str) -> Result<Vec<FormulaCalculator>, CatalogError> {
    let catalog: Catalog = toml::from_str(source)?;
    let mut seen = HashSet::new();
    let mut calculators = Vec::with_capacity(catalog.calculators.len());

    for entry in catalog.calculators {
        if !seen.insert(entry.id.clone()) {
            return Err(CatalogError::DuplicateId { id: entry.id });
        }
        let calculator = entry.into_calculator()?;
        debug!(calculator_id = %calculator.descriptor().id, "Parsed catalogue calculator");
        calculators.push(calculator);
    }

    Ok(calculators)
}

pub fn load_catalog(path: &Path) -> Result<Vec<FormulaCalculator>, CatalogError> {
    let source = std::fs::read_to_string(path)
        .map_err(|source| CatalogError::Io { path: path.to_path_buf(), source })?;
    let calculators = parse_catalog(&source)?;
    info!(path = %path.display(), count = calculators.len(), "Loaded calculator catalogue");
    Ok(calculators)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::TierDirection;

    const BMI: &str = r#"
[[calculator]]
id = "bmi"
name = "Body Mass Index"
category = "health"
tags = ["fitness"]
formula = { type = "average", fields = ["weight"] }
thresholds = { high = 18.5, medium = 25.0, direction = "lower_is_riskier" }

[[calculator.fields]]
name = "weight"
kind = "number"
required = true
min = 1

[[calculator.examples]]
name = "typical"
inputs = { weight = 70 }
expected = { result = 70, count = 1 }
tolerance = 0.5
"#;

    #[test]
    fn parses_fields_examples_and_thresholds() {
        let calculators = parse_catalog(BMI).unwrap();
        assert_eq!(calculators.len(), 1);

        let bmi = &calculators[0];
        let descriptor = bmi.descriptor();
        assert_eq!(descriptor.category, CalculatorFamily::Health);
        assert_eq!(descriptor.fields[0].min, Some(1.0));
        assert_eq!(descriptor.examples[0].inputs.number("weight").unwrap(), 70.0);
        assert_eq!(descriptor.examples[0].expected.get("result"), Some(&70.0));
        assert_eq!(descriptor.examples[0].tolerance_percent(), 0.5);
        assert_eq!(bmi.thresholds().direction, TierDirection::LowerIsRiskier);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let twice = r#"
[[calculator]]
id = "a"
name = "A"
category = "math"
formula = { type = "sum" }

[[calculator]]
id = "a"
name = "A again"
category = "math"
formula = { type = "sum" }
"#;
        assert!(matches!(
            parse_catalog(twice),
            Err(CatalogError::DuplicateId { id }) if id == "a"
        ));
    }

    #[test]
    fn formulas_must_reference_declared_fields() {
        let source = r#"
[[calculator]]
id = "loan"
name = "Loan"
category = "finance"
formula = { type = "amortized_payment", principal = "amount", rate = "rate", months = "term" }

[[calculator.fields]]
name = "amount"
kind = "money"
"#;
        let err = parse_catalog(source).unwrap_err();
        assert_eq!(err.category(), "definition");
        assert_eq!(
            err.to_string(),
            "invalid calculator definition 'loan': formula reads undeclared field 'rate'"
        );
    }

    #[test]
    fn unknown_keys_fail_to_parse() {
        let source = r#"
[[calculator]]
id = "a"
name = "A"
category = "math"
formula = { type = "sum" }
colour = "blue"
"#;
        assert_eq!(parse_catalog(source).unwrap_err().category(), "parse");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_catalog(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert_eq!(err.category(), "io");
    }
}
