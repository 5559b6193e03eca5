use crate::CalculatorInputs;
use crate::analysis::{Analysis, RecommendationTemplate, RiskThresholds};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Calculator family. Each family carries its own default risk thresholds
/// and recommendation wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalculatorFamily {
    Finance,
    Business,
    Legal,
    Health,
    Construction,
    Math,
    Lifestyle,
}

impl CalculatorFamily {
    pub const ALL: [CalculatorFamily; 7] = [
        Self::Finance,
        Self::Business,
        Self::Legal,
        Self::Health,
        Self::Construction,
        Self::Math,
        Self::Lifestyle,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Finance => "finance",
            Self::Business => "business",
            Self::Legal => "legal",
            Self::Health => "health",
            Self::Construction => "construction",
            Self::Math => "math",
            Self::Lifestyle => "lifestyle",
        }
    }

    /// Magnitude thresholds: large monetary instruments tier at 100,000 / 10,000,
    /// smaller everyday figures at 1,000 / 100.
    pub const fn default_thresholds(&self) -> RiskThresholds {
        match self {
            Self::Finance | Self::Business | Self::Construction => {
                RiskThresholds::magnitude(100_000.0, 10_000.0)
            }
            Self::Legal | Self::Health | Self::Math | Self::Lifestyle => {
                RiskThresholds::magnitude(1_000.0, 100.0)
            }
        }
    }

    pub fn default_recommendations(&self) -> RecommendationTemplate {
        let subject = match self {
            Self::Finance => "Financial calculation",
            Self::Business => "Business calculation",
            Self::Legal => "Legal cost calculation",
            Self::Health => "Health calculation",
            Self::Construction => "Construction estimate",
            Self::Math => "Calculation",
            Self::Lifestyle => "Lifestyle calculation",
        };
        RecommendationTemplate::new(
            format!("{subject} completed - figures are within a typical range"),
            format!("{subject} completed - review the results carefully"),
            format!("{subject} completed - the magnitude warrants professional review"),
        )
    }
}

impl fmt::Display for CalculatorFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown calculator family '{0}'")]
pub struct UnknownFamily(pub String);

impl FromStr for CalculatorFamily {
    type Err = UnknownFamily;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|family| family.as_str() == lowered)
            .ok_or_else(|| UnknownFamily(s.to_string()))
    }
}

/// How a field's raw value is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Any finite number
    Number,
    /// Finite and non-negative
    Money,
    /// Percent on the 0-100 scale, inclusive
    Percentage,
    /// Ratio on the 0-1 scale, inclusive
    Fraction,
    /// Non-negative whole number
    Count,
    Text,
    /// One of the declared `options`
    Choice,
    Boolean,
}

impl FieldKind {
    pub const fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Number | Self::Money | Self::Percentage | Self::Fraction | Self::Count
        )
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::Money => "money",
            Self::Percentage => "percentage",
            Self::Fraction => "fraction",
            Self::Count => "count",
            Self::Text => "text",
            Self::Choice => "choice",
            Self::Boolean => "boolean",
        }
    }
}

/// Declaration of one input field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(default)]
    pub label: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
            required: false,
            min: None,
            max: None,
            options: Vec::new(),
            description: String::new(),
        }
    }

    pub fn number(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, FieldKind::Number)
    }

    pub fn money(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, FieldKind::Money)
    }

    pub fn percentage(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, FieldKind::Percentage)
    }

    pub fn count(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, FieldKind::Count)
    }

    pub fn choice<I, S>(name: impl Into<String>, label: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut spec = Self::new(name, label, FieldKind::Choice);
        spec.options = options.into_iter().map(Into::into).collect();
        spec
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// The label, falling back to the field name for catalogue entries that omit it.
    pub fn display_label(&self) -> &str {
        if self.label.is_empty() { &self.name } else { &self.label }
    }
}

/// Relative tolerance, in percent, for examples that do not set their own.
pub const DEFAULT_EXAMPLE_TOLERANCE: f64 = 0.01;

/// A named input set that is known to be valid for its calculator, with the
/// figures it is expected to produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CalculatorExample {
    pub name: String,
    pub inputs: CalculatorInputs,
    /// Keyed by `result` or a secondary metric name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub expected: BTreeMap<String, f64>,
    /// Percent of the expected value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<f64>,
}

impl CalculatorExample {
    pub fn new(name: impl Into<String>, inputs: CalculatorInputs) -> Self {
        Self { name: name.into(), inputs, expected: BTreeMap::new(), tolerance: None }
    }

    pub fn expecting(mut self, metric: impl Into<String>, value: f64) -> Self {
        self.expected.insert(metric.into(), value);
        self
    }

    pub fn with_tolerance(mut self, percent: f64) -> Self {
        self.tolerance = Some(percent);
        self
    }

    pub fn tolerance_percent(&self) -> f64 {
        self.tolerance.unwrap_or(DEFAULT_EXAMPLE_TOLERANCE)
    }
}

/// Identity and presentation metadata for a calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculatorDescriptor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: CalculatorFamily,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
    #[serde(default)]
    pub examples: Vec<CalculatorExample>,
}

impl CalculatorDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>, category: CalculatorFamily) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            category,
            tags: Vec::new(),
            fields: Vec::new(),
            examples: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_example(self, name: impl Into<String>, inputs: CalculatorInputs) -> Self {
        self.with_example_case(CalculatorExample::new(name, inputs))
    }

    pub fn with_example_case(mut self, example: CalculatorExample) -> Self {
        self.examples.push(example);
        self
    }

    pub fn field_spec(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Case-insensitive match against id, name and tags.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.id.to_lowercase().contains(&query)
            || self.name.to_lowercase().contains(&query)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&query))
    }
}

/// Output of the compute stage: the primary result plus named secondary figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub result: f64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub secondary: BTreeMap<String, f64>,
}

impl Metrics {
    pub fn new(result: f64) -> Self {
        Self { result, secondary: BTreeMap::new() }
    }

    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.secondary.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.secondary.get(name).copied()
    }

    /// Like [`Metrics::get`], but `result` names the primary figure.
    pub fn figure(&self, name: &str) -> Option<f64> {
        if name == "result" { Some(self.result) } else { self.get(name) }
    }
}

/// Non-blocking business-rule finding attached to an otherwise valid invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

impl Warning {
    pub fn new(message: impl Into<String>) -> Self {
        Self { field: None, message: message.into() }
    }

    pub fn for_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: Some(field.into()), message: message.into() }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{field}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Combined result of a successful invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationOutput {
    pub calculator_id: String,
    pub result: f64,
    pub metrics: Metrics,
    pub analysis: Analysis,
    #[serde(default)]
    pub warnings: Vec<Warning>,
}
