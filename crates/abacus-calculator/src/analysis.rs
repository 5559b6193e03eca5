//! Analysis stage conventions: threshold-based risk tiering and templated
//! recommendations.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "Low"),
            RiskLevel::Medium => write!(f, "Medium"),
            RiskLevel::High => write!(f, "High"),
        }
    }
}

/// Qualitative classification of a computed result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub risk_level: RiskLevel,
    pub recommendation: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierDirection {
    /// `High` when `|value| > high`, `Medium` when `|value| > medium`.
    #[default]
    HigherIsRiskier,
    /// `High` when `value < high`, `Medium` when `value < medium`.
    LowerIsRiskier,
}

/// Two cut-offs splitting a result into three tiers. Both boundaries are exclusive:
/// a value sitting exactly on a threshold falls into the lower-risk tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskThresholds {
    pub high: f64,
    pub medium: f64,
    #[serde(default)]
    pub direction: TierDirection,
}

impl RiskThresholds {
    pub const fn magnitude(high: f64, medium: f64) -> Self {
        Self { high, medium, direction: TierDirection::HigherIsRiskier }
    }

    pub const fn floor(high: f64, medium: f64) -> Self {
        Self { high, medium, direction: TierDirection::LowerIsRiskier }
    }

    pub fn classify(&self, value: f64) -> RiskLevel {
        match self.direction {
            TierDirection::HigherIsRiskier => {
                let magnitude = value.abs();
                if magnitude > self.high {
                    RiskLevel::High
                } else if magnitude > self.medium {
                    RiskLevel::Medium
                } else {
                    RiskLevel::Low
                }
            }
            TierDirection::LowerIsRiskier => {
                if value < self.high {
                    RiskLevel::High
                } else if value < self.medium {
                    RiskLevel::Medium
                } else {
                    RiskLevel::Low
                }
            }
        }
    }

    /// Checks that the thresholds describe three non-empty tiers in the declared direction.
    pub fn check(&self) -> Result<(), String> {
        if !self.high.is_finite() || !self.medium.is_finite() {
            return Err("thresholds must be finite".to_string());
        }
        match self.direction {
            TierDirection::HigherIsRiskier if self.high < self.medium => Err(format!(
                "high threshold {} is below medium threshold {}",
                self.high, self.medium
            )),
            TierDirection::LowerIsRiskier if self.high > self.medium => Err(format!(
                "high threshold {} is above medium threshold {}",
                self.high, self.medium
            )),
            _ => Ok(()),
        }
    }
}

/// Static recommendation text per tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationTemplate {
    pub low: String,
    pub medium: String,
    pub high: String,
}

impl RecommendationTemplate {
    pub fn new(low: impl Into<String>, medium: impl Into<String>, high: impl Into<String>) -> Self {
        Self { low: low.into(), medium: medium.into(), high: high.into() }
    }

    pub fn for_level(&self, level: RiskLevel) -> &str {
        match level {
            RiskLevel::Low => &self.low,
            RiskLevel::Medium => &self.medium,
            RiskLevel::High => &self.high,
        }
    }
}

/// Tier `value` and pick the matching recommendation.
pub fn tiered_analysis(
    thresholds: &RiskThresholds,
    template: &RecommendationTemplate,
    value: f64,
) -> Analysis {
    let risk_level = thresholds.classify(value);
    Analysis { risk_level, recommendation: template.for_level(risk_level).to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magnitude_boundaries_are_exclusive() {
        let thresholds = RiskThresholds::magnitude(100_000.0, 10_000.0);
        assert_eq!(thresholds.classify(100_000.0), RiskLevel::Medium);
        assert_eq!(thresholds.classify(100_001.0), RiskLevel::High);
        assert_eq!(thresholds.classify(10_000.0), RiskLevel::Low);
        assert_eq!(thresholds.classify(10_000.5), RiskLevel::Medium);
    }

    #[test]
    fn magnitude_uses_absolute_value() {
        let thresholds = RiskThresholds::magnitude(1_000.0, 100.0);
        assert_eq!(thresholds.classify(-5_000.0), RiskLevel::High);
        assert_eq!(thresholds.classify(-500.0), RiskLevel::Medium);
    }

    #[test]
    fn floor_direction_flags_small_values() {
        // ROI style: below 10% is high risk, below 20% medium
        let thresholds = RiskThresholds::floor(10.0, 20.0);
        assert_eq!(thresholds.classify(5.0), RiskLevel::High);
        assert_eq!(thresholds.classify(10.0), RiskLevel::Medium);
        assert_eq!(thresholds.classify(20.0), RiskLevel::Low);
    }

    #[test]
    fn inverted_thresholds_are_rejected() {
        assert!(RiskThresholds::magnitude(10.0, 100.0).check().is_err());
        assert!(RiskThresholds::floor(20.0, 10.0).check().is_err());
        assert!(RiskThresholds::magnitude(f64::NAN, 1.0).check().is_err());
        assert!(RiskThresholds::magnitude(100.0, 10.0).check().is_ok());
    }

    #[test]
    fn template_picks_tier_text() {
        let template = RecommendationTemplate::new("fine", "careful", "stop");
        let analysis = tiered_analysis(&RiskThresholds::magnitude(10.0, 5.0), &template, 7.0);
        assert_eq!(analysis.risk_level, RiskLevel::Medium);
        assert_eq!(analysis.recommendation, "careful");
    }
}
