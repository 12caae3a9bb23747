// Classification policies - tunable limits for status tiers and health score
use serde::{Deserialize, Serialize};

use super::reading::Reading;

/// Gases the policies can look at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gas {
    #[serde(alias = "c2h2")]
    Acetylene,
    #[serde(alias = "h2")]
    Hydrogen,
}

impl Gas {
    pub fn level(&self, reading: &Reading) -> f64 {
        match self {
            Gas::Acetylene => reading.c2h2,
            Gas::Hydrogen => reading.h2,
        }
    }
}

/// Upper limits (ppm) of one status tier. A `None` limit never fires.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GasLimits {
    #[serde(default)]
    pub acetylene: Option<f64>,
    #[serde(default)]
    pub hydrogen: Option<f64>,
}

impl GasLimits {
    pub fn new(acetylene: Option<f64>, hydrogen: Option<f64>) -> Self {
        Self { acetylene, hydrogen }
    }

    /// True when any configured limit is strictly exceeded
    pub fn exceeded_by(&self, reading: &Reading) -> bool {
        let over = |limit: Option<f64>, level: f64| limit.is_some_and(|l| level > l);
        over(self.acetylene, reading.c2h2) || over(self.hydrogen, reading.h2)
    }
}

/// Two-tier threshold policy applied to the latest reading of a unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdPolicy {
    pub critical: GasLimits,
    pub alert: GasLimits,
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self {
            critical: GasLimits::new(Some(2.0), Some(500.0)),
            alert: GasLimits::new(Some(0.5), Some(100.0)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Penalty {
    pub gas: Gas,
    pub above: f64,
    pub penalty: u8,
}

/// Health score deductions, starting from 100
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorePolicy {
    pub penalties: Vec<Penalty>,
}

impl Default for ScorePolicy {
    fn default() -> Self {
        Self {
            penalties: vec![
                Penalty { gas: Gas::Acetylene, above: 0.5, penalty: 40 },
                Penalty { gas: Gas::Hydrogen, above: 100.0, penalty: 20 },
            ],
        }
    }
}

impl ScorePolicy {
    pub const MAX_SCORE: u8 = 100;

    /// Score in 0..=100. Deductions saturate at zero.
    pub fn score(&self, reading: &Reading) -> u8 {
        self.penalties
            .iter()
            .filter(|p| p.gas.level(reading) > p.above)
            .fold(Self::MAX_SCORE, |score, p| score.saturating_sub(p.penalty))
    }
}

/// Everything the grouping pipeline needs to classify a fleet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationPolicy {
    #[serde(default)]
    pub thresholds: ThresholdPolicy,
    #[serde(default)]
    pub score: ScorePolicy,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn reading(c2h2: f64, h2: f64) -> Reading {
        let row = json!({ "sn": "A", "c2h2": c2h2, "h2": h2 });
        Reading::from_row(row.as_object().unwrap(), Utc::now())
    }

    #[test]
    fn test_limits_are_strict() {
        let limits = GasLimits::new(Some(0.5), Some(100.0));
        assert!(!limits.exceeded_by(&reading(0.5, 100.0)));
        assert!(limits.exceeded_by(&reading(0.51, 0.0)));
        assert!(limits.exceeded_by(&reading(0.0, 100.1)));
    }

    #[test]
    fn test_missing_limit_never_fires() {
        let limits = GasLimits::new(Some(1.0), None);
        assert!(!limits.exceeded_by(&reading(0.0, 10_000.0)));
    }

    #[test]
    fn test_default_score() {
        let policy = ScorePolicy::default();
        assert_eq!(policy.score(&reading(0.1, 10.0)), 100);
        assert_eq!(policy.score(&reading(0.6, 10.0)), 60);
        assert_eq!(policy.score(&reading(0.6, 150.0)), 40);
    }

    #[test]
    fn test_score_clamps_at_zero() {
        let policy = ScorePolicy {
            penalties: vec![
                Penalty { gas: Gas::Acetylene, above: 0.0, penalty: 80 },
                Penalty { gas: Gas::Hydrogen, above: 0.0, penalty: 80 },
            ],
        };
        assert_eq!(policy.score(&reading(1.0, 1.0)), 0);
    }

    #[test]
    fn test_policy_from_toml() {
        let policy: ClassificationPolicy = toml::from_str(
            r#"
            [thresholds.critical]
            acetylene = 1.0

            [thresholds.alert]
            acetylene = 0.2

            [score]
            penalties = [{ gas = "c2h2", above = 0.5, penalty = 40 }]
            "#,
        )
        .unwrap();

        assert_eq!(policy.thresholds.critical, GasLimits::new(Some(1.0), None));
        assert_eq!(policy.thresholds.alert, GasLimits::new(Some(0.2), None));
        assert_eq!(policy.score.penalties.len(), 1);
        assert_eq!(policy.score.penalties[0].gas, Gas::Acetylene);
    }
}
