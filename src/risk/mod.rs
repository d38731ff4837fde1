//! Risk scoring: additive heuristics over activity features, a three-tier
//! threshold table, bounded scoring history and threshold recalibration.

mod engine;
mod score;

pub use engine::RiskScorer;
pub use score::{risk_score, ScoreBreakdown};

use crate::activity::Activity;
use crate::config::ThresholdConfig;
use crate::error::ScorerError;
use crate::features::ActivityFeatures;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// Only produced while the scorer is uninitialized
    Unknown,
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Level and confidence for an already clamped score.
    pub fn from_score(score: f64, thresholds: &ThresholdConfig) -> (Self, f64) {
        if score >= thresholds.anomaly {
            (RiskLevel::Critical, score)
        } else if score >= thresholds.threat {
            (RiskLevel::High, score)
        } else if score >= thresholds.suspicious {
            (RiskLevel::Medium, score)
        } else {
            (RiskLevel::Low, 1.0 - score)
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Unknown => "unknown",
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }

    fn baseline_reason(self) -> &'static str {
        match self {
            RiskLevel::Unknown => "risk scorer not initialized",
            RiskLevel::Low => "Normal behavior patterns",
            RiskLevel::Medium => "Suspicious activity patterns",
            RiskLevel::High => "Elevated threat indicators",
            RiskLevel::Critical => "High anomaly detection score",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of scoring one activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskClassification {
    pub activity_id: String,
    pub activity_type: String,
    /// Clamped to [0, 1], two decimals
    pub score: f64,
    pub level: RiskLevel,
    /// [0, 1], two decimals
    pub confidence: f64,
    pub reasons: Vec<String>,
    pub ts: DateTime<Utc>,
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

impl RiskClassification {
    pub fn classify(activity: &Activity, breakdown: ScoreBreakdown, thresholds: &ThresholdConfig) -> Self {
        let (level, confidence) = RiskLevel::from_score(breakdown.score, thresholds);
        let mut reasons = Vec::with_capacity(breakdown.reasons.len() + 1);
        reasons.push(level.baseline_reason().to_string());
        reasons.extend(breakdown.reasons);
        Self {
            activity_id: activity.id.clone(),
            activity_type: activity.type_name().to_string(),
            score: round2(breakdown.score),
            level,
            confidence: round2(confidence),
            reasons,
            ts: Utc::now(),
        }
    }

    /// Sentinel returned before the scorer is initialized; callers should retry later.
    pub fn unknown(activity: &Activity) -> Self {
        Self {
            activity_id: activity.id.clone(),
            activity_type: activity.type_name().to_string(),
            score: 0.0,
            level: RiskLevel::Unknown,
            confidence: 0.0,
            reasons: vec![RiskLevel::Unknown.baseline_reason().to_string()],
            ts: Utc::now(),
        }
    }
}

/// One entry per scored activity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingRecord {
    pub scored_at: DateTime<Utc>,
    pub activity: Activity,
    pub features: ActivityFeatures,
    pub risk_score: f64,
    pub level: RiskLevel,
}

/// One entry per non-low classification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreatRecord {
    pub classification: RiskClassification,
    pub activity: Activity,
    pub features: ActivityFeatures,
}

impl ThresholdConfig {
    /// Values in [0, 1] and `anomaly >= threat >= suspicious`.
    pub fn validate(&self) -> Result<(), ScorerError> {
        let in_range = |v: f64| (0.0..=1.0).contains(&v);
        if !(in_range(self.suspicious) && in_range(self.threat) && in_range(self.anomaly)) {
            return Err(ScorerError::InvalidThresholds(format!(
                "thresholds must lie in [0, 1]: {:?}",
                self
            )));
        }
        if !(self.anomaly >= self.threat && self.threat >= self.suspicious) {
            return Err(ScorerError::InvalidThresholds(format!(
                "expected anomaly >= threat >= suspicious: {:?}",
                self
            )));
        }
        Ok(())
    }

    /// Thresholds derived from the mean risk score of a batch, capped at 1.0.
    pub fn recalibrated(mean: f64) -> Self {
        Self {
            suspicious: (mean - 0.1).max(0.5).min(1.0),
            threat: mean.max(0.6).min(1.0),
            anomaly: (mean + 0.1).max(0.7).min(1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_boundaries() {
        let t = ThresholdConfig::default();
        assert_eq!(RiskLevel::from_score(0.59, &t).0, RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.60, &t).0, RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(0.75, &t).0, RiskLevel::High);
        assert_eq!(RiskLevel::from_score(0.85, &t).0, RiskLevel::Critical);
        assert_eq!(RiskLevel::from_score(1.0, &t), (RiskLevel::Critical, 1.0));
    }

    #[test]
    fn low_confidence_is_complement() {
        let (level, confidence) = RiskLevel::from_score(0.2, &ThresholdConfig::default());
        assert_eq!(level, RiskLevel::Low);
        assert!((confidence - 0.8).abs() < 1e-12);
    }

    #[test]
    fn recalibration_keeps_ordering() {
        for i in 0..=100 {
            let t = ThresholdConfig::recalibrated(i as f64 / 100.0);
            assert!(t.anomaly >= t.threat && t.threat >= t.suspicious, "{:?}", t);
        }
        let t = ThresholdConfig::recalibrated(0.2);
        assert_eq!((t.suspicious, t.threat, t.anomaly), (0.5, 0.6, 0.7));
    }

    #[test]
    fn recalibration_stays_within_unit_range() {
        let t = ThresholdConfig::recalibrated(1.0);
        assert_eq!((t.threat, t.anomaly), (1.0, 1.0));
        assert!((t.suspicious - 0.9).abs() < 1e-12);
        assert!(t.validate().is_ok());
    }

    #[test]
    fn validate_rejects_inverted_table() {
        let bad = ThresholdConfig {
            suspicious: 0.8,
            threat: 0.7,
            anomaly: 0.9,
        };
        assert!(matches!(bad.validate(), Err(ScorerError::InvalidThresholds(_))));
        let out_of_range = ThresholdConfig {
            suspicious: 0.5,
            threat: 0.7,
            anomaly: 1.5,
        };
        assert!(out_of_range.validate().is_err());
        assert!(ThresholdConfig::default().validate().is_ok());
    }

    #[test]
    fn levels_are_ordered() {
        assert!(RiskLevel::Unknown < RiskLevel::Low);
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::High < RiskLevel::Critical);
        assert_eq!(serde_json::to_string(&RiskLevel::Critical).unwrap(), "\"critical\"");
    }
}
