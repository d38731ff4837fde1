//! Threat-history rollups: timeframe reports, alerts and a health summary.

use crate::risk::{RiskLevel, RiskScorer, ThreatRecord};
use chrono::{DateTime, Duration, FixedOffset, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Below this many scored events a "collect more data" recommendation is added.
const MIN_TRAINING_SAMPLES: usize = 1000;
const TOP_THREATS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "24h")]
    Last24h,
    #[default]
    #[serde(rename = "7d")]
    Last7d,
    #[serde(rename = "30d")]
    Last30d,
}

impl Timeframe {
    pub fn duration(self) -> Duration {
        match self {
            Timeframe::Last24h => Duration::hours(24),
            Timeframe::Last7d => Duration::days(7),
            Timeframe::Last30d => Duration::days(30),
        }
    }

    /// Unrecognized strings fall back to 7 days.
    pub fn parse_or_default(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "24h" => Ok(Timeframe::Last24h),
            "7d" => Ok(Timeframe::Last7d),
            "30d" => Ok(Timeframe::Last30d),
            other => Err(format!("unknown timeframe: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub priority: RiskLevel,
    pub action: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreatReport {
    pub timeframe: Timeframe,
    pub generated_at: DateTime<Utc>,
    pub total_threats: usize,
    pub distribution: LevelCounts,
    /// Activity type -> count
    pub activity_breakdown: BTreeMap<String, usize>,
    /// Local hour -> count
    pub peak_hours: BTreeMap<u32, usize>,
    pub average_confidence: f64,
    pub recommendations: Vec<Recommendation>,
    /// Highest confidence first
    pub top_threats: Vec<ThreatRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Degraded,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemHealth {
    pub status: HealthStatus,
    pub threats_last_24h: usize,
    pub critical_threats: usize,
    pub high_threats: usize,
    pub data_points: usize,
}

fn count_levels<'a>(records: impl Iterator<Item = &'a ThreatRecord>) -> LevelCounts {
    let mut counts = LevelCounts::default();
    for r in records {
        match r.classification.level {
            RiskLevel::Critical => counts.critical += 1,
            RiskLevel::High => counts.high += 1,
            RiskLevel::Medium => counts.medium += 1,
            RiskLevel::Low => counts.low += 1,
            RiskLevel::Unknown => {}
        }
    }
    counts
}

fn recommendations(counts: &LevelCounts, training_len: usize) -> Vec<Recommendation> {
    let mut out = Vec::new();
    if counts.critical > 0 {
        out.push(Recommendation {
            priority: RiskLevel::Critical,
            action: "Immediate investigation required".into(),
            description: format!(
                "{} critical threats detected that require immediate attention",
                counts.critical
            ),
        });
    }
    if counts.high > 5 {
        out.push(Recommendation {
            priority: RiskLevel::High,
            action: "Review security policies".into(),
            description: "Multiple high-level threats suggest policy gaps".into(),
        });
    }
    if counts.medium > 20 {
        out.push(Recommendation {
            priority: RiskLevel::Medium,
            action: "Enhance monitoring".into(),
            description: "Consider increasing monitoring frequency for suspicious activities".into(),
        });
    }
    if training_len < MIN_TRAINING_SAMPLES {
        out.push(Recommendation {
            priority: RiskLevel::Low,
            action: "Collect more training data".into(),
            description: "Threshold calibration improves with more historical data".into(),
        });
    }
    out
}

impl ThreatReport {
    pub fn build(
        threats: &[ThreatRecord],
        training_len: usize,
        timeframe: Timeframe,
        now: DateTime<Utc>,
        offset: FixedOffset,
    ) -> Self {
        let start = now - timeframe.duration();
        let mut in_window: Vec<ThreatRecord> = threats
            .iter()
            .filter(|r| r.classification.ts >= start)
            .cloned()
            .collect();

        let distribution = count_levels(in_window.iter());
        let mut activity_breakdown = BTreeMap::new();
        let mut peak_hours = BTreeMap::new();
        for r in &in_window {
            *activity_breakdown
                .entry(r.classification.activity_type.clone())
                .or_insert(0) += 1;
            let hour = r.classification.ts.with_timezone(&offset).hour();
            *peak_hours.entry(hour).or_insert(0) += 1;
        }
        let average_confidence = if in_window.is_empty() {
            0.0
        } else {
            in_window.iter().map(|r| r.classification.confidence).sum::<f64>() / in_window.len() as f64
        };
        let recommendations = recommendations(&distribution, training_len);

        in_window.sort_by(|a, b| b.classification.confidence.total_cmp(&a.classification.confidence));
        let total_threats = in_window.len();
        in_window.truncate(TOP_THREATS);

        Self {
            timeframe,
            generated_at: now,
            total_threats,
            distribution,
            activity_breakdown,
            peak_hours,
            average_confidence,
            recommendations,
            top_threats: in_window,
        }
    }
}

impl RiskScorer {
    pub fn report(&self, timeframe: Timeframe, now: DateTime<Utc>) -> ThreatReport {
        ThreatReport::build(
            &self.threat_history(),
            self.training_len(),
            timeframe,
            now,
            self.extractor().offset(),
        )
    }

    /// Critical and high threats, newest first.
    pub fn alerts(&self, limit: usize) -> Vec<ThreatRecord> {
        let mut alerts: Vec<ThreatRecord> = self
            .threat_history()
            .into_iter()
            .filter(|r| r.classification.level >= RiskLevel::High)
            .collect();
        alerts.sort_by(|a, b| b.classification.ts.cmp(&a.classification.ts));
        alerts.truncate(limit);
        alerts
    }

    pub fn health(&self, now: DateTime<Utc>) -> SystemHealth {
        let start = now - Duration::hours(24);
        let threats = self.threat_history();
        let recent: Vec<&ThreatRecord> = threats
            .iter()
            .filter(|r| r.classification.ts >= start)
            .collect();
        let counts = count_levels(recent.iter().copied());
        let status = if counts.critical > 0 {
            HealthStatus::Critical
        } else if counts.high > 5 {
            HealthStatus::Degraded
        } else if counts.high > 0 {
            HealthStatus::Warning
        } else {
            HealthStatus::Healthy
        };
        SystemHealth {
            status,
            threats_last_24h: recent.len(),
            critical_threats: counts.critical,
            high_threats: counts.high,
            data_points: self.training_len(),
        }
    }
}
