//! Additive heuristic risk score.

use crate::activity::{Activity, ActivityKind, Destination};
use crate::features::ActivityFeatures;

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreBreakdown {
    /// Clamped to [0, 1]
    pub score: f64,
    /// One entry per adjustment that fired, in evaluation order
    pub reasons: Vec<String>,
}

pub fn risk_score(features: &ActivityFeatures, activity: &Activity) -> ScoreBreakdown {
    let mut score = 0.0f64;
    let mut reasons = Vec::new();
    let mut add = |delta: f64, reason: &str| {
        score += delta;
        reasons.push(reason.to_string());
    };

    if features.hour_of_day < 6 || features.hour_of_day > 22 {
        add(0.2, "Off-hours activity");
    }
    if features.is_weekend {
        add(0.1, "Weekend activity");
    }

    if features.frequency > 10.0 {
        add(0.3, "Unusual frequency");
    } else if features.frequency > 5.0 {
        add(0.15, "Elevated frequency");
    }

    if features.repetition > 50 {
        add(0.2, "Repeated similar activity");
    }

    if features.deviation > 0 {
        add(features.deviation as f64 * 0.1, "Behavioral deviation");
    }

    if features.resource_intensity > 80.0 {
        add(0.2, "High resource usage");
    }
    if features.data_volume > 500.0 {
        add(0.3, "Large data volume");
    }

    match &activity.kind {
        ActivityKind::Login(l) if l.failed_attempts.unwrap_or(0) > 5 => {
            add(0.4, "Repeated failed login attempts");
        }
        ActivityKind::DataExport(d) if d.destination == Some(Destination::External) => {
            add(0.3, "Data export to external destination");
        }
        ActivityKind::PrivilegeChange(_) => {
            add(0.2, "Privilege change");
        }
        _ => {}
    }

    ScoreBreakdown {
        score: score.clamp(0.0, 1.0),
        reasons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::{DataExportActivity, LoginActivity, PrivilegeChangeActivity};
    use chrono::{TimeZone, Utc};

    fn quiet_features() -> ActivityFeatures {
        ActivityFeatures {
            hour_of_day: 12,
            day_of_week: 2,
            is_weekend: false,
            frequency: 0.0,
            repetition: 0,
            deviation: 0,
            resource_intensity: 0.0,
            data_volume: 0.0,
        }
    }

    fn at_noon(kind: ActivityKind) -> Activity {
        Activity::new(kind, Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap())
    }

    #[test]
    fn quiet_activity_scores_zero() {
        let a = at_noon(ActivityKind::Login(LoginActivity::default()));
        let b = risk_score(&quiet_features(), &a);
        assert_eq!(b.score, 0.0);
        assert!(b.reasons.is_empty());
    }

    #[test]
    fn every_adjustment_fires_and_clamps_to_one() {
        let features = ActivityFeatures {
            hour_of_day: 3,
            day_of_week: 6,
            is_weekend: true,
            frequency: 12.0,
            repetition: 60,
            deviation: 3,
            resource_intensity: 95.0,
            data_volume: 900.0,
        };
        let a = at_noon(ActivityKind::Login(LoginActivity {
            failed_attempts: Some(20),
            ..Default::default()
        }));
        let b = risk_score(&features, &a);
        assert_eq!(b.score, 1.0);
        assert_eq!(b.reasons.len(), 8);
        assert_eq!(b.reasons[0], "Off-hours activity");
        assert_eq!(b.reasons[7], "Repeated failed login attempts");
    }

    #[test]
    fn medium_frequency_band() {
        let mut f = quiet_features();
        f.frequency = 6.0;
        let b = risk_score(&f, &at_noon(ActivityKind::Login(LoginActivity::default())));
        assert!((b.score - 0.15).abs() < 1e-12);
    }

    #[test]
    fn type_specific_rules() {
        let f = quiet_features();
        let external = at_noon(ActivityKind::DataExport(DataExportActivity {
            destination: Some(Destination::External),
            ..Default::default()
        }));
        assert!((risk_score(&f, &external).score - 0.3).abs() < 1e-12);

        let internal = at_noon(ActivityKind::DataExport(DataExportActivity {
            destination: Some(Destination::Internal),
            ..Default::default()
        }));
        assert_eq!(risk_score(&f, &internal).score, 0.0);

        let priv_change = at_noon(ActivityKind::PrivilegeChange(PrivilegeChangeActivity::default()));
        assert!((risk_score(&f, &priv_change).score - 0.2).abs() < 1e-12);

        let five_failures = at_noon(ActivityKind::Login(LoginActivity {
            failed_attempts: Some(5),
            ..Default::default()
        }));
        assert_eq!(risk_score(&f, &five_failures).score, 0.0);
    }
}
