//! Integration test: config load, parse NDJSON activities, score, recalibrate, persist, report.

use threat_scorer::{
    activity::Activity,
    config::{HistoryConfig, ScorerConfig},
    report::{HealthStatus, Timeframe},
    risk::{RiskLevel, RiskScorer},
    storage::{BlobStore, SecureStore},
};
use std::path::Path;

fn ready_scorer() -> RiskScorer {
    let scorer = RiskScorer::new(&ScorerConfig::default());
    scorer.initialize();
    scorer
}

#[test]
fn config_load_default() {
    let c = ScorerConfig::load(Path::new("nonexistent.json"));
    assert_eq!(c.history.training_capacity, 10_000);
    assert_eq!(c.history.threat_capacity, 1_000);
    assert_eq!(c.thresholds.anomaly, 0.85);
    assert!(!c.store.enabled);
}

#[test]
fn documented_brute_force_example() {
    let scorer = ready_scorer();
    let a = Activity::from_json(
        r#"{"type": "login", "timestamp": "2024-01-01T03:00:00Z", "failedAttempts": 15}"#,
    )
    .unwrap();
    let c = scorer.analyze(&a);
    assert_eq!(c.score, 0.6);
    assert_eq!(c.level, RiskLevel::Medium);
    assert_eq!(c.confidence, 0.6);
}

#[test]
fn quiet_weekday_activity_is_low() {
    let scorer = ready_scorer();
    for line in [
        r#"{"type":"login","timestamp":"2024-01-03T10:00:00Z"}"#,
        r#"{"type":"agent","timestamp":"2024-01-03T11:00:00Z"}"#,
        r#"{"type":"data_export","timestamp":"2024-01-03T12:00:00Z"}"#,
        r#"{"type":"heartbeat_check","timestamp":"2024-01-03T13:00:00Z"}"#,
    ] {
        let c = scorer.analyze(&Activity::from_json(line).unwrap());
        assert!(c.score >= 0.0);
        assert_eq!(c.level, RiskLevel::Low, "{}", line);
    }
}

#[test]
fn every_adjustment_at_once_clamps_to_exactly_one() {
    let scorer = ready_scorer();
    // Saturday 02:00 login, bursty and repetitive, deviating, resource heavy, large volume
    let line = r#"{"type":"login","timestamp":"2024-01-06T02:00:00Z","failedAttempts":30,
        "frequency":"high","timePattern":"night","locationConsistency":"low",
        "resourceUsage":99,"dataSize":900,"user":"mallory"}"#
        .replace('\n', " ");
    let mut last = None;
    for _ in 0..300 {
        let a = Activity::from_json(&line).unwrap();
        last = Some(scorer.analyze(&a));
    }
    let c = last.unwrap();
    assert_eq!(c.score, 1.0);
    assert_eq!(c.level, RiskLevel::Critical);
    assert_eq!(c.confidence, 1.0);
    for reason in [
        "Off-hours activity",
        "Weekend activity",
        "Unusual frequency",
        "Repeated similar activity",
        "Behavioral deviation",
        "High resource usage",
        "Large data volume",
        "Repeated failed login attempts",
    ] {
        assert!(c.reasons.iter().any(|r| r == reason), "missing {}: {:?}", reason, c.reasons);
    }
}

#[test]
fn training_log_evicts_oldest_first() {
    let config = ScorerConfig {
        history: HistoryConfig {
            training_capacity: 200,
            threat_capacity: 20,
        },
        ..ScorerConfig::default()
    };
    let scorer = RiskScorer::new(&config);
    scorer.initialize();
    let mut ids = Vec::new();
    for i in 0..250 {
        let line = format!(
            r#"{{"id":"ev-{}","type":"heartbeat_check","timestamp":"2024-01-03T12:00:00Z","seq":{}}}"#,
            i, i
        );
        scorer.analyze(&Activity::from_json(&line).unwrap());
        ids.push(format!("ev-{}", i));
    }
    let log = scorer.training_log();
    assert_eq!(log.len(), 200);
    let kept: Vec<String> = log.into_iter().map(|r| r.activity.id).collect();
    assert_eq!(kept, ids[50..].to_vec());
    assert!(scorer.threat_history().is_empty());
}

#[test]
fn recalibration_preserves_threshold_order() {
    let scorer = ready_scorer();
    let batch: Vec<_> = [
        r#"{"type":"login","timestamp":"2024-01-06T02:00:00Z","failedAttempts":30,"resourceUsage":99}"#,
        r#"{"type":"data_export","timestamp":"2024-01-03T12:00:00Z","destination":"external"}"#,
        r#"{"type":"privilege_change","timestamp":"2024-01-03T23:30:00Z"}"#,
    ]
    .iter()
    .map(|l| scorer.analyze(&Activity::from_json(l).unwrap()))
    .collect();
    let t = scorer.train(&batch);
    assert!(t.anomaly >= t.threat && t.threat >= t.suspicious);
    let t = scorer.train_from_history();
    assert!(t.anomaly >= t.threat && t.threat >= t.suspicious);
    assert!(t.validate().is_ok());
}

#[test]
fn state_survives_secure_store_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scorer.db");
    {
        let store = SecureStore::open(&path, b"test-secret").unwrap();
        let scorer = ready_scorer();
        scorer.analyze(
            &Activity::from_json(r#"{"type":"login","timestamp":"2024-01-01T03:00:00Z","failedAttempts":15}"#)
                .unwrap(),
        );
        scorer.save(&store).unwrap();
        assert!(store.get("scorer/threats").unwrap().is_some());
    }

    let store = SecureStore::open(&path, b"test-secret").unwrap();
    let scorer = ready_scorer();
    scorer.restore(&store).unwrap();
    assert_eq!(scorer.training_len(), 1);
    let threats = scorer.threat_history();
    assert_eq!(threats.len(), 1);
    assert_eq!(threats[0].classification.level, RiskLevel::Medium);

    let report = scorer.report(Timeframe::Last30d, chrono::Utc::now());
    assert_eq!(report.total_threats, 1);
    assert_eq!(report.distribution.medium, 1);
    assert_eq!(scorer.health(chrono::Utc::now()).status, HealthStatus::Healthy);
}
