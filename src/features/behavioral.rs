//! Behavioral features computed against the history of previously scored activities.

use super::patterns::NormalPattern;
use crate::activity::Activity;
use chrono::Duration;
use serde_json::{Map, Value};

/// Fraction of shared fields that must be equal for two records to count as similar.
pub const SIMILARITY_RATIO: f64 = 0.7;

/// Same-type activities in the 24 hours up to `activity.ts`, per hour.
pub fn frequency<'a>(activity: &Activity, history: impl Iterator<Item = &'a Activity>) -> f64 {
    let window = Duration::hours(24);
    let count = history
        .filter(|prior| prior.type_name() == activity.type_name())
        .filter(|prior| {
            let age = activity.ts - prior.ts;
            age >= Duration::zero() && age < window
        })
        .count();
    count as f64 / 24.0
}

/// Number of prior records similar to the current one.
pub fn repetition<'a>(
    record: &Map<String, Value>,
    history: impl Iterator<Item = &'a Map<String, Value>>,
) -> u32 {
    history.filter(|prior| is_similar(prior, record)).count() as u32
}

/// Compares the values of the fields both records carry. `id` is ignored.
pub fn is_similar(a: &Map<String, Value>, b: &Map<String, Value>) -> bool {
    let mut shared = 0usize;
    let mut equal = 0usize;
    for (key, va) in a {
        if key == "id" {
            continue;
        }
        if let Some(vb) = b.get(key) {
            shared += 1;
            if va == vb {
                equal += 1;
            }
        }
    }
    shared > 0 && equal as f64 / shared as f64 >= SIMILARITY_RATIO
}

/// Fields present (and truthy) in `record` whose value differs from the pattern.
pub fn deviation(record: &Map<String, Value>, pattern: Option<&NormalPattern>) -> u32 {
    let Some(pattern) = pattern else {
        return 0;
    };
    pattern
        .fields
        .iter()
        .filter(|(field, expected)| match record.get(field) {
            Some(observed) if is_truthy(observed) => observed.as_str() != Some(expected.as_str()),
            _ => false,
        })
        .count() as u32
}

fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::{ActivityKind, LoginActivity, PrivilegeChangeActivity};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn login_at(h: u32, m: u32) -> Activity {
        Activity::new(
            ActivityKind::Login(LoginActivity::default()),
            Utc.with_ymd_and_hms(2024, 1, 2, h, m, 0).unwrap(),
        )
    }

    #[test]
    fn frequency_counts_same_type_in_trailing_day() {
        let current = login_at(12, 0);
        let mut history: Vec<Activity> = (0..48).map(|i| login_at(11, i % 60)).collect();
        // Older than 24h
        history.push(Activity::new(
            ActivityKind::Login(LoginActivity::default()),
            Utc.with_ymd_and_hms(2023, 12, 31, 12, 0, 0).unwrap(),
        ));
        // Different type
        history.push(Activity::new(
            ActivityKind::PrivilegeChange(PrivilegeChangeActivity::default()),
            Utc.with_ymd_and_hms(2024, 1, 2, 11, 0, 0).unwrap(),
        ));
        assert_eq!(frequency(&current, history.iter()), 2.0);
    }

    #[test]
    fn similarity_uses_shared_fields_only() {
        let a = json!({"id": "1", "type": "x", "user": "bob", "ip": "10.0.0.1", "extra": 1});
        let b = json!({"id": "2", "type": "x", "user": "bob", "ip": "10.0.0.1"});
        let (a, b) = (a.as_object().unwrap(), b.as_object().unwrap());
        assert!(is_similar(a, b));

        let c = json!({"type": "x", "user": "eve", "ip": "10.0.0.9"});
        assert!(!is_similar(a, c.as_object().unwrap()));

        let disjoint = json!({"other": 1});
        assert!(!is_similar(a, disjoint.as_object().unwrap()));
    }

    #[test]
    fn deviation_skips_missing_and_falsy_fields() {
        let pattern = NormalPattern {
            fields: vec![
                ("frequency".into(), "low".into()),
                ("timePattern".into(), "business_hours".into()),
                ("locationConsistency".into(), "high".into()),
            ],
        };
        let record = json!({"frequency": "high", "timePattern": "", "locationConsistency": "high"});
        assert_eq!(deviation(record.as_object().unwrap(), Some(&pattern)), 1);
        assert_eq!(deviation(record.as_object().unwrap(), None), 0);
    }
}
