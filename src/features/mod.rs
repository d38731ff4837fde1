//! Feature extraction: activity + scoring history → temporal, behavioral and resource features.

mod behavioral;
mod patterns;

pub use behavioral::{deviation, frequency, is_similar, repetition, SIMILARITY_RATIO};
pub use patterns::{NormalPattern, PatternRegistry, ThreatPattern};

use crate::activity::Activity;
use chrono::{Datelike, FixedOffset, Offset, Timelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityFeatures {
    /// Local hour, 0-23
    pub hour_of_day: u32,
    /// 0 = Sunday
    pub day_of_week: u32,
    pub is_weekend: bool,
    /// Same-type events per hour over the trailing 24h
    pub frequency: f64,
    pub repetition: u32,
    pub deviation: u32,
    pub resource_intensity: f64,
    pub data_volume: f64,
}

pub struct FeatureExtractor {
    offset: FixedOffset,
}

impl FeatureExtractor {
    pub fn new(utc_offset_minutes: i32) -> Self {
        let offset = utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| {
                tracing::warn!(utc_offset_minutes, "invalid UTC offset; using UTC");
                Utc.fix()
            });
        Self { offset }
    }

    /// `history` yields every previously scored activity with its flattened
    /// record ([`Activity::to_record`]), oldest first.
    pub fn extract<'a, I>(&self, activity: &Activity, history: I, patterns: &PatternRegistry) -> ActivityFeatures
    where
        I: Iterator<Item = (&'a Activity, &'a Map<String, Value>)> + Clone,
    {
        let local = activity.ts.with_timezone(&self.offset);
        let day_of_week = local.weekday().num_days_from_sunday();
        let record = activity.to_record();

        ActivityFeatures {
            hour_of_day: local.hour(),
            day_of_week,
            is_weekend: day_of_week == 0 || day_of_week == 6,
            frequency: frequency(activity, history.clone().map(|(a, _)| a)),
            repetition: repetition(&record, history.map(|(_, r)| r)),
            deviation: deviation(&record, patterns.normal(activity.type_name())),
            resource_intensity: activity.resource_usage.unwrap_or(0.0),
            data_volume: activity.data_size.unwrap_or(0.0),
        }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::{ActivityKind, AgentActivity, LoginActivity};
    use chrono::TimeZone;

    #[test]
    fn local_hour_follows_offset() {
        // Monday 2024-01-01 03:00 UTC
        let a = Activity::new(
            ActivityKind::Login(LoginActivity::default()),
            Utc.with_ymd_and_hms(2024, 1, 1, 3, 0, 0).unwrap(),
        );
        let patterns = PatternRegistry::builtin();

        let utc = FeatureExtractor::new(0).extract(&a, std::iter::empty(), &patterns);
        assert_eq!(utc.hour_of_day, 3);
        assert_eq!(utc.day_of_week, 1);
        assert!(!utc.is_weekend);

        // UTC-5 puts it on Sunday evening
        let east = FeatureExtractor::new(-300).extract(&a, std::iter::empty(), &patterns);
        assert_eq!(east.hour_of_day, 22);
        assert_eq!(east.day_of_week, 0);
        assert!(east.is_weekend);
    }

    #[test]
    fn agent_numeric_resource_usage_deviates_from_stable() {
        let a = Activity::new(
            ActivityKind::Agent(AgentActivity {
                agent_id: Some("agent-1".into()),
                heartbeat: Some("irregular".into()),
                location: Some("consistent".into()),
            }),
            Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap(),
        )
        .with_resource_usage(40.0);
        let f = FeatureExtractor::new(0).extract(&a, std::iter::empty(), &PatternRegistry::builtin());
        assert_eq!(f.deviation, 2);
        assert_eq!(f.resource_intensity, 40.0);
        assert_eq!(f.data_volume, 0.0);
    }

    #[test]
    fn out_of_range_offset_falls_back_to_utc() {
        assert_eq!(FeatureExtractor::new(100_000).offset(), Utc.fix());
    }
}
