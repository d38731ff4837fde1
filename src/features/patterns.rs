//! Reference patterns registered when the scorer initializes.

use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;

/// Expected field values for a "normal" activity of one type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalPattern {
    pub fields: Vec<(String, String)>,
}

/// Known threat signature. Reference data only; it does not feed the score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreatPattern {
    pub name: String,
    pub indicators: Map<String, Value>,
}

#[derive(Debug, Clone, Default)]
pub struct PatternRegistry {
    normal: HashMap<String, NormalPattern>,
    threats: Vec<ThreatPattern>,
}

fn obj(v: Value) -> Map<String, Value> {
    match v {
        Value::Object(m) => m,
        _ => Map::new(),
    }
}

impl PatternRegistry {
    pub fn builtin() -> Self {
        let mut r = Self::default();
        r.register_normal(
            "login",
            &[
                ("frequency", "low"),
                ("timePattern", "business_hours"),
                ("locationConsistency", "high"),
            ],
        );
        r.register_normal(
            "simulation",
            &[
                ("duration", "medium"),
                ("complexity", "varied"),
                ("targetCount", "reasonable"),
            ],
        );
        r.register_normal(
            "agent",
            &[
                ("heartbeat", "regular"),
                ("resourceUsage", "stable"),
                ("location", "consistent"),
            ],
        );

        r.threats = vec![
            ThreatPattern {
                name: "brute_force".into(),
                indicators: obj(json!({ "loginAttempts": 10, "timeWindow": 300, "successRate": 0.1 })),
            },
            ThreatPattern {
                name: "data_exfiltration".into(),
                indicators: obj(json!({ "dataVolume": 100, "timeWindow": 3600, "destination": "external" })),
            },
            ThreatPattern {
                name: "privilege_escalation".into(),
                indicators: obj(json!({ "permissionChanges": 5, "timeWindow": 86400, "pattern": "rapid" })),
            },
            ThreatPattern {
                name: "agent_compromise".into(),
                indicators: obj(json!({ "heartbeatMissed": 3, "resourceSpike": 2.5, "locationChange": "frequent" })),
            },
        ];
        r
    }

    /// Register (or replace) the normal pattern for an activity type.
    pub fn register_normal(&mut self, activity_type: &str, fields: &[(&str, &str)]) {
        let fields = fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.normal
            .insert(activity_type.to_string(), NormalPattern { fields });
    }

    pub fn normal(&self, activity_type: &str) -> Option<&NormalPattern> {
        self.normal.get(activity_type)
    }

    pub fn threats(&self) -> &[ThreatPattern] {
        &self.threats
    }
}
