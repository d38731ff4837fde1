//! Activity events: one observed, timestamped action to be scored.
//!
//! Known activity types get their own variant carrying only the fields that
//! matter for that type; anything else lands in [`ActivityKind::Generic`] with
//! its attributes kept as an open map. On the wire an activity is a flat JSON
//! object with `type` and `timestamp` plus camelCase attributes.

mod record;

pub use record::ActivityError;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// One activity event. Never mutated by scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct Activity {
    pub id: String,
    pub ts: DateTime<Utc>,
    pub kind: ActivityKind,
    /// Resource usage percentage, any type may report it
    pub resource_usage: Option<f64>,
    /// Transferred or touched data volume (MB)
    pub data_size: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActivityKind {
    Login(LoginActivity),
    DataExport(DataExportActivity),
    PrivilegeChange(PrivilegeChangeActivity),
    Agent(AgentActivity),
    Simulation(SimulationActivity),
    Generic(GenericActivity),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoginActivity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_attempts: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_consistency: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DataExportActivity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<Destination>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Destination {
    Internal,
    External,
    Other(String),
}

impl From<String> for Destination {
    fn from(s: String) -> Self {
        match s.as_str() {
            "internal" => Destination::Internal,
            "external" => Destination::External,
            _ => Destination::Other(s),
        }
    }
}

impl From<Destination> for String {
    fn from(d: Destination) -> Self {
        match d {
            Destination::Internal => "internal".to_string(),
            Destination::External => "external".to_string(),
            Destination::Other(s) => s,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrivilegeChangeActivity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission: Option<String>,
}

/// Agent heartbeat
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentActivity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heartbeat: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulationActivity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_count: Option<String>,
}

/// Unrecognized type tag; attributes kept as given.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenericActivity {
    pub type_name: String,
    pub fields: Map<String, Value>,
}

impl ActivityKind {
    /// Wire type tag (`login`, `data_export`, ...)
    pub fn type_name(&self) -> &str {
        match self {
            ActivityKind::Login(_) => "login",
            ActivityKind::DataExport(_) => "data_export",
            ActivityKind::PrivilegeChange(_) => "privilege_change",
            ActivityKind::Agent(_) => "agent",
            ActivityKind::Simulation(_) => "simulation",
            ActivityKind::Generic(g) => &g.type_name,
        }
    }
}

impl Activity {
    pub fn new(kind: ActivityKind, ts: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            ts,
            kind,
            resource_usage: None,
            data_size: None,
        }
    }

    pub fn with_resource_usage(mut self, pct: f64) -> Self {
        self.resource_usage = Some(pct);
        self
    }

    pub fn with_data_size(mut self, size: f64) -> Self {
        self.data_size = Some(size);
        self
    }

    pub fn type_name(&self) -> &str {
        self.kind.type_name()
    }

    /// Parse one NDJSON line.
    pub fn from_json(line: &str) -> Result<Self, ActivityError> {
        let value: Value = serde_json::from_str(line)?;
        Activity::try_from(value)
    }
}
