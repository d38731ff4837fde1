//! Conversion between [`Activity`] and its flat key/value record form.

use super::{
    Activity, ActivityKind, AgentActivity, DataExportActivity, GenericActivity, LoginActivity,
    PrivilegeChangeActivity, SimulationActivity,
};
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ActivityError {
    #[error("activity must be a JSON object")]
    NotAnObject,
    #[error("activity has no `type`")]
    MissingType,
    #[error("activity has no `timestamp`")]
    MissingTimestamp,
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
    #[error("invalid field for `{kind}` activity: {source}")]
    InvalidField {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Accepts RFC 3339 strings or epoch milliseconds.
fn parse_timestamp(v: &Value) -> Result<DateTime<Utc>, ActivityError> {
    match v {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| ActivityError::InvalidTimestamp(s.clone())),
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .ok_or_else(|| ActivityError::InvalidTimestamp(n.to_string())),
        other => Err(ActivityError::InvalidTimestamp(other.to_string())),
    }
}

fn variant<T: DeserializeOwned>(kind: &str, fields: Map<String, Value>) -> Result<T, ActivityError> {
    serde_json::from_value(Value::Object(fields)).map_err(|source| ActivityError::InvalidField {
        kind: kind.to_string(),
        source,
    })
}

/// Shared numeric attribute; absent or null is `None`, anything but a number is an error.
fn numeric(kind: &str, v: Option<Value>) -> Result<Option<f64>, ActivityError> {
    match v {
        None => Ok(None),
        Some(v) => serde_json::from_value(v).map_err(|source| ActivityError::InvalidField {
            kind: kind.to_string(),
            source,
        }),
    }
}

impl TryFrom<Value> for Activity {
    type Error = ActivityError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Object(mut fields) = value else {
            return Err(ActivityError::NotAnObject);
        };
        let type_name = match fields.remove("type") {
            Some(Value::String(t)) if !t.is_empty() => t,
            _ => return Err(ActivityError::MissingType),
        };
        let ts = match fields.remove("timestamp") {
            Some(v) => parse_timestamp(&v)?,
            None => return Err(ActivityError::MissingTimestamp),
        };
        let id = match fields.remove("id") {
            Some(Value::String(id)) => id,
            _ => Uuid::new_v4().to_string(),
        };
        let resource_usage = numeric(&type_name, fields.remove("resourceUsage"))?;
        let data_size = numeric(&type_name, fields.remove("dataSize"))?;

        let kind = match type_name.as_str() {
            "login" => ActivityKind::Login(variant::<LoginActivity>(&type_name, fields)?),
            "data_export" => ActivityKind::DataExport(variant::<DataExportActivity>(&type_name, fields)?),
            "privilege_change" => {
                ActivityKind::PrivilegeChange(variant::<PrivilegeChangeActivity>(&type_name, fields)?)
            }
            "agent" => ActivityKind::Agent(variant::<AgentActivity>(&type_name, fields)?),
            "simulation" => ActivityKind::Simulation(variant::<SimulationActivity>(&type_name, fields)?),
            _ => ActivityKind::Generic(GenericActivity { type_name, fields }),
        };

        Ok(Activity {
            id,
            ts,
            kind,
            resource_usage,
            data_size,
        })
    }
}

fn merge<T: Serialize>(record: &mut Map<String, Value>, fields: &T) {
    if let Ok(Value::Object(m)) = serde_json::to_value(fields) {
        record.extend(m);
    }
}

impl Activity {
    /// Flatten into the open key/value record seen on the wire.
    pub fn to_record(&self) -> Map<String, Value> {
        let mut record = Map::new();
        record.insert("id".into(), Value::String(self.id.clone()));
        record.insert("type".into(), Value::String(self.type_name().to_string()));
        record.insert(
            "timestamp".into(),
            Value::String(self.ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        );
        match &self.kind {
            ActivityKind::Login(a) => merge(&mut record, a),
            ActivityKind::DataExport(a) => merge(&mut record, a),
            ActivityKind::PrivilegeChange(a) => merge(&mut record, a),
            ActivityKind::Agent(a) => merge(&mut record, a),
            ActivityKind::Simulation(a) => merge(&mut record, a),
            ActivityKind::Generic(g) => {
                for (k, v) in &g.fields {
                    record.entry(k.clone()).or_insert_with(|| v.clone());
                }
            }
        }
        if let Some(r) = self.resource_usage {
            record.insert("resourceUsage".into(), Value::from(r));
        }
        if let Some(d) = self.data_size {
            record.insert("dataSize".into(), Value::from(d));
        }
        record
    }
}

impl From<Activity> for Value {
    fn from(a: Activity) -> Self {
        Value::Object(a.to_record())
    }
}
