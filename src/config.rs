//! Scorer configuration. Loaded from a JSON file; every section has defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorerConfig {
    /// Data directory (encrypted blob store)
    pub data_dir: PathBuf,
    /// Initial classification thresholds
    pub thresholds: ThresholdConfig,
    /// Bounded history capacities
    pub history: HistoryConfig,
    /// Offset applied to event timestamps before hour/weekday checks
    pub utc_offset_minutes: i32,
    /// Persistence of thresholds and history between runs
    pub store: StoreConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Score at or above this is medium risk (0.0-1.0)
    pub suspicious: f64,
    /// Score at or above this is high risk
    pub threat: f64,
    /// Score at or above this is critical
    pub anomaly: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Every scored event is kept here (FIFO eviction)
    pub training_capacity: usize,
    /// Non-low classifications are kept here (FIFO eviction)
    pub threat_capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub enabled: bool,
    /// File name inside `data_dir`
    pub file_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            thresholds: ThresholdConfig::default(),
            history: HistoryConfig::default(),
            utc_offset_minutes: 0,
            store: StoreConfig::default(),
            log: LogConfig::default(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("threat-scorer"))
        .unwrap_or_else(|| PathBuf::from(".threat-scorer"))
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            suspicious: 0.60,
            threat: 0.75,
            anomaly: 0.85,
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            training_capacity: 10_000,
            threat_capacity: 1_000,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            file_name: "scorer.db".to_string(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

impl ScorerConfig {
    /// Load from JSON file if present; otherwise return default
    pub fn load(path: &std::path::Path) -> Self {
        if path.exists() {
            if let Ok(data) = std::fs::read_to_string(path) {
                if let Ok(c) = serde_json::from_str::<ScorerConfig>(&data) {
                    return c;
                }
            }
        }
        Self::default()
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(&self.store.file_name)
    }
}
