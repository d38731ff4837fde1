//! Threat scorer — heuristic risk scoring and threat classification for activity events.
//!
//! Modular structure:
//! - [`activity`] — Activity events (tagged union over known kinds + generic)
//! - [`features`] — Temporal, behavioral and resource feature extraction
//! - [`risk`] — Scoring, classification, threshold recalibration
//! - [`history`] — Bounded FIFO logs
//! - [`report`] — Threat reports, alerts, health summary
//! - [`storage`] — Key-value blob persistence (encrypted SQLite, in-memory)
//! - [`logging`] — Structured JSON logging

pub mod config;
pub mod error;
pub mod activity;
pub mod features;
pub mod history;
pub mod risk;
pub mod report;
pub mod storage;
pub mod logging;

pub use config::ScorerConfig;
pub use error::ScorerError;
pub use activity::{Activity, ActivityKind};
pub use features::{ActivityFeatures, FeatureExtractor};
pub use risk::{RiskClassification, RiskLevel, RiskScorer};
pub use report::{ThreatReport, Timeframe};
pub use storage::{BlobStore, MemoryStore, SecureStore};
pub use logging::StructuredLogger;
