//! The scorer service: owns thresholds, patterns and both bounded logs behind one lock.

use super::{risk_score, RiskClassification, RiskLevel, ThreatRecord, TrainingRecord};
use crate::activity::Activity;
use crate::config::{ScorerConfig, ThresholdConfig};
use crate::error::ScorerError;
use crate::features::{FeatureExtractor, PatternRegistry, ThreatPattern};
use crate::history::BoundedLog;
use crate::storage::BlobStore;
use chrono::Utc;
use serde_json::{Map, Value};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

const KEY_THRESHOLDS: &str = "scorer/thresholds";
const KEY_TRAINING: &str = "scorer/training";
const KEY_THREATS: &str = "scorer/threats";

/// Training record plus its flattened activity, kept for similarity checks.
struct LoggedActivity {
    record: TrainingRecord,
    flat: Map<String, Value>,
}

impl From<TrainingRecord> for LoggedActivity {
    fn from(record: TrainingRecord) -> Self {
        let flat = record.activity.to_record();
        Self { record, flat }
    }
}

struct ScorerState {
    initialized: bool,
    thresholds: ThresholdConfig,
    patterns: PatternRegistry,
    training: BoundedLog<LoggedActivity>,
    threats: BoundedLog<ThreatRecord>,
}

/// Scoring reads the history and appends to it, so all state sits under a single mutex.
pub struct RiskScorer {
    extractor: FeatureExtractor,
    state: Mutex<ScorerState>,
}

impl RiskScorer {
    /// Uninitialized scorer; call [`RiskScorer::initialize`] before scoring.
    pub fn new(config: &ScorerConfig) -> Self {
        let thresholds = match config.thresholds.validate() {
            Ok(()) => config.thresholds,
            Err(e) => {
                warn!(error = %e, "configured thresholds rejected; using defaults");
                ThresholdConfig::default()
            }
        };
        Self {
            extractor: FeatureExtractor::new(config.utc_offset_minutes),
            state: Mutex::new(ScorerState {
                initialized: false,
                thresholds,
                patterns: PatternRegistry::default(),
                training: BoundedLog::new(config.history.training_capacity),
                threats: BoundedLog::new(config.history.threat_capacity),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ScorerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register behavior and threat patterns. Idempotent.
    pub fn initialize(&self) {
        let mut state = self.lock();
        if state.initialized {
            return;
        }
        state.patterns = PatternRegistry::builtin();
        state.initialized = true;
        info!(
            suspicious = state.thresholds.suspicious,
            threat = state.thresholds.threat,
            anomaly = state.thresholds.anomaly,
            "risk scorer initialized"
        );
    }

    pub fn is_initialized(&self) -> bool {
        self.lock().initialized
    }

    /// Score one activity and record it in the history logs.
    pub fn analyze(&self, activity: &Activity) -> RiskClassification {
        let mut guard = self.lock();
        if !guard.initialized {
            debug!(activity_id = %activity.id, "scored before initialization");
            return RiskClassification::unknown(activity);
        }
        let state = &mut *guard;

        let features = self.extractor.extract(
            activity,
            state.training.iter().map(|e| (&e.record.activity, &e.flat)),
            &state.patterns,
        );
        let breakdown = risk_score(&features, activity);
        let raw_score = breakdown.score;
        let classification = RiskClassification::classify(activity, breakdown, &state.thresholds);

        debug!(
            activity_id = %activity.id,
            activity_type = activity.type_name(),
            score = classification.score,
            level = %classification.level,
            "activity scored"
        );

        state.training.push(LoggedActivity::from(TrainingRecord {
            scored_at: classification.ts,
            activity: activity.clone(),
            features: features.clone(),
            risk_score: raw_score,
            level: classification.level,
        }));
        if classification.level != RiskLevel::Low {
            state.threats.push(ThreatRecord {
                classification: classification.clone(),
                activity: activity.clone(),
                features,
            });
        }
        classification
    }

    /// Recalibrate thresholds from the mean score of `batch`. An empty batch changes nothing.
    pub fn train(&self, batch: &[RiskClassification]) -> ThresholdConfig {
        self.recalibrate(batch.iter().map(|c| c.score))
    }

    /// Recalibrate from every classification in the threat history.
    pub fn train_from_history(&self) -> ThresholdConfig {
        let scores: Vec<f64> = self.lock().threats.iter().map(|r| r.classification.score).collect();
        self.recalibrate(scores.into_iter())
    }

    fn recalibrate(&self, scores: impl Iterator<Item = f64>) -> ThresholdConfig {
        let (sum, n) = scores.fold((0.0, 0usize), |(s, n), x| (s + x, n + 1));
        let mut state = self.lock();
        if n == 0 {
            warn!("recalibration skipped: empty batch");
            return state.thresholds;
        }
        let mean = sum / n as f64;
        state.thresholds = ThresholdConfig::recalibrated(mean);
        info!(
            samples = n,
            mean,
            suspicious = state.thresholds.suspicious,
            threat = state.thresholds.threat,
            anomaly = state.thresholds.anomaly,
            "thresholds recalibrated"
        );
        state.thresholds
    }

    pub fn thresholds(&self) -> ThresholdConfig {
        self.lock().thresholds
    }

    pub fn set_thresholds(&self, thresholds: ThresholdConfig) -> Result<(), ScorerError> {
        thresholds.validate()?;
        self.lock().thresholds = thresholds;
        Ok(())
    }

    /// Empty both history logs.
    pub fn clear_history(&self) {
        let mut state = self.lock();
        state.training.clear();
        state.threats.clear();
        info!("scoring history cleared");
    }

    pub fn training_len(&self) -> usize {
        self.lock().training.len()
    }

    /// Oldest first
    pub fn training_log(&self) -> Vec<TrainingRecord> {
        self.lock().training.iter().map(|e| e.record.clone()).collect()
    }

    /// Oldest first
    pub fn threat_history(&self) -> Vec<ThreatRecord> {
        self.lock().threats.to_vec()
    }

    pub fn threat_patterns(&self) -> Vec<ThreatPattern> {
        self.lock().patterns.threats().to_vec()
    }

    pub(crate) fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    /// Persist thresholds and both logs as JSON blobs.
    pub fn save(&self, store: &dyn BlobStore) -> Result<(), ScorerError> {
        let (thresholds, training, threats) = {
            let state = self.lock();
            (
                serde_json::to_vec(&state.thresholds)?,
                serde_json::to_vec(&state.training.iter().map(|e| &e.record).collect::<Vec<_>>())?,
                serde_json::to_vec(&state.threats.to_vec())?,
            )
        };
        store.set(KEY_THRESHOLDS, &thresholds)?;
        store.set(KEY_TRAINING, &training)?;
        store.set(KEY_THREATS, &threats)?;
        debug!(saved_at = %Utc::now(), "scorer state saved");
        Ok(())
    }

    /// Load whatever was saved; missing keys leave current state untouched.
    /// Histories larger than the configured capacity keep their newest entries.
    pub fn restore(&self, store: &dyn BlobStore) -> Result<(), ScorerError> {
        let thresholds = match store.get(KEY_THRESHOLDS)? {
            Some(b) => {
                let t: ThresholdConfig = serde_json::from_slice(&b)?;
                t.validate()?;
                Some(t)
            }
            None => None,
        };
        let training = match store.get(KEY_TRAINING)? {
            Some(b) => Some(serde_json::from_slice::<Vec<TrainingRecord>>(&b)?),
            None => None,
        };
        let threats = match store.get(KEY_THREATS)? {
            Some(b) => Some(serde_json::from_slice::<Vec<ThreatRecord>>(&b)?),
            None => None,
        };

        let mut state = self.lock();
        if let Some(t) = thresholds {
            state.thresholds = t;
        }
        if let Some(records) = training {
            state.training.clear();
            state.training.extend(records.into_iter().map(LoggedActivity::from));
        }
        if let Some(records) = threats {
            state.threats.clear();
            state.threats.extend(records);
        }
        info!(
            training = state.training.len(),
            threats = state.threats.len(),
            "scorer state restored"
        );
        Ok(())
    }
}
