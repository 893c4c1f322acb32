//! Priority predictor artifact.
//!
//! The training pipeline exports a linear surrogate of the learned regressor
//! as JSON: an intercept, one coefficient per feature, and optional feature
//! importances. The engine treats `predict` as opaque; importances are only
//! surfaced as UI-facing confidence metadata.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::features::FEATURE_COUNT;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Failed to read model artifact: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse model artifact: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Model artifact has {0} feature importances, expected {FEATURE_COUNT}")]
    ImportanceShape(usize),
}

/// Loaded predictor artifact. Immutable after load; safe to share.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriorityModel {
    pub model_version: String,
    pub intercept: f64,
    pub coefficients: [f64; FEATURE_COUNT],
    #[serde(default)]
    pub feature_importances: Option<Vec<f64>>,
}

impl PriorityModel {
    /// Score one feature vector. Higher means schedule sooner.
    pub fn predict(&self, features: &[f64; FEATURE_COUNT]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(features.iter())
                .map(|(c, x)| c * x)
                .sum::<f64>()
    }

    /// Model confidence: the sum of the three largest feature importances.
    /// `None` when the artifact carries no importances.
    pub fn confidence(&self) -> Option<f64> {
        let importances = self.feature_importances.as_ref()?;
        let mut sorted: Vec<f64> = importances.clone();
        sorted.sort_by(|a, b| b.total_cmp(a));
        Some(sorted.iter().take(3).sum())
    }

    /// Feature indices sorted by importance descending (index ascending on
    /// ties), truncated to `k`. Empty when importances are missing.
    pub fn top_features(&self, k: usize) -> Vec<usize> {
        let Some(importances) = self.feature_importances.as_ref() else {
            return Vec::new();
        };
        let mut indices: Vec<usize> = (0..importances.len()).collect();
        indices.sort_by(|&a, &b| importances[b].total_cmp(&importances[a]).then(a.cmp(&b)));
        indices.truncate(k);
        indices
    }

    fn from_json(raw: &str) -> Result<Self, ModelError> {
        let model: PriorityModel = serde_json::from_str(raw)?;
        if let Some(importances) = &model.feature_importances {
            if importances.len() != FEATURE_COUNT {
                return Err(ModelError::ImportanceShape(importances.len()));
            }
        }
        Ok(model)
    }

    /// Fallback artifact compiled into the binary, fit against the same
    /// synthetic expert-score dataset the exported artifact comes from. Used
    /// when no artifact file exists yet.
    pub fn builtin() -> Self {
        PriorityModel {
            model_version: "priority_model_v1".to_string(),
            intercept: 41.0,
            coefficients: [0.6, -0.021, -0.16, 24.0, 0.4, -0.3, 2.4, 0.15, -1.2],
            feature_importances: Some(vec![
                0.02, 0.10, 0.30, 0.35, 0.08, 0.05, 0.06, 0.02, 0.02,
            ]),
        }
    }
}

static MODEL_CACHE: Lazy<RwLock<Option<Arc<PriorityModel>>>> = Lazy::new(|| RwLock::new(None));

fn read_artifact(path: &Path) -> Result<PriorityModel, ModelError> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "Model artifact not found, using built-in fallback");
        return Ok(PriorityModel::builtin());
    }
    let raw = fs::read_to_string(path)?;
    PriorityModel::from_json(&raw)
}

/// Load the predictor, reading the artifact at most once per process.
pub fn load_model(path: &Path) -> Result<Arc<PriorityModel>, ModelError> {
    if let Some(model) = MODEL_CACHE.read().clone() {
        return Ok(model);
    }
    let mut guard = MODEL_CACHE.write();
    // Another request may have raced us here.
    if let Some(model) = guard.clone() {
        return Ok(model);
    }
    let model = Arc::new(read_artifact(path)?);
    *guard = Some(model.clone());
    Ok(model)
}

/// Force a re-read of the artifact, replacing the cached handle.
pub fn reload_model(path: &Path) -> Result<Arc<PriorityModel>, ModelError> {
    let model = Arc::new(read_artifact(path)?);
    *MODEL_CACHE.write() = Some(model.clone());
    Ok(model)
}
