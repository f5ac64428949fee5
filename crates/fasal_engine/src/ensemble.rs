//! Predictive model ensemble: a logistic success classifier plus linear
//! yield and profit regressors over the shared feature vector. Untrained
//! models answer with documented neutral defaults, so prediction is always
//! available from the first request.

use std::sync::Arc;

use parking_lot::RwLock;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use fasal_core::AdvisoryError;

use crate::features::{FEATURE_LEN, FeatureVector};
use crate::storage::AdvisoryStorage;
use crate::types::TrainingSample;

/// Success probability reported before the first training pass.
pub const UNTRAINED_SUCCESS_PROBABILITY: f64 = 0.75;
/// Untrained yield/profit answers jitter the baseline by this band.
pub const UNTRAINED_JITTER: (f64, f64) = (0.88, 1.12);

const LINEAR_LEARNING_RATE: f64 = 0.05;
const LINEAR_EPOCHS: usize = 400;
const LOGISTIC_LEARNING_RATE: f64 = 0.1;
const LOGISTIC_EPOCHS: usize = 350;

// ---------------------------------------------------------------------------
// Model components
// ---------------------------------------------------------------------------

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Per-feature standardization fitted on the training set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    stds: Vec<f64>,
}

impl StandardScaler {
    fn fit(samples: &[TrainingSample]) -> Self {
        let n = samples.len() as f64;
        let mut means = vec![0.0; FEATURE_LEN];
        for s in samples {
            for (m, x) in means.iter_mut().zip(s.features.as_slice()) {
                *m += x / n;
            }
        }
        let mut stds = vec![0.0; FEATURE_LEN];
        for s in samples {
            for (i, x) in s.features.as_slice().iter().enumerate() {
                stds[i] += (x - means[i]).powi(2) / n;
            }
        }
        for std in &mut stds {
            *std = std.sqrt();
            // Constant features scale to zero, not to NaN.
            if *std < 1e-12 {
                *std = 1.0;
            }
        }
        Self { means, stds }
    }

    fn transform(&self, features: &FeatureVector) -> Vec<f64> {
        features
            .as_slice()
            .iter()
            .enumerate()
            .map(|(i, x)| (x - self.means[i]) / self.stds[i])
            .collect()
    }
}

/// Linear regressor fitted by gradient descent on z-scored targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModel {
    weights: Vec<f64>,
    intercept: f64,
    target_mean: f64,
    target_std: f64,
}

impl LinearModel {
    fn fit(rows: &[Vec<f64>], targets: &[f64]) -> Self {
        let n = rows.len() as f64;
        let target_mean = targets.iter().sum::<f64>() / n;
        let mut target_std =
            (targets.iter().map(|t| (t - target_mean).powi(2)).sum::<f64>() / n).sqrt();
        if target_std < 1e-12 {
            target_std = 1.0;
        }
        let scaled: Vec<f64> = targets.iter().map(|t| (t - target_mean) / target_std).collect();

        let mut weights = vec![0.0; FEATURE_LEN];
        let mut intercept = 0.0;
        for _ in 0..LINEAR_EPOCHS {
            let mut grad_w = vec![0.0; FEATURE_LEN];
            let mut grad_b = 0.0;
            for (row, target) in rows.iter().zip(&scaled) {
                let pred = intercept
                    + weights.iter().zip(row).map(|(w, x)| w * x).sum::<f64>();
                let err = pred - target;
                for (g, x) in grad_w.iter_mut().zip(row) {
                    *g += err * x / n;
                }
                grad_b += err / n;
            }
            for (w, g) in weights.iter_mut().zip(&grad_w) {
                *w -= LINEAR_LEARNING_RATE * g;
            }
            intercept -= LINEAR_LEARNING_RATE * grad_b;
        }

        Self {
            weights,
            intercept,
            target_mean,
            target_std,
        }
    }

    fn predict(&self, row: &[f64]) -> f64 {
        let z = self.intercept
            + self.weights.iter().zip(row).map(|(w, x)| w * x).sum::<f64>();
        z * self.target_std + self.target_mean
    }
}

/// Logistic classifier fitted by gradient descent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticModel {
    weights: Vec<f64>,
    intercept: f64,
}

impl LogisticModel {
    fn fit(rows: &[Vec<f64>], labels: &[f64]) -> Self {
        let n = rows.len() as f64;
        let mut weights = vec![0.0; FEATURE_LEN];
        let mut intercept = 0.0;
        for _ in 0..LOGISTIC_EPOCHS {
            let mut grad_w = vec![0.0; FEATURE_LEN];
            let mut grad_b = 0.0;
            for (row, label) in rows.iter().zip(labels) {
                let z = intercept
                    + weights.iter().zip(row).map(|(w, x)| w * x).sum::<f64>();
                let err = sigmoid(z) - label;
                for (g, x) in grad_w.iter_mut().zip(row) {
                    *g += err * x / n;
                }
                grad_b += err / n;
            }
            for (w, g) in weights.iter_mut().zip(&grad_w) {
                *w -= LOGISTIC_LEARNING_RATE * g;
            }
            intercept -= LOGISTIC_LEARNING_RATE * grad_b;
        }
        Self { weights, intercept }
    }

    fn predict(&self, row: &[f64]) -> f64 {
        let z = self.intercept
            + self.weights.iter().zip(row).map(|(w, x)| w * x).sum::<f64>();
        sigmoid(z)
    }
}

/// One complete trained generation: scaler plus the three fitted models.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSet {
    pub version: i64,
    pub sample_count: u64,
    pub trained_at: String,
    scaler: StandardScaler,
    success: LogisticModel,
    yield_model: LinearModel,
    profit_model: LinearModel,
}

/// Outcome summary of one training pass.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub version: i64,
    pub sample_count: u64,
}

// ---------------------------------------------------------------------------
// Ensemble
// ---------------------------------------------------------------------------

/// Holds the current model generation behind a read-write lock; readers keep
/// serving the old generation while training swaps in the new one.
pub struct PredictiveEnsemble {
    storage: Arc<AdvisoryStorage>,
    model: RwLock<Option<Arc<ModelSet>>>,
    min_samples: usize,
}

impl PredictiveEnsemble {
    pub fn new(storage: Arc<AdvisoryStorage>, min_samples: usize) -> Self {
        Self {
            storage,
            model: RwLock::new(None),
            min_samples,
        }
    }

    /// Restore the latest persisted model generation, if one exists. Any
    /// failure degrades to the untrained state.
    pub fn load(&self) {
        match self.storage.load_latest_model_bundle() {
            Ok(Some((version, artifact))) => match serde_json::from_str::<ModelSet>(&artifact) {
                Ok(mut set) => {
                    set.version = version;
                    info!(version, samples = set.sample_count, "restored model bundle");
                    *self.model.write() = Some(Arc::new(set));
                }
                Err(e) => warn!("Persisted model bundle is unreadable, staying untrained: {e}"),
            },
            Ok(None) => {}
            Err(e) => warn!("Failed to load model bundle, staying untrained: {e}"),
        }
    }

    pub fn is_trained(&self) -> bool {
        self.model.read().is_some()
    }

    /// Probability of success for the given features, in [0, 1]. Untrained
    /// ensembles answer with a fixed mildly optimistic prior.
    pub fn predict_success(&self, features: &FeatureVector) -> f64 {
        match self.model.read().as_ref() {
            Some(set) => set.success.predict(&set.scaler.transform(features)).clamp(0.0, 1.0),
            None => UNTRAINED_SUCCESS_PROBABILITY,
        }
    }

    /// Expected yield per hectare. Untrained ensembles jitter the baseline.
    pub fn predict_yield(&self, features: &FeatureVector, baseline: f64) -> f64 {
        match self.model.read().as_ref() {
            Some(set) => set
                .yield_model
                .predict(&set.scaler.transform(features))
                .max(0.0),
            None => baseline * Self::jitter(),
        }
    }

    /// Expected profit per hectare. Untrained ensembles jitter the baseline.
    pub fn predict_profit(&self, features: &FeatureVector, baseline: f64) -> f64 {
        match self.model.read().as_ref() {
            Some(set) => set
                .profit_model
                .predict(&set.scaler.transform(features))
                .max(0.0),
            None => baseline * Self::jitter(),
        }
    }

    fn jitter() -> f64 {
        rand::rng().random_range(UNTRAINED_JITTER.0..=UNTRAINED_JITTER.1)
    }

    /// Fit a new model generation from the given samples and swap it in.
    /// Refuses to train below the minimum sample count; the previous
    /// generation (or the untrained defaults) keeps serving.
    pub fn train(&self, samples: &[TrainingSample]) -> Result<TrainingReport, AdvisoryError> {
        if samples.len() < self.min_samples {
            return Err(AdvisoryError::TrainingInsufficientData {
                samples: samples.len(),
                required: self.min_samples,
            });
        }

        let scaler = StandardScaler::fit(samples);
        let rows: Vec<Vec<f64>> = samples.iter().map(|s| scaler.transform(&s.features)).collect();
        let success_labels: Vec<f64> = samples
            .iter()
            .map(|s| if s.outcome.success { 1.0 } else { 0.0 })
            .collect();
        let yields: Vec<f64> = samples.iter().map(|s| s.outcome.yield_achieved).collect();
        let profits: Vec<f64> = samples.iter().map(|s| s.outcome.profit_realized).collect();

        let mut set = ModelSet {
            version: 0,
            sample_count: samples.len() as u64,
            trained_at: chrono::Utc::now().to_rfc3339(),
            success: LogisticModel::fit(&rows, &success_labels),
            yield_model: LinearModel::fit(&rows, &yields),
            profit_model: LinearModel::fit(&rows, &profits),
            scaler,
        };

        // Persistence failure keeps the fresh generation in memory; it is
        // simply not restored after a restart.
        match serde_json::to_string(&set) {
            Ok(artifact) => match self.storage.save_model_bundle(&artifact, set.sample_count) {
                Ok(version) => set.version = version,
                Err(e) => warn!("Failed to persist model bundle: {e}"),
            },
            Err(e) => warn!("Failed to serialize model bundle: {e}"),
        }

        let report = TrainingReport {
            version: set.version,
            sample_count: set.sample_count,
        };
        info!(
            version = report.version,
            samples = report.sample_count,
            "trained new model generation"
        );
        *self.model.write() = Some(Arc::new(set));
        Ok(report)
    }
}
