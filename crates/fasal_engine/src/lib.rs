pub mod crops;
pub mod engine;
pub mod ensemble;
pub mod features;
pub mod forecast;
pub mod outcome_store;
pub mod storage;
pub mod types;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{info, warn};

use fasal_core::config::FasalConfig;
use fasal_core::AdvisoryError;
use fasal_gateway::base_provider::BaseRecommendationProvider;
use fasal_gateway::government::GovernmentDataGateway;

use engine::AdvisoryEngine;
use ensemble::PredictiveEnsemble;
use outcome_store::OutcomeStore;
use storage::AdvisoryStorage;
pub use types::*;

/// The central coordination point for the advisory pipeline.
///
/// `AdvisoryService` owns the outcome store, the predictive ensemble and the
/// fusion engine, and provides the high-level API for producing advisory
/// reports and recording farmer feedback.
///
/// Retraining is triggered automatically at feedback-count milestones; the
/// ensemble keeps serving its previous generation while a new one is fitted.
pub struct AdvisoryService {
    storage: Arc<AdvisoryStorage>,
    pub store: Arc<OutcomeStore>,
    pub ensemble: Arc<PredictiveEnsemble>,
    engine: AdvisoryEngine,
    feedback_count: AtomicU64,
    retrain_interval: u64,
}

impl AdvisoryService {
    /// Open a persistent advisory service using the given configuration.
    pub fn open(
        config: &FasalConfig,
        gateway: Arc<dyn GovernmentDataGateway>,
        provider: Arc<dyn BaseRecommendationProvider>,
    ) -> Result<Self, AdvisoryError> {
        let db_path = config.resolved_db_path().map_err(AdvisoryError::persistence)?;
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(AdvisoryError::persistence)?;
        }
        let storage = Arc::new(
            AdvisoryStorage::open(&db_path.to_string_lossy())
                .map_err(AdvisoryError::Persistence)?,
        );
        Ok(Self::from_storage(storage, config, gateway, provider))
    }

    /// Create an in-memory advisory service (useful for tests).
    pub fn in_memory(
        gateway: Arc<dyn GovernmentDataGateway>,
        provider: Arc<dyn BaseRecommendationProvider>,
    ) -> Result<Self, AdvisoryError> {
        let storage =
            Arc::new(AdvisoryStorage::in_memory().map_err(AdvisoryError::Persistence)?);
        Ok(Self::from_storage(
            storage,
            &FasalConfig::default(),
            gateway,
            provider,
        ))
    }

    fn from_storage(
        storage: Arc<AdvisoryStorage>,
        config: &FasalConfig,
        gateway: Arc<dyn GovernmentDataGateway>,
        provider: Arc<dyn BaseRecommendationProvider>,
    ) -> Self {
        let store = Arc::new(OutcomeStore::new(Arc::clone(&storage)));
        let ensemble = Arc::new(PredictiveEnsemble::new(
            Arc::clone(&storage),
            config.engine.min_training_samples,
        ));
        ensemble.load();

        // Seed the milestone counter from storage so retraining cadence
        // survives restarts.
        let seeded = store.feedback_count();

        let engine = AdvisoryEngine::new(
            gateway,
            provider,
            Arc::clone(&store),
            Arc::clone(&ensemble),
            config.engine.clone(),
        );

        Self {
            storage,
            store,
            ensemble,
            engine,
            feedback_count: AtomicU64::new(seeded),
            retrain_interval: config.engine.retrain_interval,
        }
    }

    /// Produce a ranked advisory report and track it in the outcome store.
    ///
    /// Only a base-provider failure is fatal; degraded government feeds are
    /// reported through the report's `data_sources` markers. A tracking
    /// failure leaves `recommendation_id` empty but still returns the report.
    pub async fn recommend(
        &self,
        request: &AdvisoryRequest,
    ) -> Result<AdvisoryReport, AdvisoryError> {
        let mut report = self.engine.recommend(request).await?;

        // The persisted record carries everything feature extraction needs,
        // so training later rebuilds the exact vector this report was
        // served under.
        let record = RecommendationRecord {
            id: String::new(),
            location: report.location.clone(),
            latitude: request.latitude,
            longitude: request.longitude,
            season: report.season,
            soil_type: report.soil_type,
            weather: report.current_conditions.clone(),
            forecast: features::ForecastWindow::from_summary(&report.forecast_summary),
            crops_offered: report
                .recommendations
                .iter()
                .map(|r| OfferedCrop {
                    crop: r.crop.clone(),
                    profit_per_hectare: r.profit_per_hectare,
                })
                .collect(),
            timestamp: String::new(),
        };
        report.recommendation_id = self.store.track_recommendation(record);
        Ok(report)
    }

    /// Record farmer feedback for an earlier recommendation.
    ///
    /// Every accepted record advances the retraining milestone counter; at
    /// each interval a retrain is spawned on a background thread. The caller
    /// returns immediately either way, and the ensemble keeps serving its
    /// current generation until the new one is atomically swapped in.
    /// Returns whether the feedback was persisted.
    pub fn collect_feedback(&self, record: FeedbackRecord) -> bool {
        if !self.store.collect_feedback(record) {
            return false;
        }

        let count = self.feedback_count.fetch_add(1, Ordering::Relaxed) + 1;
        if count.is_multiple_of(self.retrain_interval) {
            info!("Retraining ensemble at feedback milestone {count}");
            let store = Arc::clone(&self.store);
            let ensemble = Arc::clone(&self.ensemble);
            let storage = Arc::clone(&self.storage);
            std::thread::spawn(move || {
                Self::run_retrain(&store, &ensemble, &storage);
            });
        }
        true
    }

    /// Refit the ensemble from all joined outcome data, synchronously.
    /// Below the minimum sample count this is a no-op apart from a
    /// debug-level refusal.
    pub fn retrain(&self) {
        Self::run_retrain(&self.store, &self.ensemble, &self.storage);
    }

    fn run_retrain(
        store: &OutcomeStore,
        ensemble: &PredictiveEnsemble,
        storage: &AdvisoryStorage,
    ) {
        let samples = store.get_training_data();
        match ensemble.train(&samples) {
            Ok(report) => {
                if let Err(e) = storage.log_event(
                    "model_retrained",
                    &format!(
                        "trained generation {} on {} samples",
                        report.version, report.sample_count
                    ),
                    "",
                ) {
                    warn!("Failed to log retrain event: {e}");
                }
            }
            Err(AdvisoryError::TrainingInsufficientData { samples, required }) => {
                tracing::debug!(samples, required, "retrain skipped, not enough data");
            }
            Err(e) => warn!("Retraining failed: {e}"),
        }
    }

    /// Recent advisory log entries for transparency surfaces.
    pub fn advisory_log(&self, limit: usize) -> Vec<AdvisoryLogEntry> {
        self.store.advisory_log(limit)
    }

    /// Feedback records seen by this service (including pre-restart ones).
    pub fn feedback_count(&self) -> u64 {
        self.feedback_count.load(Ordering::Relaxed)
    }
}
