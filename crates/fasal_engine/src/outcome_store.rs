//! Outcome store: the append-only memory of what was recommended and how it
//! actually turned out. Wraps the SQLite layer with id/timestamp assignment,
//! aggregate lookups and training-set assembly.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::crops::find_crop;
use crate::features::{self, FeatureInput};
use crate::storage::AdvisoryStorage;
use crate::types::{
    AdvisoryLogEntry, FeedbackRecord, PerformanceAggregate, RecommendationRecord, Season,
    TrainingOutcome, TrainingSample,
};

pub struct OutcomeStore {
    storage: Arc<AdvisoryStorage>,
}

impl OutcomeStore {
    pub fn new(storage: Arc<AdvisoryStorage>) -> Self {
        Self { storage }
    }

    /// Record an issued recommendation. Assigns a fresh id and timestamp and
    /// returns the id. Tracking failures are logged and reported as an empty
    /// id; the advisory itself is never blocked by them.
    pub fn track_recommendation(&self, mut record: RecommendationRecord) -> String {
        record.id = uuid::Uuid::new_v4().to_string();
        record.timestamp = chrono::Utc::now().to_rfc3339();
        match self.storage.insert_recommendation(&record) {
            Ok(()) => {
                debug!(
                    id = %record.id,
                    location = %record.location,
                    crops = record.crops_offered.len(),
                    "tracked recommendation"
                );
                record.id
            }
            Err(e) => {
                warn!("Failed to track recommendation: {e}");
                String::new()
            }
        }
    }

    /// Record farmer feedback and fold it into the performance aggregates.
    /// Returns false (after logging) on persistence failure.
    pub fn collect_feedback(&self, mut record: FeedbackRecord) -> bool {
        record.id = uuid::Uuid::new_v4().to_string();
        if record.timestamp.is_empty() {
            record.timestamp = chrono::Utc::now().to_rfc3339();
        }
        record.satisfaction = record.satisfaction.clamp(1, 5);

        match self.storage.insert_feedback_with_aggregate(&record) {
            Ok((location, season)) => {
                let description = format!(
                    "{} {} in {} ({})",
                    record.crop,
                    if record.success { "succeeded" } else { "failed" },
                    location,
                    season.as_str()
                );
                if let Err(e) = self.storage.log_event(
                    "feedback_recorded",
                    &description,
                    &format!(
                        "yield={} profit={} satisfaction={}",
                        record.yield_achieved, record.profit_realized, record.satisfaction
                    ),
                ) {
                    warn!("Failed to log feedback event: {e}");
                }
                true
            }
            Err(e) => {
                warn!("Failed to record feedback: {e}");
                false
            }
        }
    }

    /// Historical performance for one (location, crop, season) key, if any
    /// feedback has been recorded for it.
    pub fn get_crop_performance(
        &self,
        location: &str,
        crop: &str,
        season: Season,
    ) -> Option<PerformanceAggregate> {
        match self.storage.get_aggregate(location, crop, season) {
            Ok(agg) => agg,
            Err(e) => {
                warn!("Failed to read performance aggregate: {e}");
                None
            }
        }
    }

    /// Per-crop success rates for a location, across all seasons.
    pub fn get_success_rate_by_location(&self, location: &str) -> HashMap<String, f64> {
        match self.storage.location_success_rates(location) {
            Ok(rates) => rates.into_iter().collect(),
            Err(e) => {
                warn!("Failed to read location success rates: {e}");
                HashMap::new()
            }
        }
    }

    /// Number of feedback records collected so far.
    pub fn feedback_count(&self) -> u64 {
        match self.storage.feedback_count() {
            Ok(count) => count,
            Err(e) => {
                warn!("Failed to count feedback: {e}");
                0
            }
        }
    }

    /// Assemble the training set by joining feedback to the recommendations
    /// that produced it and rebuilding the feature vector each sample was
    /// issued under, from the persisted conditions, forecast window and
    /// baseline economics. Dangling feedback is excluded by the join.
    /// Realized outcomes are targets only; they never enter the features.
    pub fn get_training_data(&self) -> Vec<TrainingSample> {
        let rows = match self.storage.training_rows() {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Failed to read training rows: {e}");
                return Vec::new();
            }
        };

        rows.into_iter()
            .map(|row| {
                let profile = find_crop(&row.feedback.crop);
                let baseline_profit = row
                    .recommendation
                    .crops_offered
                    .iter()
                    .find(|o| o.crop.eq_ignore_ascii_case(&row.feedback.crop))
                    .map(|o| o.profit_per_hectare);
                let features = features::extract(&FeatureInput {
                    weather: Some(&row.recommendation.weather),
                    window: row.recommendation.forecast,
                    soil_type: row.recommendation.soil_type,
                    season: row.recommendation.season,
                    latitude: row.recommendation.latitude,
                    longitude: row.recommendation.longitude,
                    profile,
                    baseline_profit,
                });
                TrainingSample {
                    features,
                    outcome: TrainingOutcome {
                        success: row.feedback.success,
                        yield_achieved: row.feedback.yield_achieved,
                        profit_realized: row.feedback.profit_realized,
                    },
                }
            })
            .collect()
    }

    /// Recent advisory log entries, newest first.
    pub fn advisory_log(&self, limit: usize) -> Vec<AdvisoryLogEntry> {
        match self.storage.get_log(limit) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to read advisory log: {e}");
                Vec::new()
            }
        }
    }
}
