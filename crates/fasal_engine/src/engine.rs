//! Recommendation fusion engine: fetches the data feeds concurrently,
//! enhances each baseline candidate with history, forecast analysis and
//! ensemble predictions, and ranks the fused list.

use std::sync::Arc;

use chrono::Datelike;
use tracing::{debug, warn};

use fasal_core::AdvisoryError;
use fasal_core::config::EngineConfig;
use fasal_gateway::base_provider::BaseRecommendationProvider;
use fasal_gateway::fallback;
use fasal_gateway::government::GovernmentDataGateway;
use fasal_gateway::types::{MarketPrice, WeatherData};

use crate::crops::find_crop;
use crate::ensemble::PredictiveEnsemble;
use crate::features::{self, FeatureInput, ForecastWindow};
use crate::forecast::{self, ForecastStatus};
use crate::outcome_store::OutcomeStore;
use crate::types::{
    AdvisoryReport, AdvisoryRequest, ConfidenceLevel, DataSourceKind, DataSources,
    EnhancedRecommendation, HistoricalPerformance, Predictions, Season, SoilType,
};

/// Compute the composite score for one candidate.
///
/// Components: 60% of the baseline suitability, a historical component on
/// [0, 15] (neutral midpoint below the attempt minimum), the forecast score
/// on [0, 20] halved when it exceeds 20 on input, and the success
/// probability mapped onto [0, 15].
pub fn compute_composite(
    baseline: f64,
    attempts: u32,
    success_rate: f64,
    forecast_score: f64,
    success_probability: f64,
    cfg: &EngineConfig,
) -> f64 {
    let historical = if attempts >= cfg.min_history_attempts {
        success_rate * 15.0
    } else {
        cfg.neutral_history
    };
    // Legacy feeds occasionally report forecast scores on a 0-40 scale.
    let weather = if forecast_score > 20.0 {
        forecast_score / 2.0
    } else {
        forecast_score
    };
    let ml = success_probability * 15.0;
    baseline * cfg.baseline_weight + historical + weather + ml
}

/// Score the evidence checklist behind one recommendation.
///
/// Starts at 0.2 and adds credit for historical depth, model conviction and
/// live forecast data.
pub fn compute_confidence(
    attempts: u32,
    success_probability: f64,
    forecast_status: ForecastStatus,
    cfg: &EngineConfig,
) -> f64 {
    let mut score = 0.2;
    if attempts >= cfg.strong_history_attempts {
        score += 0.3;
    } else if attempts >= cfg.min_history_attempts {
        score += 0.15;
    }
    if success_probability >= 0.8 {
        score += 0.3;
    } else if success_probability >= 0.6 {
        score += 0.2;
    } else {
        score += 0.1;
    }
    if forecast_status == ForecastStatus::Available {
        score += 0.2;
    } else {
        score += 0.1;
    }
    score
}

pub struct AdvisoryEngine {
    gateway: Arc<dyn GovernmentDataGateway>,
    provider: Arc<dyn BaseRecommendationProvider>,
    store: Arc<OutcomeStore>,
    ensemble: Arc<PredictiveEnsemble>,
    config: EngineConfig,
}

impl AdvisoryEngine {
    pub fn new(
        gateway: Arc<dyn GovernmentDataGateway>,
        provider: Arc<dyn BaseRecommendationProvider>,
        store: Arc<OutcomeStore>,
        ensemble: Arc<PredictiveEnsemble>,
        config: EngineConfig,
    ) -> Self {
        Self {
            gateway,
            provider,
            store,
            ensemble,
            config,
        }
    }

    /// Produce a ranked advisory report for one request.
    ///
    /// The three government feeds are fetched concurrently and individually
    /// degrade to fallback values; only a base-provider failure is fatal.
    pub async fn recommend(&self, request: &AdvisoryRequest) -> Result<AdvisoryReport, AdvisoryError> {
        let season = Season::parse_or_month(
            request.season.as_deref(),
            chrono::Utc::now().month(),
        );

        let (weather_res, market_res, soil_res) = tokio::join!(
            self.gateway
                .get_weather(&request.location, request.latitude, request.longitude),
            self.gateway.get_market_prices(&request.location),
            self.gateway
                .get_soil_health(&request.location, request.latitude, request.longitude),
        );

        let (weather, weather_kind) = Self::feed_or_fallback(
            weather_res,
            "weather",
            &request.location,
            fallback::fallback_weather,
        );
        let (market, market_kind) = Self::feed_or_fallback(
            market_res,
            "market",
            &request.location,
            fallback::fallback_market,
        );
        let (soil, soil_kind) = Self::feed_or_fallback(
            soil_res,
            "soil",
            &request.location,
            fallback::fallback_soil,
        );

        // Requested soil type wins over the feed's report.
        let soil_type = match request.soil_type.as_deref() {
            Some(s) => SoilType::parse(s),
            None => SoilType::parse(&soil.soil_type),
        };

        let candidates = self
            .provider
            .get_crop_recommendations(
                &request.location,
                Some(soil_type.as_str()),
                Some(season.as_str()),
                request.latitude,
                request.longitude,
            )
            .await
            .map_err(|e| AdvisoryError::DataUnavailable(e.to_string()))?;

        debug!(
            location = %request.location,
            season = season.as_str(),
            candidates = candidates.len(),
            "fusing recommendations"
        );

        let forecast_summary = forecast::summarize(&weather.forecast);
        let window = ForecastWindow::from_summary(&forecast_summary);

        let mut recommendations: Vec<EnhancedRecommendation> = candidates
            .into_iter()
            .map(|candidate| {
                self.enhance(&candidate, request, &weather, window, &market, season, soil_type)
            })
            .collect();

        recommendations.sort_by(|a, b| {
            b.enhanced_score
                .partial_cmp(&a.enhanced_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        recommendations.truncate(self.config.top_n);

        Ok(AdvisoryReport {
            location: request.location.clone(),
            season,
            soil_type,
            recommendations,
            forecast_summary,
            current_conditions: weather.current,
            data_sources: DataSources {
                weather: weather_kind,
                market: market_kind,
                soil: soil_kind,
            },
            recommendation_id: String::new(),
            generated_at: chrono::Utc::now().to_rfc3339(),
        })
    }

    fn feed_or_fallback<T>(
        result: Result<T, fasal_gateway::GatewayError>,
        feed: &str,
        location: &str,
        fallback: impl FnOnce() -> T,
    ) -> (T, DataSourceKind) {
        match result {
            Ok(value) => (value, DataSourceKind::Live),
            Err(e) => {
                warn!(feed, location, "feed failed, using fallback: {e}");
                (fallback(), DataSourceKind::Fallback)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn enhance(
        &self,
        candidate: &fasal_gateway::types::BaseCandidate,
        request: &AdvisoryRequest,
        weather: &WeatherData,
        window: Option<ForecastWindow>,
        market: &[MarketPrice],
        season: Season,
        soil_type: SoilType,
    ) -> EnhancedRecommendation {
        let crop = candidate.crop.as_str();
        let profile = find_crop(crop);

        let aggregate = self
            .store
            .get_crop_performance(&request.location, crop, season);
        let (attempts, success_rate) = aggregate
            .as_ref()
            .map_or((0, 0.0), |a| (a.attempts, a.success_rate()));

        let analysis = forecast::analyze(&weather.forecast, profile);

        let features = features::extract(&FeatureInput {
            weather: Some(&weather.current),
            window,
            soil_type,
            season,
            latitude: request.latitude,
            longitude: request.longitude,
            profile,
            baseline_profit: Some(candidate.profit_per_hectare),
        });

        let success_probability = self.ensemble.predict_success(&features);
        let expected_yield = self
            .ensemble
            .predict_yield(&features, candidate.yield_per_hectare);
        let expected_profit = self
            .ensemble
            .predict_profit(&features, candidate.profit_per_hectare);

        let enhanced_score = compute_composite(
            candidate.suitability_score,
            attempts,
            success_rate,
            analysis.suitability_score,
            success_probability,
            &self.config,
        );
        let confidence = compute_confidence(
            attempts,
            success_probability,
            analysis.status,
            &self.config,
        );

        let market_price = market
            .iter()
            .find(|p| p.crop.eq_ignore_ascii_case(crop))
            .map(|p| p.price_per_quintal);

        EnhancedRecommendation {
            crop: crop.to_string(),
            suitability_score: candidate.suitability_score,
            yield_per_hectare: candidate.yield_per_hectare,
            profit_per_hectare: candidate.profit_per_hectare,
            msp_per_quintal: candidate.msp_per_quintal,
            duration_days: candidate.duration_days,
            market_price_per_quintal: market_price,
            enhanced_score,
            historical_performance: aggregate.as_ref().map(HistoricalPerformance::from),
            weather_forecast_analysis: analysis,
            predictions: Predictions {
                success_probability,
                expected_yield,
                expected_profit,
            },
            confidence_level: ConfidenceLevel::from_score(confidence),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> EngineConfig {
        EngineConfig::default()
    }

    // ── composite score tests ────────────────────────────────────────

    #[test]
    fn test_composite_arithmetic() {
        // 80 * 0.6 + 0.8 * 15 + 13.5 + 0.6 * 15 = 48 + 12 + 13.5 + 9 = 82.5
        let score = compute_composite(80.0, 5, 0.8, 13.5, 0.6, &cfg());
        assert!((score - 82.5).abs() < 1e-9);
    }

    #[test]
    fn test_composite_documented_scenario() {
        // 70 * 0.6 + 0.8 * 15 + 16 + 0.9 * 15 = 42 + 12 + 16 + 13.5 = 83.5
        let score = compute_composite(70.0, 10, 0.8, 16.0, 0.9, &cfg());
        assert!((score - 83.5).abs() < 1e-9);
    }

    #[test]
    fn test_composite_neutral_history_below_minimum() {
        // Two attempts is below the minimum of three; the history component
        // is the neutral 7.5 regardless of the observed rate.
        let sparse = compute_composite(70.0, 2, 1.0, 10.0, 0.75, &cfg());
        let none = compute_composite(70.0, 0, 0.0, 10.0, 0.75, &cfg());
        assert!((sparse - none).abs() < 1e-9);
        assert!((sparse - (42.0 + 7.5 + 10.0 + 11.25)).abs() < 1e-9);
    }

    #[test]
    fn test_composite_halves_overscale_forecast() {
        let normal = compute_composite(0.0, 0, 0.0, 20.0, 0.0, &cfg());
        let overscale = compute_composite(0.0, 0, 0.0, 40.0, 0.0, &cfg());
        assert!((normal - overscale).abs() < 1e-9);
    }

    #[test]
    fn test_composite_component_bounds() {
        // Maximal inputs: 100 * 0.6 + 15 + 20 + 15 = 110.
        let max = compute_composite(100.0, 100, 1.0, 20.0, 1.0, &cfg());
        assert!((max - 110.0).abs() < 1e-9);
        // Minimal inputs with enough attempts: every component zero.
        let min = compute_composite(0.0, 100, 0.0, 0.0, 0.0, &cfg());
        assert!((min - 0.0).abs() < 1e-9);
    }

    // ── confidence checklist tests ───────────────────────────────────

    #[test]
    fn test_confidence_full_checklist() {
        // 0.2 + 0.3 (deep history) + 0.3 (strong model) + 0.2 (live) = 1.0
        let score = compute_confidence(10, 0.85, ForecastStatus::Available, &cfg());
        assert!((score - 1.0).abs() < 1e-9);
        assert_eq!(ConfidenceLevel::from_score(score), ConfidenceLevel::VeryHigh);
    }

    #[test]
    fn test_confidence_floor() {
        // 0.2 + 0 (no history) + 0.1 (weak model) + 0.1 (no forecast) = 0.4
        let score = compute_confidence(0, 0.3, ForecastStatus::NoForecast, &cfg());
        assert!((score - 0.4).abs() < 1e-9);
        assert_eq!(ConfidenceLevel::from_score(score), ConfidenceLevel::Low);
    }

    #[test]
    fn test_confidence_history_tiers() {
        let deep = compute_confidence(10, 0.7, ForecastStatus::Available, &cfg());
        let shallow = compute_confidence(3, 0.7, ForecastStatus::Available, &cfg());
        let none = compute_confidence(2, 0.7, ForecastStatus::Available, &cfg());
        assert!((deep - 0.9).abs() < 1e-9);
        assert!((shallow - 0.75).abs() < 1e-9);
        assert!((none - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_model_tiers() {
        let strong = compute_confidence(0, 0.8, ForecastStatus::NoForecast, &cfg());
        let medium = compute_confidence(0, 0.6, ForecastStatus::NoForecast, &cfg());
        let weak = compute_confidence(0, 0.59, ForecastStatus::NoForecast, &cfg());
        assert!((strong - 0.6).abs() < 1e-9);
        assert!((medium - 0.5).abs() < 1e-9);
        assert!((weak - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_untrained_prior_with_fallbacks_is_medium() {
        // The degraded-everything case: no history, the 0.75 untrained
        // prior, no live forecast. 0.2 + 0 + 0.2 + 0.1 = 0.5 -> Medium.
        let score = compute_confidence(
            0,
            crate::ensemble::UNTRAINED_SUCCESS_PROBABILITY,
            ForecastStatus::NoForecast,
            &cfg(),
        );
        assert!((score - 0.5).abs() < 1e-9);
        assert_eq!(ConfidenceLevel::from_score(score), ConfidenceLevel::Medium);
    }
}
