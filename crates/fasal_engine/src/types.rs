use serde::{Deserialize, Serialize};

use fasal_gateway::types::WeatherSnapshot;

// ---------------------------------------------------------------------------
// Enumerations with fixed numeric codes
// ---------------------------------------------------------------------------

/// Indian cropping season. The numeric codes are part of the feature-vector
/// contract and must not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Kharif,
    Rabi,
    Zaid,
    YearRound,
}

impl Season {
    /// Fixed feature code: kharif=1, rabi=2, zaid=3, year_round=4.
    pub fn code(self) -> f64 {
        match self {
            Self::Kharif => 1.0,
            Self::Rabi => 2.0,
            Self::Zaid => 3.0,
            Self::YearRound => 4.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Kharif => "kharif",
            Self::Rabi => "rabi",
            Self::Zaid => "zaid",
            Self::YearRound => "year_round",
        }
    }

    /// Parse a season name; unrecognized input falls back to the season
    /// implied by the given month.
    pub fn parse_or_month(input: Option<&str>, month: u32) -> Self {
        match input.map(|s| s.trim().to_lowercase()).as_deref() {
            Some("kharif") => Self::Kharif,
            Some("rabi") => Self::Rabi,
            Some("zaid") | Some("zayad") | Some("summer") => Self::Zaid,
            Some("year_round") | Some("annual") => Self::YearRound,
            _ => Self::from_month(month),
        }
    }

    /// Season implied by a calendar month: Jun-Oct kharif (monsoon sowing),
    /// Nov-Mar rabi (winter sowing), Apr-May zaid.
    pub fn from_month(month: u32) -> Self {
        match month {
            6..=10 => Self::Kharif,
            4 | 5 => Self::Zaid,
            _ => Self::Rabi,
        }
    }

    /// Season implied by today's date.
    pub fn current() -> Self {
        use chrono::Datelike;
        Self::from_month(chrono::Utc::now().month())
    }
}

/// Soil type with its fixed feature code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoilType {
    Black,
    Clay,
    Red,
    Alluvial,
    Sandy,
    Loamy,
}

impl SoilType {
    /// Fixed feature code: black=1, clay=2, red=3, alluvial=4, sandy=5, loamy=6.
    pub fn code(self) -> f64 {
        match self {
            Self::Black => 1.0,
            Self::Clay => 2.0,
            Self::Red => 3.0,
            Self::Alluvial => 4.0,
            Self::Sandy => 5.0,
            Self::Loamy => 6.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Black => "black",
            Self::Clay => "clay",
            Self::Red => "red",
            Self::Alluvial => "alluvial",
            Self::Sandy => "sandy",
            Self::Loamy => "loamy",
        }
    }

    /// Parse a soil name; unknown input defaults to loamy (the documented
    /// neutral default).
    pub fn parse(input: &str) -> Self {
        match input.trim().to_lowercase().as_str() {
            "black" | "regur" => Self::Black,
            "clay" | "clayey" => Self::Clay,
            "red" => Self::Red,
            "alluvial" => Self::Alluvial,
            "sandy" | "sand" => Self::Sandy,
            _ => Self::Loamy,
        }
    }
}

/// Crop water requirement with its fixed feature code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaterRequirement {
    Low,
    Moderate,
    High,
}

impl WaterRequirement {
    /// Fixed feature code: low=1, moderate=2, high=3.
    pub fn code(self) -> f64 {
        match self {
            Self::Low => 1.0,
            Self::Moderate => 2.0,
            Self::High => 3.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Outcome records
// ---------------------------------------------------------------------------

/// A crop offered in a recommendation, with the baseline economics it was
/// scored under. The baseline (not the realized outcome) is what training
/// feeds back into the profit feature slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferedCrop {
    pub crop: String,
    pub profit_per_hectare: f64,
}

/// A recommendation handed to a farmer. Append-only; `id` is assigned by the
/// store on insert (pass an empty string).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationRecord {
    pub id: String,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub season: Season,
    pub soil_type: SoilType,
    /// Conditions at recommendation time; joined back for training features.
    pub weather: WeatherSnapshot,
    /// Forecast-window statistics the prediction was served under; `None`
    /// when the weather feed was on its fallback.
    pub forecast: Option<crate::features::ForecastWindow>,
    pub crops_offered: Vec<OfferedCrop>,
    pub timestamp: String,
}

/// A farmer-reported outcome for an earlier recommendation. Append-only;
/// `id` is assigned by the store. `recommendation_id` is a weak reference:
/// when it cannot be resolved the record is excluded from training joins but
/// still counted in the performance aggregates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub id: String,
    pub recommendation_id: String,
    pub crop: String,
    pub yield_achieved: f64,
    pub profit_realized: f64,
    /// 1..=5 farmer satisfaction rating.
    pub satisfaction: u8,
    pub success: bool,
    pub timestamp: String,
}

/// Running per-(location, crop, season) performance sums. Mutated only by
/// O(1) incremental updates; derived rates are recomputed from the sums.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceAggregate {
    pub location: String,
    pub crop: String,
    pub season: Season,
    pub attempts: u32,
    pub successes: u32,
    pub yield_sum: f64,
    pub profit_sum: f64,
}

impl PerformanceAggregate {
    /// Success rate in [0, 1]. Zero attempts yields 0.0.
    pub fn success_rate(&self) -> f64 {
        if self.attempts == 0 {
            return 0.0;
        }
        (f64::from(self.successes) / f64::from(self.attempts)).clamp(0.0, 1.0)
    }

    pub fn avg_yield(&self) -> f64 {
        if self.attempts == 0 {
            return 0.0;
        }
        self.yield_sum / f64::from(self.attempts)
    }

    pub fn avg_profit(&self) -> f64 {
        if self.attempts == 0 {
            return 0.0;
        }
        self.profit_sum / f64::from(self.attempts)
    }
}

// ---------------------------------------------------------------------------
// Training set
// ---------------------------------------------------------------------------

/// Target values for one training sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingOutcome {
    pub success: bool,
    pub yield_achieved: f64,
    pub profit_realized: f64,
}

/// One (features, outcome) pair joined from the outcome logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    pub features: crate::features::FeatureVector,
    pub outcome: TrainingOutcome,
}

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// Recognized request fields. Everything except the location is optional and
/// is inferred or defaulted when absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdvisoryRequest {
    pub location: String,
    pub soil_type: Option<String>,
    pub season: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Whether a data feed answered live or was substituted by its fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSourceKind {
    Live,
    Fallback,
}

/// Per-feed provenance markers for a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSources {
    pub weather: DataSourceKind,
    pub market: DataSourceKind,
    pub soil: DataSourceKind,
}

/// Coarse evidence label for a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl ConfidenceLevel {
    /// Map a checklist score to a label: >=0.8 Very High, >=0.65 High,
    /// >=0.5 Medium, else Low.
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            Self::VeryHigh
        } else if score >= 0.65 {
            Self::High
        } else if score >= 0.5 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl std::fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::VeryHigh => "Very High",
        };
        f.write_str(s)
    }
}

/// Snapshot of the historical evidence behind one recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPerformance {
    pub attempts: u32,
    pub success_rate: f64,
    pub avg_yield: f64,
    pub avg_profit: f64,
}

impl From<&PerformanceAggregate> for HistoricalPerformance {
    fn from(agg: &PerformanceAggregate) -> Self {
        Self {
            attempts: agg.attempts,
            success_rate: agg.success_rate(),
            avg_yield: agg.avg_yield(),
            avg_profit: agg.avg_profit(),
        }
    }
}

/// Ensemble outputs for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predictions {
    pub success_probability: f64,
    pub expected_yield: f64,
    pub expected_profit: f64,
}

/// One fused, confidence-labeled recommendation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhancedRecommendation {
    pub crop: String,
    /// Baseline suitability from the Base Provider (0..=100 scale).
    pub suitability_score: f64,
    pub yield_per_hectare: f64,
    pub profit_per_hectare: f64,
    pub msp_per_quintal: f64,
    pub duration_days: u32,
    /// Live mandi quote when the market feed answered, else `None`
    /// (consumers fall back to `msp_per_quintal`).
    pub market_price_per_quintal: Option<f64>,
    /// The composite score the list is ranked by.
    pub enhanced_score: f64,
    pub historical_performance: Option<HistoricalPerformance>,
    pub weather_forecast_analysis: crate::forecast::ForecastAnalysis,
    pub predictions: Predictions,
    pub confidence_level: ConfidenceLevel,
}

/// The full advisory report for one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisoryReport {
    pub location: String,
    pub season: Season,
    pub soil_type: SoilType,
    pub recommendations: Vec<EnhancedRecommendation>,
    pub current_conditions: WeatherSnapshot,
    pub forecast_summary: crate::forecast::ForecastSummary,
    pub data_sources: DataSources,
    /// Outcome-store id of the tracked recommendation; empty when tracking
    /// failed (the report is still usable).
    pub recommendation_id: String,
    pub generated_at: String,
}

/// An entry in the transparent advisory event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisoryLogEntry {
    pub id: i64,
    pub event_type: String,
    pub description: String,
    pub details: String,
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── season tests ─────────────────────────────────────────────────

    #[test]
    fn test_season_codes() {
        assert!((Season::Kharif.code() - 1.0).abs() < f64::EPSILON);
        assert!((Season::Rabi.code() - 2.0).abs() < f64::EPSILON);
        assert!((Season::Zaid.code() - 3.0).abs() < f64::EPSILON);
        assert!((Season::YearRound.code() - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_season_parse_known_names() {
        assert_eq!(Season::parse_or_month(Some("Kharif"), 1), Season::Kharif);
        assert_eq!(Season::parse_or_month(Some("rabi"), 7), Season::Rabi);
        assert_eq!(Season::parse_or_month(Some("summer"), 1), Season::Zaid);
    }

    #[test]
    fn test_season_parse_falls_back_to_month() {
        assert_eq!(Season::parse_or_month(None, 7), Season::Kharif);
        assert_eq!(Season::parse_or_month(Some("???"), 12), Season::Rabi);
        assert_eq!(Season::parse_or_month(None, 4), Season::Zaid);
    }

    #[test]
    fn test_season_from_month_boundaries() {
        assert_eq!(Season::from_month(6), Season::Kharif);
        assert_eq!(Season::from_month(10), Season::Kharif);
        assert_eq!(Season::from_month(11), Season::Rabi);
        assert_eq!(Season::from_month(3), Season::Rabi);
        assert_eq!(Season::from_month(5), Season::Zaid);
    }

    // ── soil tests ───────────────────────────────────────────────────

    #[test]
    fn test_soil_codes_are_fixed_enumeration() {
        assert!((SoilType::Black.code() - 1.0).abs() < f64::EPSILON);
        assert!((SoilType::Loamy.code() - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_soil_parse_unknown_defaults_loamy() {
        assert_eq!(SoilType::parse("laterite"), SoilType::Loamy);
        assert_eq!(SoilType::parse(""), SoilType::Loamy);
        assert_eq!(SoilType::parse("Black"), SoilType::Black);
        assert_eq!(SoilType::parse("  sandy "), SoilType::Sandy);
    }

    // ── aggregate tests ──────────────────────────────────────────────

    #[test]
    fn test_aggregate_derived_fields() {
        let agg = PerformanceAggregate {
            location: "Nagpur".into(),
            crop: "cotton".into(),
            season: Season::Kharif,
            attempts: 4,
            successes: 3,
            yield_sum: 88.0,
            profit_sum: 160_000.0,
        };
        assert!((agg.success_rate() - 0.75).abs() < f64::EPSILON);
        assert!((agg.avg_yield() - 22.0).abs() < f64::EPSILON);
        assert!((agg.avg_profit() - 40_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_aggregate_zero_attempts() {
        let agg = PerformanceAggregate {
            location: "Nagpur".into(),
            crop: "cotton".into(),
            season: Season::Kharif,
            attempts: 0,
            successes: 0,
            yield_sum: 0.0,
            profit_sum: 0.0,
        };
        assert!((agg.success_rate() - 0.0).abs() < f64::EPSILON);
        assert!((agg.avg_yield() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_success_rate_always_in_unit_interval() {
        // successes > attempts can only arise from a corrupted row; the
        // derived rate still clamps into [0, 1].
        let agg = PerformanceAggregate {
            location: "x".into(),
            crop: "y".into(),
            season: Season::Rabi,
            attempts: 2,
            successes: 5,
            yield_sum: 0.0,
            profit_sum: 0.0,
        };
        assert!((agg.success_rate() - 1.0).abs() < f64::EPSILON);
    }

    // ── confidence tests ─────────────────────────────────────────────

    #[test]
    fn test_confidence_thresholds() {
        assert_eq!(ConfidenceLevel::from_score(0.85), ConfidenceLevel::VeryHigh);
        assert_eq!(ConfidenceLevel::from_score(0.6), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_score(0.3), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::from_score(0.7), ConfidenceLevel::High);
    }

    #[test]
    fn test_confidence_boundary_values() {
        // Each boundary lands on the documented side of its threshold.
        assert_eq!(ConfidenceLevel::from_score(0.80), ConfidenceLevel::VeryHigh);
        assert_eq!(ConfidenceLevel::from_score(0.79), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_score(0.50), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_score(0.49), ConfidenceLevel::Low);
    }

    #[test]
    fn test_confidence_display() {
        assert_eq!(ConfidenceLevel::VeryHigh.to_string(), "Very High");
        assert_eq!(ConfidenceLevel::Low.to_string(), "Low");
    }

    // ── serde tests ──────────────────────────────────────────────────

    #[test]
    fn test_season_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&Season::YearRound).unwrap(),
            "\"year_round\""
        );
        assert_eq!(serde_json::to_string(&Season::Kharif).unwrap(), "\"kharif\"");
    }

    #[test]
    fn test_feedback_record_roundtrip() {
        let record = FeedbackRecord {
            id: String::new(),
            recommendation_id: "rec-1".into(),
            crop: "wheat".into(),
            yield_achieved: 32.0,
            profit_realized: 41_000.0,
            satisfaction: 4,
            success: true,
            timestamp: "2026-04-01T00:00:00Z".into(),
        };
        let json = serde_json::to_string(&record).unwrap();
        let parsed: FeedbackRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.crop, "wheat");
        assert!(parsed.success);
        assert_eq!(parsed.satisfaction, 4);
    }

    #[test]
    fn test_historical_performance_from_aggregate() {
        let agg = PerformanceAggregate {
            location: "Delhi".into(),
            crop: "wheat".into(),
            season: Season::Rabi,
            attempts: 10,
            successes: 8,
            yield_sum: 320.0,
            profit_sum: 400_000.0,
        };
        let hist = HistoricalPerformance::from(&agg);
        assert_eq!(hist.attempts, 10);
        assert!((hist.success_rate - 0.8).abs() < f64::EPSILON);
        assert!((hist.avg_yield - 32.0).abs() < f64::EPSILON);
    }
}
