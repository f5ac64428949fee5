//! Forecast analysis: reduces a multi-day forecast series to aggregate
//! statistics and a per-crop suitability score on a fixed [0, 20] scale.

use serde::{Deserialize, Serialize};

use fasal_gateway::types::ForecastDay;

use crate::crops::CropProfile;

/// Rainfall at or above this many millimetres counts as a rainy day
/// (IMD definition).
pub const RAINY_DAY_MM: f64 = 2.5;

/// Neutral midpoint of the forecast suitability scale.
pub const NEUTRAL_FORECAST_SCORE: f64 = 10.0;

/// Whether the analysis ran on live forecast data or a placeholder series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastStatus {
    Available,
    NoForecast,
}

/// Aggregate statistics over the forecast window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSummary {
    pub avg_temp_c: f64,
    pub min_temp_c: f64,
    pub max_temp_c: f64,
    pub total_rainfall_mm: f64,
    pub rainy_day_count: usize,
    pub status: ForecastStatus,
}

/// Per-crop forecast verdict carried on each recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastAnalysis {
    /// Suitability on [0, 20]; 10 is neutral.
    pub suitability_score: f64,
    pub status: ForecastStatus,
}

/// Reduce a forecast series to aggregate statistics. An empty series marks
/// the summary `NoForecast` with neutral placeholder values.
pub fn summarize(days: &[ForecastDay]) -> ForecastSummary {
    if days.is_empty() {
        return ForecastSummary {
            avg_temp_c: 25.0,
            min_temp_c: 25.0,
            max_temp_c: 25.0,
            total_rainfall_mm: 0.0,
            rainy_day_count: 0,
            status: ForecastStatus::NoForecast,
        };
    }

    let n = days.len() as f64;
    let avg_temp_c = days.iter().map(|d| d.temp_mean_c()).sum::<f64>() / n;
    let min_temp_c = days.iter().map(|d| d.temp_min_c).fold(f64::INFINITY, f64::min);
    let max_temp_c = days.iter().map(|d| d.temp_max_c).fold(f64::NEG_INFINITY, f64::max);
    let total_rainfall_mm = days.iter().map(|d| d.rainfall_mm).sum();
    let rainy_day_count = days.iter().filter(|d| d.rainfall_mm >= RAINY_DAY_MM).count();

    ForecastSummary {
        avg_temp_c,
        min_temp_c,
        max_temp_c,
        total_rainfall_mm,
        rainy_day_count,
        status: ForecastStatus::Available,
    }
}

/// Score how well the forecast window suits one crop.
///
/// Starts from the neutral midpoint; temperature and rainfall each add a
/// fixed bonus inside the crop's ideal band or a capped, deviation-scaled
/// penalty outside it. The result is clamped to [0, 20]. An empty series
/// stays exactly neutral.
pub fn analyze(days: &[ForecastDay], profile: &CropProfile) -> ForecastAnalysis {
    let summary = summarize(days);
    if summary.status == ForecastStatus::NoForecast {
        return ForecastAnalysis {
            suitability_score: NEUTRAL_FORECAST_SCORE,
            status: ForecastStatus::NoForecast,
        };
    }

    let mut score = NEUTRAL_FORECAST_SCORE;

    let (temp_lo, temp_hi) = profile.ideal_temp_c;
    if summary.avg_temp_c >= temp_lo && summary.avg_temp_c <= temp_hi {
        score += 5.0;
    } else {
        let deviation = if summary.avg_temp_c < temp_lo {
            temp_lo - summary.avg_temp_c
        } else {
            summary.avg_temp_c - temp_hi
        };
        score -= (deviation * 0.8).min(7.0);
    }

    let (rain_lo, rain_hi) = profile.ideal_rain_mm;
    if summary.total_rainfall_mm >= rain_lo && summary.total_rainfall_mm <= rain_hi {
        score += 5.0;
    } else {
        let deviation = if summary.total_rainfall_mm < rain_lo {
            rain_lo - summary.total_rainfall_mm
        } else {
            summary.total_rainfall_mm - rain_hi
        };
        score -= (deviation * 0.1).min(7.0);
    }

    ForecastAnalysis {
        suitability_score: score.clamp(0.0, 20.0),
        status: ForecastStatus::Available,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crops::find_crop;

    fn day(min: f64, max: f64, rain: f64) -> ForecastDay {
        ForecastDay {
            date: "2026-07-01".into(),
            temp_min_c: min,
            temp_max_c: max,
            rainfall_mm: rain,
            humidity_pct: 70.0,
        }
    }

    // ── summarize tests ──────────────────────────────────────────────

    #[test]
    fn test_summarize_empty_is_no_forecast() {
        let summary = summarize(&[]);
        assert_eq!(summary.status, ForecastStatus::NoForecast);
        assert_eq!(summary.rainy_day_count, 0);
    }

    #[test]
    fn test_summarize_statistics() {
        let days = vec![day(20.0, 30.0, 5.0), day(22.0, 34.0, 0.5), day(18.0, 28.0, 12.0)];
        let summary = summarize(&days);
        assert_eq!(summary.status, ForecastStatus::Available);
        assert!((summary.min_temp_c - 18.0).abs() < f64::EPSILON);
        assert!((summary.max_temp_c - 34.0).abs() < f64::EPSILON);
        assert!((summary.total_rainfall_mm - 17.5).abs() < f64::EPSILON);
        // 0.5 mm is below the 2.5 mm rainy-day threshold.
        assert_eq!(summary.rainy_day_count, 2);
    }

    #[test]
    fn test_rainy_day_threshold_inclusive() {
        let summary = summarize(&[day(20.0, 30.0, 2.5)]);
        assert_eq!(summary.rainy_day_count, 1);
    }

    // ── analyze tests ────────────────────────────────────────────────

    #[test]
    fn test_analyze_empty_series_is_neutral() {
        let analysis = analyze(&[], find_crop("rice"));
        assert_eq!(analysis.status, ForecastStatus::NoForecast);
        assert!((analysis.suitability_score - NEUTRAL_FORECAST_SCORE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_analyze_ideal_conditions_score_twenty() {
        // Rice: 20-35 C, 80-200 mm. Both bands hit -> 10 + 5 + 5.
        let days: Vec<_> = (0..7).map(|_| day(24.0, 32.0, 15.0)).collect();
        let analysis = analyze(&days, find_crop("rice"));
        assert_eq!(analysis.status, ForecastStatus::Available);
        assert!((analysis.suitability_score - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_analyze_cold_snap_penalized() {
        // Avg temp 5 C against rice's 20 C floor: deviation 15 caps the
        // temperature penalty at 7. Zero rain misses the 80 mm floor too.
        let days: Vec<_> = (0..7).map(|_| day(2.0, 8.0, 0.0)).collect();
        let analysis = analyze(&days, find_crop("rice"));
        assert!(analysis.suitability_score < NEUTRAL_FORECAST_SCORE);
        assert!(analysis.suitability_score >= 0.0);
    }

    #[test]
    fn test_analyze_score_never_leaves_scale() {
        let scorching: Vec<_> = (0..7).map(|_| day(40.0, 50.0, 600.0)).collect();
        for profile in crate::crops::CROP_REGISTRY.iter() {
            let analysis = analyze(&scorching, profile);
            assert!(analysis.suitability_score >= 0.0);
            assert!(analysis.suitability_score <= 20.0);
        }
    }

    #[test]
    fn test_analyze_mixed_band_hit() {
        // Wheat: 10-25 C, 10-40 mm. Temp in band, rain over band.
        let days: Vec<_> = (0..7).map(|_| day(12.0, 22.0, 20.0)).collect();
        let analysis = analyze(&days, find_crop("wheat"));
        // 10 + 5 (temp) - (140 - 40) * 0.1 capped at 7 => 8.
        assert!((analysis.suitability_score - 8.0).abs() < 1e-9);
    }
}
