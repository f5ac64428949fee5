//! Feature extraction: maps a (conditions, crop, location) triple onto a
//! fixed-width vector shared by training and inference. Slot order and
//! width are a hard contract; changing either invalidates persisted models.

use serde::{Deserialize, Serialize};

use fasal_gateway::types::WeatherSnapshot;

use crate::crops::CropProfile;
use crate::forecast::{ForecastStatus, ForecastSummary};
use crate::types::{Season, SoilType};

/// Fixed feature-vector width.
pub const FEATURE_LEN: usize = 14;

/// Default fill-ins for missing inputs.
const DEFAULT_TEMP_C: f64 = 25.0;
const DEFAULT_HUMIDITY_PCT: f64 = 60.0;
const DEFAULT_RAIN_7D_MM: f64 = 20.0;
/// Geographic centroid of India, used when coordinates are absent.
const DEFAULT_LATITUDE: f64 = 20.59;
const DEFAULT_LONGITUDE: f64 = 78.96;
/// Divisor that maps profit per hectare into roughly [0, 1].
const PROFIT_NORM_DIVISOR: f64 = 100_000.0;
/// Profit slot value when no baseline economics are known.
const DEFAULT_PROFIT_NORM: f64 = 0.5;

/// A fixed-width numeric feature vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(pub [f64; FEATURE_LEN]);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

/// Forecast-window statistics feeding slots 1-3 and 6.
///
/// Persisted with each recommendation, so training rebuilds the exact
/// vector the prediction was served under instead of re-deriving it from
/// data that is gone by feedback time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastWindow {
    pub temp_avg_c: f64,
    pub temp_min_c: f64,
    pub temp_max_c: f64,
    pub rain_total_mm: f64,
}

impl ForecastWindow {
    /// Window statistics from a forecast summary; `None` when the summary
    /// came from an empty (fallback) series.
    pub fn from_summary(summary: &ForecastSummary) -> Option<Self> {
        match summary.status {
            ForecastStatus::Available => Some(Self {
                temp_avg_c: summary.avg_temp_c,
                temp_min_c: summary.min_temp_c,
                temp_max_c: summary.max_temp_c,
                rain_total_mm: summary.total_rainfall_mm,
            }),
            ForecastStatus::NoForecast => None,
        }
    }
}

/// Inputs to feature extraction. Missing pieces get documented defaults so
/// a vector can always be produced.
///
/// `baseline_profit` is the candidate's expected profit from the base
/// provider. The realized outcome never feeds this slot; that would let the
/// regressors train on their own target.
pub struct FeatureInput<'a> {
    pub weather: Option<&'a WeatherSnapshot>,
    pub window: Option<ForecastWindow>,
    pub soil_type: SoilType,
    pub season: Season,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub profile: &'a CropProfile,
    pub baseline_profit: Option<f64>,
}

/// Build the 14-slot feature vector. Slot order:
/// current temp, 7-day avg/min/max temp, humidity, current rain, 7-day rain
/// total, soil code, season code, latitude, longitude, crop duration, water
/// requirement code, normalized baseline profit.
pub fn extract(input: &FeatureInput<'_>) -> FeatureVector {
    let temp_current = input.weather.map_or(DEFAULT_TEMP_C, |w| w.temperature_c);
    let humidity = input.weather.map_or(DEFAULT_HUMIDITY_PCT, |w| w.humidity_pct);
    let rain_current = input.weather.map_or(0.0, |w| w.rainfall_mm);

    // No forecast window degrades to the current temperature and the
    // default weekly rainfall.
    let (temp_avg, temp_min, temp_max, rain_total) = match input.window {
        Some(w) => (w.temp_avg_c, w.temp_min_c, w.temp_max_c, w.rain_total_mm),
        None => (temp_current, temp_current, temp_current, DEFAULT_RAIN_7D_MM),
    };

    let profit_norm = match input.baseline_profit {
        Some(p) => (p / PROFIT_NORM_DIVISOR).clamp(0.0, 1.0),
        None => DEFAULT_PROFIT_NORM,
    };

    FeatureVector([
        temp_current,
        temp_avg,
        temp_min,
        temp_max,
        humidity,
        rain_current,
        rain_total,
        input.soil_type.code(),
        input.season.code(),
        input.latitude.unwrap_or(DEFAULT_LATITUDE),
        input.longitude.unwrap_or(DEFAULT_LONGITUDE),
        f64::from(input.profile.duration_days),
        input.profile.water.code(),
        profit_norm,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crops::find_crop;
    use crate::forecast;
    use fasal_gateway::types::ForecastDay;

    fn snapshot() -> WeatherSnapshot {
        WeatherSnapshot {
            temperature_c: 31.0,
            humidity_pct: 78.0,
            rainfall_mm: 4.0,
            condition: "cloudy".into(),
        }
    }

    fn day(min: f64, max: f64, rain: f64) -> ForecastDay {
        ForecastDay {
            date: "2026-07-01".into(),
            temp_min_c: min,
            temp_max_c: max,
            rainfall_mm: rain,
            humidity_pct: 70.0,
        }
    }

    #[test]
    fn test_vector_width_is_fixed() {
        let weather = snapshot();
        let input = FeatureInput {
            weather: Some(&weather),
            window: None,
            soil_type: SoilType::Alluvial,
            season: Season::Kharif,
            latitude: Some(28.6),
            longitude: Some(77.2),
            profile: find_crop("rice"),
            baseline_profit: Some(50_000.0),
        };
        assert_eq!(extract(&input).as_slice().len(), FEATURE_LEN);
    }

    #[test]
    fn test_slot_order_contract() {
        let weather = snapshot();
        let days = vec![day(24.0, 32.0, 10.0), day(22.0, 30.0, 0.0)];
        let window = ForecastWindow::from_summary(&forecast::summarize(&days)).unwrap();
        let input = FeatureInput {
            weather: Some(&weather),
            window: Some(window),
            soil_type: SoilType::Black,
            season: Season::Rabi,
            latitude: Some(21.1),
            longitude: Some(79.1),
            profile: find_crop("cotton"),
            baseline_profit: Some(60_000.0),
        };
        let v = extract(&input);
        assert!((v.0[0] - 31.0).abs() < f64::EPSILON); // current temp
        assert!((v.0[1] - 27.0).abs() < f64::EPSILON); // 7d avg temp
        assert!((v.0[2] - 22.0).abs() < f64::EPSILON); // 7d min
        assert!((v.0[3] - 32.0).abs() < f64::EPSILON); // 7d max
        assert!((v.0[4] - 78.0).abs() < f64::EPSILON); // humidity
        assert!((v.0[5] - 4.0).abs() < f64::EPSILON); // current rain
        assert!((v.0[6] - 10.0).abs() < f64::EPSILON); // 7d rain total
        assert!((v.0[7] - 1.0).abs() < f64::EPSILON); // soil: black
        assert!((v.0[8] - 2.0).abs() < f64::EPSILON); // season: rabi
        assert!((v.0[11] - 170.0).abs() < f64::EPSILON); // cotton duration
        assert!((v.0[12] - 2.0).abs() < f64::EPSILON); // moderate water
        assert!((v.0[13] - 0.6).abs() < f64::EPSILON); // profit norm
    }

    #[test]
    fn test_missing_weather_uses_defaults() {
        let input = FeatureInput {
            weather: None,
            window: None,
            soil_type: SoilType::Loamy,
            season: Season::Kharif,
            latitude: None,
            longitude: None,
            profile: find_crop("wheat"),
            baseline_profit: None,
        };
        let v = extract(&input);
        assert!((v.0[0] - DEFAULT_TEMP_C).abs() < f64::EPSILON);
        assert!((v.0[4] - DEFAULT_HUMIDITY_PCT).abs() < f64::EPSILON);
        assert!((v.0[6] - DEFAULT_RAIN_7D_MM).abs() < f64::EPSILON);
        assert!((v.0[9] - DEFAULT_LATITUDE).abs() < f64::EPSILON);
        assert!((v.0[10] - DEFAULT_LONGITUDE).abs() < f64::EPSILON);
        assert!((v.0[13] - DEFAULT_PROFIT_NORM).abs() < f64::EPSILON);
    }

    #[test]
    fn test_no_window_falls_back_to_current_temp() {
        let weather = snapshot();
        let input = FeatureInput {
            weather: Some(&weather),
            window: None,
            soil_type: SoilType::Loamy,
            season: Season::Kharif,
            latitude: None,
            longitude: None,
            profile: find_crop("rice"),
            baseline_profit: Some(0.0),
        };
        let v = extract(&input);
        assert!((v.0[1] - 31.0).abs() < f64::EPSILON);
        assert!((v.0[2] - 31.0).abs() < f64::EPSILON);
        assert!((v.0[3] - 31.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_profit_norm_clamped() {
        let input = FeatureInput {
            weather: None,
            window: None,
            soil_type: SoilType::Loamy,
            season: Season::Kharif,
            latitude: None,
            longitude: None,
            profile: find_crop("sugarcane"),
            baseline_profit: Some(900_000.0),
        };
        let v = extract(&input);
        assert!((v.0[13] - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_window_from_empty_summary_is_none() {
        assert!(ForecastWindow::from_summary(&forecast::summarize(&[])).is_none());
    }

    #[test]
    fn test_window_from_live_summary_carries_stats() {
        let days = vec![day(20.0, 30.0, 5.0), day(22.0, 34.0, 3.0)];
        let window = ForecastWindow::from_summary(&forecast::summarize(&days)).unwrap();
        assert!((window.temp_min_c - 20.0).abs() < f64::EPSILON);
        assert!((window.temp_max_c - 34.0).abs() < f64::EPSILON);
        assert!((window.rain_total_mm - 8.0).abs() < f64::EPSILON);
    }
}
