use serde::{Deserialize, Serialize};

/// Point-in-time weather conditions at a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub rainfall_mm: f64,
    /// Free-text condition from the feed ("clear", "haze", ...).
    #[serde(default)]
    pub condition: String,
}

/// One day of the weather forecast horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    /// ISO date of the forecast day.
    pub date: String,
    pub temp_min_c: f64,
    pub temp_max_c: f64,
    pub rainfall_mm: f64,
    pub humidity_pct: f64,
}

impl ForecastDay {
    /// Midpoint of the day's temperature range.
    pub fn temp_mean_c(&self) -> f64 {
        (self.temp_min_c + self.temp_max_c) / 2.0
    }
}

/// Current conditions plus the forecast horizon (nominally 7 days).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherData {
    pub current: WeatherSnapshot,
    #[serde(default)]
    pub forecast: Vec<ForecastDay>,
}

/// A mandi price quote for one crop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketPrice {
    pub crop: String,
    pub price_per_quintal: f64,
    #[serde(default)]
    pub market: String,
}

/// Soil health card values for a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilHealth {
    pub soil_type: String,
    pub ph: f64,
    pub nitrogen_kg_ha: f64,
    pub phosphorus_kg_ha: f64,
    pub potassium_kg_ha: f64,
}

/// A baseline candidate produced by the Base Recommendation Provider.
///
/// `suitability_score` is on the provider's own 0..=100 scale and is fused
/// with the historical / weather / ML components downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseCandidate {
    pub crop: String,
    pub suitability_score: f64,
    pub yield_per_hectare: f64,
    pub profit_per_hectare: f64,
    pub msp_per_quintal: f64,
    pub duration_days: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forecast_day_mean() {
        let day = ForecastDay {
            date: "2026-08-30".into(),
            temp_min_c: 20.0,
            temp_max_c: 30.0,
            rainfall_mm: 4.0,
            humidity_pct: 70.0,
        };
        assert!((day.temp_mean_c() - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_weather_data_deserializes_without_forecast() {
        let json = r#"{
            "current": {
                "temperature_c": 31.0,
                "humidity_pct": 55.0,
                "rainfall_mm": 0.0
            }
        }"#;
        let data: WeatherData = serde_json::from_str(json).unwrap();
        assert!(data.forecast.is_empty());
        assert_eq!(data.current.condition, "");
    }

    #[test]
    fn test_base_candidate_roundtrip() {
        let candidate = BaseCandidate {
            crop: "wheat".into(),
            suitability_score: 72.5,
            yield_per_hectare: 35.0,
            profit_per_hectare: 45_000.0,
            msp_per_quintal: 2275.0,
            duration_days: 120,
        };
        let json = serde_json::to_string(&candidate).unwrap();
        let parsed: BaseCandidate = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, candidate);
    }
}
