//! Documented fallback defaults for each feed.
//!
//! When a feed is down or times out, the fusion engine substitutes these
//! values and marks the feed `fallback` in the report's `data_sources`
//! metadata. The numbers are central-India climatological normals chosen so
//! the composite score stays neutral rather than dragging candidates up or
//! down.

use crate::types::{MarketPrice, SoilHealth, WeatherData, WeatherSnapshot};

/// Neutral current conditions: 25 °C, 60% humidity, no rain, empty forecast.
///
/// The empty forecast matters: it puts the Forecast Analyzer into its
/// `no_forecast` state, which scores a neutral midpoint and keeps forecast
/// confidence low.
pub fn fallback_weather() -> WeatherData {
    WeatherData {
        current: WeatherSnapshot {
            temperature_c: 25.0,
            humidity_pct: 60.0,
            rainfall_mm: 0.0,
            condition: "unknown".into(),
        },
        forecast: Vec::new(),
    }
}

/// No market quotes. Downstream consumers fall back to each candidate's MSP.
pub fn fallback_market() -> Vec<MarketPrice> {
    Vec::new()
}

/// Loamy soil at neutral pH with median nutrient values.
pub fn fallback_soil() -> SoilHealth {
    SoilHealth {
        soil_type: "loamy".into(),
        ph: 7.0,
        nitrogen_kg_ha: 280.0,
        phosphorus_kg_ha: 14.0,
        potassium_kg_ha: 200.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_weather_has_empty_forecast() {
        let weather = fallback_weather();
        assert!(weather.forecast.is_empty());
        assert!((weather.current.temperature_c - 25.0).abs() < f64::EPSILON);
        assert!((weather.current.humidity_pct - 60.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_fallback_soil_is_neutral_loamy() {
        let soil = fallback_soil();
        assert_eq!(soil.soil_type, "loamy");
        assert!((soil.ph - 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_fallback_market_is_empty() {
        assert!(fallback_market().is_empty());
    }
}
