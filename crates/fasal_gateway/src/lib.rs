//! External data feeds at their boundary.
//!
//! Two collaborators live behind traits here: the Government Data Gateway
//! (weather / market / soil feeds) and the Base Recommendation Provider
//! (baseline crop suitability). Both are consumed by the fusion engine in
//! `fasal_engine`; neither is allowed to fail a recommendation call on its
//! own — gateway failures substitute the defaults in [`fallback`], and only
//! a Base Provider failure propagates.

pub mod base_provider;
pub mod fallback;
pub mod government;
pub mod types;

pub use base_provider::{BaseRecommendationProvider, HttpBaseProvider};
pub use government::{GovernmentDataGateway, HttpGovernmentGateway};
pub use types::{
    BaseCandidate, ForecastDay, MarketPrice, SoilHealth, WeatherData, WeatherSnapshot,
};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors any external feed may return.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout")]
    Timeout,

    /// The upstream answered, but with `status != "success"` or an HTTP
    /// error code. Treated the same as unreachable.
    #[error("Feed unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl GatewayError {
    /// Classify a `reqwest` failure. A timeout converts directly into the
    /// fallback path, so it gets its own variant.
    pub(crate) fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::Malformed(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(GatewayError::Timeout.to_string(), "Timeout");
        assert_eq!(
            GatewayError::Unavailable("weather".into()).to_string(),
            "Feed unavailable: weather"
        );
    }
}
