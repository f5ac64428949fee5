//! Base Recommendation Provider boundary.
//!
//! The baseline suitability algorithm itself is external; this module only
//! types its contract. A provider failure is the single fatal path of a
//! recommendation call — there is no baseline to degrade to.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::GatewayError;
use crate::types::BaseCandidate;

#[derive(Debug, Deserialize)]
struct RecommendationsResponse {
    #[serde(default)]
    recommendations: Vec<BaseCandidate>,
}

/// Source of baseline crop candidates for a location.
#[async_trait]
pub trait BaseRecommendationProvider: Send + Sync {
    /// Candidate crops with baseline suitability scores and economics.
    /// An empty list is a valid answer (nothing grows here); an error means
    /// the provider could not answer at all.
    async fn get_crop_recommendations(
        &self,
        location: &str,
        soil_type: Option<&str>,
        season: Option<&str>,
        lat: Option<f64>,
        lon: Option<f64>,
    ) -> Result<Vec<BaseCandidate>, GatewayError>;
}

/// HTTP client for a deployed Base Recommendation Provider.
pub struct HttpBaseProvider {
    base_url: String,
    client: reqwest::Client,
    timeout: std::time::Duration,
}

impl HttpBaseProvider {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
            timeout: std::time::Duration::from_secs(timeout_secs),
        }
    }
}

#[async_trait]
impl BaseRecommendationProvider for HttpBaseProvider {
    async fn get_crop_recommendations(
        &self,
        location: &str,
        soil_type: Option<&str>,
        season: Option<&str>,
        lat: Option<f64>,
        lon: Option<f64>,
    ) -> Result<Vec<BaseCandidate>, GatewayError> {
        let mut url = format!(
            "{}/api/recommendations?location={location}",
            self.base_url
        );
        if let Some(soil) = soil_type {
            url.push_str(&format!("&soil_type={soil}"));
        }
        if let Some(season) = season {
            url.push_str(&format!("&season={season}"));
        }
        if let (Some(lat), Some(lon)) = (lat, lon) {
            url.push_str(&format!("&lat={lat}&lon={lon}"));
        }
        debug!("Fetching baseline candidates: {url}");

        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(GatewayError::from_reqwest)?;

        if !response.status().is_success() {
            return Err(GatewayError::Unavailable(format!(
                "base provider: HTTP {}",
                response.status()
            )));
        }

        let parsed: RecommendationsResponse = response
            .json()
            .await
            .map_err(GatewayError::from_reqwest)?;
        Ok(parsed.recommendations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_parses() {
        let json = r#"{
            "recommendations": [
                {
                    "crop": "wheat",
                    "suitability_score": 70.0,
                    "yield_per_hectare": 35.0,
                    "profit_per_hectare": 45000.0,
                    "msp_per_quintal": 2275.0,
                    "duration_days": 120
                }
            ]
        }"#;
        let parsed: RecommendationsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.recommendations.len(), 1);
        assert_eq!(parsed.recommendations[0].crop, "wheat");
    }

    #[test]
    fn test_empty_response_is_valid() {
        let parsed: RecommendationsResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.recommendations.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_provider_errors() {
        let provider = HttpBaseProvider::new("http://127.0.0.1:1", 1);
        let err = provider
            .get_crop_recommendations("Delhi", Some("loamy"), Some("rabi"), None, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Network(_) | GatewayError::Timeout
        ));
    }
}
