//! Government Data Gateway client.
//!
//! The gateway fronts the public weather / mandi-price / soil-health APIs
//! behind one `{ status, data }` envelope. Any `status != "success"`, HTTP
//! error, or timeout is reported as [`GatewayError`]; the fusion engine
//! substitutes fallback defaults in that case.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::GatewayError;
use crate::types::{MarketPrice, SoilHealth, WeatherData};

// ---------------------------------------------------------------------------
// Wire types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct Envelope<T> {
    status: String,
    #[serde(default)]
    data: Option<T>,
    #[serde(default)]
    message: Option<String>,
}

impl<T> Envelope<T> {
    fn into_data(self, feed: &str) -> Result<T, GatewayError> {
        if self.status != "success" {
            let detail = self.message.unwrap_or_else(|| self.status.clone());
            return Err(GatewayError::Unavailable(format!("{feed}: {detail}")));
        }
        self.data
            .ok_or_else(|| GatewayError::Malformed(format!("{feed}: success with no data")))
    }
}

#[derive(Debug, Deserialize)]
struct MarketData {
    #[serde(default)]
    prices: Vec<MarketPrice>,
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Unified interface to the government data feeds.
///
/// The three fetches are mutually independent and the fusion engine issues
/// them concurrently; implementations must be cheap to call from multiple
/// tasks at once.
#[async_trait]
pub trait GovernmentDataGateway: Send + Sync {
    /// Current weather plus the forecast horizon for a location.
    async fn get_weather(
        &self,
        location: &str,
        lat: Option<f64>,
        lon: Option<f64>,
    ) -> Result<WeatherData, GatewayError>;

    /// Mandi price quotes near a location.
    async fn get_market_prices(&self, location: &str) -> Result<Vec<MarketPrice>, GatewayError>;

    /// Soil health card values for a location.
    async fn get_soil_health(
        &self,
        location: &str,
        lat: Option<f64>,
        lon: Option<f64>,
    ) -> Result<SoilHealth, GatewayError>;
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

/// HTTP client for a deployed Government Data Gateway.
pub struct HttpGovernmentGateway {
    base_url: String,
    client: reqwest::Client,
    timeout: std::time::Duration,
}

impl HttpGovernmentGateway {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
            timeout: std::time::Duration::from_secs(timeout_secs),
        }
    }

    async fn fetch<T: serde::de::DeserializeOwned>(
        &self,
        feed: &str,
        path: String,
    ) -> Result<T, GatewayError> {
        let url = format!("{}{path}", self.base_url);
        debug!("Fetching {feed} feed: {url}");

        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(GatewayError::from_reqwest)?;

        if !response.status().is_success() {
            return Err(GatewayError::Unavailable(format!(
                "{feed}: HTTP {}",
                response.status()
            )));
        }

        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(GatewayError::from_reqwest)?;
        envelope.into_data(feed)
    }

    fn coord_query(lat: Option<f64>, lon: Option<f64>) -> String {
        match (lat, lon) {
            (Some(lat), Some(lon)) => format!("&lat={lat}&lon={lon}"),
            _ => String::new(),
        }
    }
}

#[async_trait]
impl GovernmentDataGateway for HttpGovernmentGateway {
    async fn get_weather(
        &self,
        location: &str,
        lat: Option<f64>,
        lon: Option<f64>,
    ) -> Result<WeatherData, GatewayError> {
        let path = format!(
            "/api/weather?location={location}{}",
            Self::coord_query(lat, lon)
        );
        self.fetch("weather", path).await
    }

    async fn get_market_prices(&self, location: &str) -> Result<Vec<MarketPrice>, GatewayError> {
        let path = format!("/api/market-prices?location={location}");
        let data: MarketData = self.fetch("market", path).await?;
        Ok(data.prices)
    }

    async fn get_soil_health(
        &self,
        location: &str,
        lat: Option<f64>,
        lon: Option<f64>,
    ) -> Result<SoilHealth, GatewayError> {
        let path = format!(
            "/api/soil-health?location={location}{}",
            Self::coord_query(lat, lon)
        );
        self.fetch("soil", path).await
    }
}
