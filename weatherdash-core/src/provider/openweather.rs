use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{Coordinates, DashboardError};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// OpenWeatherMap v2.5 client (`/weather` and `/forecast`, metric units).
#[derive(Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl std::fmt::Debug for OpenWeatherProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenWeatherProvider")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            http: Client::new(),
        }
    }

    pub fn with_base_url(
        api_key: String,
        base_url: String,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// GET `{base_url}/{endpoint}` with auth and units attached.
    ///
    /// Returns the status alongside the body so callers pick their own error
    /// for a non-success response.
    async fn get(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<(StatusCode, String), DashboardError> {
        let url = format!("{}/{}", self.base_url, endpoint);

        let res = self
            .http
            .get(&url)
            .query(params)
            .query(&[("appid", self.api_key.as_str()), ("units", "metric")])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;
        debug!(%status, endpoint, "upstream responded");

        Ok((status, body))
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    #[instrument(skip(self))]
    async fn current_by_city(&self, city: &str) -> Result<OwCurrentResponse, DashboardError> {
        let (status, body) = self.get("weather", &[("q", city.to_string())]).await?;

        if !status.is_success() {
            debug!(body = %truncate_body(&body), "city lookup rejected");
            return Err(DashboardError::NotFound {
                city: city.to_string(),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }

    #[instrument(skip(self))]
    async fn current_by_coords(
        &self,
        coords: Coordinates,
    ) -> Result<OwCurrentResponse, DashboardError> {
        let params = [
            ("lat", coords.latitude.to_string()),
            ("lon", coords.longitude.to_string()),
        ];
        let (status, body) = self.get("weather", &params).await?;

        if !status.is_success() {
            return Err(DashboardError::LocationLookup(format!(
                "status {}: {}",
                status,
                truncate_body(&body)
            )));
        }

        serde_json::from_str(&body).map_err(|e| DashboardError::LocationLookup(e.to_string()))
    }

    #[instrument(skip(self))]
    async fn forecast_by_city(&self, city: &str) -> Result<OwForecastResponse, DashboardError> {
        let (status, body) = self.get("forecast", &[("q", city.to_string())]).await?;

        if !status.is_success() {
            return Err(DashboardError::NetworkOrParseFailure(format!(
                "forecast request failed with status {}: {}",
                status,
                truncate_body(&body)
            )));
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OwMain {
    pub temp: f64,
    pub feels_like: f64,
    pub humidity: u8,
    pub pressure: i32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OwWeather {
    /// Category such as `Clear`, `Clouds`, `Rain`.
    pub main: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OwWind {
    /// m/s with `units=metric`.
    pub speed: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OwSys {
    pub sunrise: i64,
    pub sunset: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OwCurrentResponse {
    pub name: String,
    pub main: OwMain,
    pub weather: Vec<OwWeather>,
    pub wind: OwWind,
    pub sys: OwSys,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OwSampleMain {
    pub temp: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OwForecastEntry {
    pub dt: i64,
    pub main: OwSampleMain,
    pub weather: Vec<OwWeather>,
    pub wind: OwWind,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OwForecastResponse {
    pub list: Vec<OwForecastEntry>,
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let cut = (0..=MAX).rev().find(|i| body.is_char_boundary(*i)).unwrap_or(0);
        format!("{}...", &body[..cut])
    } else {
        body.to_string()
    }
}
