use crate::{
    Config, Coordinates, DashboardError,
    provider::openweather::{OpenWeatherProvider, OwCurrentResponse, OwForecastResponse},
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod openweather;

/// The upstream weather API, already decoded into typed payloads.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Current conditions for a city name. A non-success status is `NotFound`.
    async fn current_by_city(&self, city: &str) -> Result<OwCurrentResponse, DashboardError>;

    /// Current conditions for a position; only the `name` is used afterwards.
    async fn current_by_coords(
        &self,
        coords: Coordinates,
    ) -> Result<OwCurrentResponse, DashboardError>;

    /// Forecast sample list for a city name.
    async fn forecast_by_city(&self, city: &str) -> Result<OwForecastResponse, DashboardError>;
}

/// Construct the OpenWeather provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let api_key = config.resolved_api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured.\n\
             Hint: run `weatherdash configure` or set the WEATHER_API_KEY environment variable."
        )
    })?;

    let provider = OpenWeatherProvider::with_base_url(
        api_key,
        config.base_url.clone(),
        std::time::Duration::from_secs(config.timeout_secs),
    )?;

    Ok(Arc::new(provider))
}
