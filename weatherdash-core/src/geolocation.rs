//! One-shot position lookup for the "current location" trigger.

use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::Coordinates;

pub const DEFAULT_GEOIP_URL: &str = "https://ipinfo.io/json";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeolocationError {
    #[error("location request failed: {0}")]
    Unavailable(String),
    #[error("location response was not understood: {0}")]
    Malformed(String),
}

/// Produces exactly one position or one failure per call.
#[async_trait]
pub trait Geolocator: Send + Sync + Debug {
    async fn locate(&self) -> Result<Coordinates, GeolocationError>;
}

/// Always answers with a configured position.
#[derive(Debug, Clone, Copy)]
pub struct FixedGeolocator {
    coords: Coordinates,
}

impl FixedGeolocator {
    pub fn new(coords: Coordinates) -> Self {
        Self { coords }
    }
}

#[async_trait]
impl Geolocator for FixedGeolocator {
    async fn locate(&self) -> Result<Coordinates, GeolocationError> {
        Ok(self.coords)
    }
}

/// Approximate position from the public IP address.
#[derive(Debug, Clone)]
pub struct IpGeolocator {
    url: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct GeoIpResponse {
    /// `"latitude,longitude"`
    loc: String,
}

impl IpGeolocator {
    pub fn new(url: String, timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { url, http })
    }
}

#[async_trait]
impl Geolocator for IpGeolocator {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn locate(&self) -> Result<Coordinates, GeolocationError> {
        let res = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| GeolocationError::Unavailable(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            return Err(GeolocationError::Unavailable(format!("status {status}")));
        }

        let body: GeoIpResponse =
            res.json().await.map_err(|e| GeolocationError::Malformed(e.to_string()))?;

        let coords = parse_loc(&body.loc)
            .ok_or_else(|| GeolocationError::Malformed(format!("bad loc field '{}'", body.loc)))?;
        debug!(?coords, "resolved position from IP");
        Ok(coords)
    }
}

fn parse_loc(loc: &str) -> Option<Coordinates> {
    let (lat, lon) = loc.split_once(',')?;
    let latitude: f64 = lat.trim().parse().ok()?;
    let longitude: f64 = lon.trim().parse().ok()?;

    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return None;
    }

    Some(Coordinates {
        latitude,
        longitude,
    })
}
