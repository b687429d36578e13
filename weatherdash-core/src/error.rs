use thiserror::Error;

/// Failures surfaced by the dashboard triggers.
///
/// The `Display` text of each variant is the message shown to the user; the
/// attached detail only goes to the log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DashboardError {
    /// Upstream returned a non-success status for a city lookup.
    #[error("City not found")]
    NotFound { city: String },

    #[error("Geolocation is not supported on this system")]
    GeolocationUnsupported,

    /// The platform declined or failed to produce a position.
    #[error("Unable to retrieve your location")]
    GeolocationDenied(String),

    /// Coordinates were obtained but could not be resolved to a place.
    #[error("Failed to get weather for current location")]
    LocationLookup(String),

    #[error("Failed to fetch weather data")]
    NetworkOrParseFailure(String),
}

impl DashboardError {
    /// Log-friendly detail, including the cause when there is one.
    pub fn detail(&self) -> String {
        match self {
            DashboardError::NotFound { city } => format!("{self}: {city}"),
            DashboardError::GeolocationUnsupported => self.to_string(),
            DashboardError::GeolocationDenied(reason)
            | DashboardError::LocationLookup(reason)
            | DashboardError::NetworkOrParseFailure(reason) => format!("{self}: {reason}"),
        }
    }
}

impl From<reqwest::Error> for DashboardError {
    fn from(err: reqwest::Error) -> Self {
        DashboardError::NetworkOrParseFailure(err.to_string())
    }
}

impl From<serde_json::Error> for DashboardError {
    fn from(err: serde_json::Error) -> Self {
        DashboardError::NetworkOrParseFailure(err.to_string())
    }
}
