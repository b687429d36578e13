//! Core library for the `weatherdash` terminal dashboard.
//!
//! This crate defines:
//! - The dashboard data model and the normalizer from upstream payloads
//! - The OpenWeather client and the geolocation capability
//! - The controller owning dashboard state
//! - Configuration & credentials handling
//!
//! It is used by `weatherdash-cli`, but can also be driven by other front ends.

pub mod config;
pub mod controller;
pub mod error;
pub mod geolocation;
pub mod model;
pub mod normalize;
pub mod provider;

pub use config::Config;
pub use controller::{Controller, DashboardState, Event, Theme};
pub use error::DashboardError;
pub use geolocation::{Geolocator, GeolocationError};
pub use model::{ConditionTag, Coordinates, CurrentConditions, DailyEntry, HourlyEntry, WeatherData};
pub use provider::{WeatherProvider, provider_from_config};
