use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}, sync::Arc, time::Duration};

use crate::{
    Coordinates, Theme,
    geolocation::{DEFAULT_GEOIP_URL, FixedGeolocator, Geolocator, IpGeolocator},
    provider::openweather::DEFAULT_BASE_URL,
};

/// Environment variable that overrides the stored API key.
pub const API_KEY_ENV: &str = "WEATHER_API_KEY";

/// How the "current location" trigger finds a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LocationSource {
    /// IP lookup, or the fixed position when one is configured.
    #[default]
    Auto,
    /// Only the fixed position; without one the capability is absent.
    Fixed,
    /// No geolocation at all.
    Disabled,
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// default_city = "Athens"
/// theme = "dark"
///
/// [location]
/// latitude = 37.98
/// longitude = 23.72
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
    pub default_city: Option<String>,
    pub theme: Theme,
    pub location_source: LocationSource,
    pub geoip_url: String,
    /// Kept last: TOML tables must follow plain keys.
    pub location: Option<Coordinates>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 10,
            default_city: None,
            theme: Theme::default(),
            location_source: LocationSource::default(),
            geoip_url: DEFAULT_GEOIP_URL.to_string(),
            location: None,
        }
    }
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weatherdash", "weatherdash")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    /// API key from the environment, falling back to the stored one.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key_with_env(std::env::var(API_KEY_ENV).ok())
    }

    fn api_key_with_env(&self, env: Option<String>) -> Option<String> {
        env.filter(|k| !k.trim().is_empty())
            .or_else(|| self.api_key.clone().filter(|k| !k.trim().is_empty()))
    }

    /// The geolocation capability, or `None` when it is unavailable.
    pub fn geolocator(&self) -> Result<Option<Arc<dyn Geolocator>>> {
        let geolocator: Option<Arc<dyn Geolocator>> = match (self.location_source, self.location) {
            (LocationSource::Disabled, _) => None,
            (_, Some(coords)) => Some(Arc::new(FixedGeolocator::new(coords))),
            (LocationSource::Fixed, None) => None,
            (LocationSource::Auto, None) => Some(Arc::new(IpGeolocator::new(
                self.geoip_url.clone(),
                Duration::from_secs(self.timeout_secs),
            )?)),
        };

        Ok(geolocator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("weatherdash-test-{}-{}", std::process::id(), name))
            .join("config.toml")
    }

    #[test]
    fn env_key_overrides_stored_key() {
        let mut cfg = Config::default();
        assert_eq!(cfg.api_key_with_env(None), None);

        cfg.set_api_key("STORED".into());
        assert_eq!(cfg.api_key_with_env(None).as_deref(), Some("STORED"));
        assert_eq!(cfg.api_key_with_env(Some("ENV".into())).as_deref(), Some("ENV"));
        assert_eq!(cfg.api_key_with_env(Some("  ".into())).as_deref(), Some("STORED"));
    }

    #[test]
    fn save_and_load_roundtrip() {
        let path = temp_path("roundtrip");
        let mut cfg = Config::default();
        cfg.set_api_key("KEY".into());
        cfg.default_city = Some("Athens".into());
        cfg.theme = Theme::Light;
        cfg.location = Some(Coordinates {
            latitude: 37.98,
            longitude: 23.72,
        });

        cfg.save_to(&path).expect("save must succeed");
        let loaded = Config::load_from(&path).expect("load must succeed");

        assert_eq!(loaded.api_key.as_deref(), Some("KEY"));
        assert_eq!(loaded.default_city.as_deref(), Some("Athens"));
        assert_eq!(loaded.theme, Theme::Light);
        assert_eq!(loaded.location, cfg.location);

        if let Some(dir) = path.parent() {
            let _ = fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn missing_file_yields_defaults() {
        let cfg = Config::load_from(&temp_path("missing")).expect("defaults");
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.theme, Theme::Dark);
        assert!(cfg.api_key.is_none());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let cfg: Config = toml::from_str("default_city = \"Paris\"").expect("valid toml");
        assert_eq!(cfg.default_city.as_deref(), Some("Paris"));
        assert_eq!(cfg.timeout_secs, 10);
        assert_eq!(cfg.location_source, LocationSource::Auto);
    }

    #[test]
    fn geolocator_follows_location_source() {
        let mut cfg = Config::default();
        assert!(cfg.geolocator().expect("client builds").is_some());

        cfg.location_source = LocationSource::Fixed;
        assert!(cfg.geolocator().expect("client builds").is_none());

        cfg.location = Some(Coordinates {
            latitude: 1.0,
            longitude: 2.0,
        });
        assert!(cfg.geolocator().expect("client builds").is_some());

        cfg.location_source = LocationSource::Disabled;
        assert!(cfg.geolocator().expect("client builds").is_none());
    }
}
