use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::{
    error::FetchError,
    grid::{TemperaturePalette, TemperatureRange},
    model::Coordinates,
    provider::openweather::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT},
};

/// Environment variable that takes precedence over the stored API key.
pub const API_KEY_ENV: &str = "TEMPGRID_API_KEY";

/// Monterrey, Nuevo León.
pub const DEFAULT_LOCATION: LocationConfig =
    LocationConfig { latitude: 25.6866, longitude: -100.3161 };

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationConfig {
    pub latitude: f64,
    pub longitude: f64,
}

impl LocationConfig {
    pub fn coordinates(&self) -> Result<Coordinates, FetchError> {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// timeout_secs = 10
///
/// [location]
/// latitude = 25.6866
/// longitude = -100.3161
///
/// [[temperature_ranges]]
/// lower_c = -10.0
/// upper_c = 5.0
/// label = "Muy Frío"
/// color = { r = 0.7, g = 0.85, b = 1.0 }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_key: Option<String>,

    /// Base URL of the forecast API, without the path.
    pub endpoint: Option<String>,

    pub timeout_secs: Option<u64>,

    pub location: Option<LocationConfig>,

    /// Ordered; the first range containing a temperature colors the cell.
    pub temperature_ranges: Option<Vec<TemperatureRange>>,
}

impl Config {
    /// API key from the environment, falling back to the config file.
    pub fn resolved_api_key(&self) -> Result<String, FetchError> {
        let from_env = std::env::var(API_KEY_ENV).ok();
        self.api_key_with_env(from_env)
    }

    pub(crate) fn api_key_with_env(&self, from_env: Option<String>) -> Result<String, FetchError> {
        from_env
            .into_iter()
            .chain(self.api_key.clone())
            .map(|key| key.trim().to_string())
            .find(|key| !key.is_empty())
            .ok_or(FetchError::MissingApiKey)
    }

    pub fn location(&self) -> LocationConfig {
        self.location.unwrap_or(DEFAULT_LOCATION)
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout_secs.map(Duration::from_secs).unwrap_or(DEFAULT_TIMEOUT)
    }

    pub fn palette(&self) -> TemperaturePalette {
        match &self.temperature_ranges {
            Some(ranges) if !ranges.is_empty() => TemperaturePalette::new(ranges.clone()),
            _ => TemperaturePalette::default(),
        }
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    pub fn set_location(&mut self, latitude: f64, longitude: f64) -> Result<(), FetchError> {
        Coordinates::new(latitude, longitude)?;
        self.location = Some(LocationConfig { latitude, longitude });
        Ok(())
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
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
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
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
        let dirs = ProjectDirs::from("dev", "tempgrid", "tempgrid")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Rgba;

    #[test]
    fn api_key_missing_everywhere() {
        let cfg = Config::default();
        let err = cfg.api_key_with_env(None).unwrap_err();
        assert!(matches!(err, FetchError::MissingApiKey));
    }

    #[test]
    fn env_key_takes_precedence_over_file() {
        let mut cfg = Config::default();
        cfg.set_api_key("FILE_KEY".into());

        assert_eq!(cfg.api_key_with_env(Some("ENV_KEY".into())).unwrap(), "ENV_KEY");
        assert_eq!(cfg.api_key_with_env(None).unwrap(), "FILE_KEY");
    }

    #[test]
    fn blank_env_key_falls_back_to_file() {
        let mut cfg = Config::default();
        cfg.set_api_key("FILE_KEY".into());

        assert_eq!(cfg.api_key_with_env(Some("  ".into())).unwrap(), "FILE_KEY");
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = Config::default();

        assert_eq!(cfg.location(), DEFAULT_LOCATION);
        assert_eq!(cfg.endpoint(), DEFAULT_BASE_URL);
        assert_eq!(cfg.timeout(), DEFAULT_TIMEOUT);
        assert_eq!(cfg.palette(), TemperaturePalette::default());
    }

    #[test]
    fn set_location_rejects_invalid_coordinates() {
        let mut cfg = Config::default();

        assert!(cfg.set_location(95.0, 0.0).is_err());
        assert_eq!(cfg.location, None);

        cfg.set_location(19.43, -99.13).unwrap();
        assert_eq!(cfg.location().latitude, 19.43);
    }

    #[test]
    fn custom_ranges_replace_default_palette() {
        let src = r#"
            api_key = "abc"
            timeout_secs = 3

            [location]
            latitude = 40.4
            longitude = -3.7

            [[temperature_ranges]]
            lower_c = 0.0
            upper_c = 20.0
            label = "Fresco"
            color = { r = 0.2, g = 0.4, b = 0.9, a = 0.8 }
        "#;
        let cfg: Config = toml::from_str(src).unwrap();

        assert_eq!(cfg.timeout(), Duration::from_secs(3));
        assert_eq!(cfg.location().longitude, -3.7);

        let palette = cfg.palette();
        assert_eq!(palette.ranges().len(), 1);
        let matched = palette.color_for(10.0);
        assert_eq!(matched.label, Some("Fresco"));
        assert_eq!(matched.color, Rgba { r: 0.2, g: 0.4, b: 0.9, a: 0.8 });
    }

    #[test]
    fn save_then_load_from_temp_dir() {
        let dir = std::env::temp_dir().join(format!("tempgrid-config-{}", std::process::id()));
        let path = dir.join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.set_api_key("SAVED".into());
        cfg.set_location(25.0, -100.0).unwrap();
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api_key.as_deref(), Some("SAVED"));
        assert_eq!(loaded.location(), LocationConfig { latitude: 25.0, longitude: -100.0 });

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_file_loads_default() {
        let path = std::env::temp_dir().join("tempgrid-does-not-exist").join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert!(cfg.api_key.is_none());
    }
}
