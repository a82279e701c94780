use crate::{Config, FetchError, model::Coordinates, model::ForecastResponse};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

pub use openweather::OpenWeatherProvider;

/// Number of days requested from the daily forecast endpoint.
pub const FORECAST_DAYS: u8 = 16;

#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    /// Fetch and decode the daily forecast for `coords`.
    async fn fetch_daily(&self, coords: Coordinates) -> Result<ForecastResponse, FetchError>;
}

/// Construct the forecast provider from config and the resolved API key.
pub fn provider_from_config(config: &Config) -> Result<Box<dyn ForecastProvider>, FetchError> {
    provider_with_key(config, config.resolved_api_key()?)
}

fn provider_with_key(
    config: &Config,
    api_key: String,
) -> Result<Box<dyn ForecastProvider>, FetchError> {
    let provider = OpenWeatherProvider::builder(api_key)
        .base_url(config.endpoint())
        .timeout(config.timeout())
        .build()?;

    Ok(Box::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_from_config_errors_when_missing_api_key() {
        let cfg = Config::default();
        let err = cfg
            .api_key_with_env(None)
            .and_then(|key| provider_with_key(&cfg, key))
            .unwrap_err();
        assert!(matches!(err, FetchError::MissingApiKey));
    }

    #[test]
    fn provider_from_config_works_when_configured() {
        let mut cfg = Config::default();
        cfg.api_key = Some("KEY".to_string());

        let provider = cfg.api_key_with_env(None).and_then(|key| provider_with_key(&cfg, key));
        assert!(provider.is_ok());
    }
}
