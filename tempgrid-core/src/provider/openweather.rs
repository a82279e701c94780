use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::{
    error::FetchError,
    model::{Coordinates, ForecastResponse},
};

use super::{FORECAST_DAYS, ForecastProvider};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const DAILY_FORECAST_PATH: &str = "/data/2.5/forecast/daily";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

#[derive(Debug, Clone)]
pub struct OpenWeatherProviderBuilder {
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl OpenWeatherProviderBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<OpenWeatherProvider, FetchError> {
        let http = Client::builder().timeout(self.timeout).build()?;

        Ok(OpenWeatherProvider {
            api_key: self.api_key,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }
}

impl OpenWeatherProvider {
    pub fn builder(api_key: impl Into<String>) -> OpenWeatherProviderBuilder {
        OpenWeatherProviderBuilder {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn new(api_key: impl Into<String>) -> Result<Self, FetchError> {
        Self::builder(api_key).build()
    }

    fn daily_url(&self) -> String {
        format!("{}{}", self.base_url, DAILY_FORECAST_PATH)
    }
}

#[async_trait]
impl ForecastProvider for OpenWeatherProvider {
    #[instrument(skip(self), level = "debug")]
    async fn fetch_daily(&self, coords: Coordinates) -> Result<ForecastResponse, FetchError> {
        coords.validate()?;

        let url = self.daily_url();
        debug!(%url, "requesting daily forecast");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("lat", coords.lat.to_string()),
                ("lon", coords.lon.to_string()),
                ("cnt", FORECAST_DAYS.to_string()),
                ("appid", self.api_key.clone()),
            ])
            .send()
            .await?;

        let status = res.status();

        if status != StatusCode::OK {
            let body = res.text().await.unwrap_or_default();
            warn!(
                status = status.as_u16(),
                body = %truncate_body(&body),
                "daily forecast request rejected"
            );
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let body = res.bytes().await?;

        let forecast = ForecastResponse::from_slice(&body).inspect_err(|err| {
            warn!(error = %err, body = %truncate_body(&String::from_utf8_lossy(&body)), "undecodable forecast body");
        })?;

        debug!(
            city = %forecast.city.name,
            days = forecast.days.len(),
            "decoded daily forecast"
        );

        Ok(forecast)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
