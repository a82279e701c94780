use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, FetchError};

/// Offset between Kelvin and Celsius.
pub const KELVIN_OFFSET: f64 = 273.15;

pub fn kelvin_to_celsius(kelvin: f64) -> f64 {
    kelvin - KELVIN_OFFSET
}

/// Daily forecast body as returned by `/data/2.5/forecast/daily`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub city: CityInfo,
    #[serde(rename = "cod")]
    pub status_code: String,
    pub message: f64,
    #[serde(rename = "cnt")]
    pub count: u32,
    #[serde(rename = "list")]
    pub days: Vec<DailyForecast>,
}

impl ForecastResponse {
    pub fn from_slice(body: &[u8]) -> Result<Self, DecodeError> {
        Ok(serde_json::from_slice(body)?)
    }

    pub fn from_json(body: &str) -> Result<Self, DecodeError> {
        Ok(serde_json::from_str(body)?)
    }

    /// The days the grid shows: the first `max` entries at most.
    pub fn leading_days(&self, max: usize) -> &[DailyForecast] {
        &self.days[..self.days.len().min(max)]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityInfo {
    pub id: i64,
    pub name: String,
    #[serde(rename = "coord")]
    pub coordinates: Coordinates,
    pub country: String,
    pub population: i64,
    /// Shift from UTC in seconds.
    #[serde(rename = "timezone")]
    pub timezone_offset_seconds: i32,
}

impl CityInfo {
    /// Falls back to UTC when the offset is out of chrono's range.
    pub fn utc_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.timezone_offset_seconds).unwrap_or_else(|| Utc.fix())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinates {
    /// Build a pair, rejecting values outside the geographic range.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, FetchError> {
        let coords = Self { lat: latitude, lon: longitude };
        coords.validate()?;
        Ok(coords)
    }

    pub fn validate(&self) -> Result<(), FetchError> {
        let lat_ok = (-90.0..=90.0).contains(&self.lat);
        let lon_ok = (-180.0..=180.0).contains(&self.lon);
        if lat_ok && lon_ok {
            Ok(())
        } else {
            Err(FetchError::InvalidCoordinates { latitude: self.lat, longitude: self.lon })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    #[serde(rename = "dt")]
    pub timestamp: i64,
    pub sunrise: i64,
    pub sunset: i64,
    pub temp: TemperaturePeriods,
    pub feels_like: FeelsLikePeriods,
    pub pressure: u32,
    pub humidity: u8,
    #[serde(rename = "weather")]
    pub conditions: Vec<WeatherCondition>,
    #[serde(rename = "speed")]
    pub wind_speed: f64,
    #[serde(rename = "deg")]
    pub wind_degree: u16,
    #[serde(rename = "gust")]
    pub wind_gust: f64,
    #[serde(rename = "clouds")]
    pub clouds_percent: u8,
    /// Probability of precipitation, 0..=1.
    #[serde(rename = "pop")]
    pub precipitation_probability: f64,
    #[serde(rename = "rain", default, skip_serializing_if = "Option::is_none")]
    pub rain_volume: Option<f64>,
}

impl DailyForecast {
    pub fn date_time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }

    pub fn local_date_time(&self, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
        self.date_time().map(|dt| dt.with_timezone(&offset))
    }
}

/// Temperatures in Kelvin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperaturePeriods {
    pub day: f64,
    pub min: f64,
    pub max: f64,
    pub night: f64,
    #[serde(rename = "eve")]
    pub evening: f64,
    #[serde(rename = "morn")]
    pub morning: f64,
}

/// Apparent temperatures in Kelvin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeelsLikePeriods {
    pub day: f64,
    pub night: f64,
    #[serde(rename = "eve")]
    pub evening: f64,
    #[serde(rename = "morn")]
    pub morning: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherCondition {
    pub id: i64,
    pub main: String,
    pub description: String,
    pub icon: String,
}
