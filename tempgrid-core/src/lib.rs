//! Core library for the `tempgrid` CLI.
//!
//! This crate defines:
//! - The daily forecast model and its decoding
//! - A forecast provider abstraction and the OpenWeather implementation
//! - Loading state published to observers
//! - Projection of a forecast onto a colored hour × day grid
//! - Configuration & credentials handling
//!
//! It is used by `tempgrid-cli`, but can also be reused by other front-ends.

pub mod config;
pub mod error;
pub mod fetcher;
pub mod grid;
pub mod model;
pub mod provider;

pub use config::{Config, LocationConfig};
pub use error::{DecodeError, FetchError, GridError};
pub use fetcher::{FetchEvent, FetchState, ForecastFetcher, LoadOutcome};
pub use grid::{
    BorderOverrides, BorderStyle, CellKey, DayDetails, DayPeriod, ForecastGrid, Rgba,
    TemperaturePalette, TemperatureRange, project, set_border, temperature_for_cell,
};
pub use model::{Coordinates, DailyForecast, ForecastResponse, kelvin_to_celsius};
pub use provider::{ForecastProvider, OpenWeatherProvider, provider_from_config};
