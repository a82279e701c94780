//! Error types for fetching forecasts and projecting the grid.

use thiserror::Error;

/// The forecast body could not be decoded into [`crate::ForecastResponse`].
#[derive(Debug, Error)]
#[error("malformed forecast payload: {0}")]
pub struct DecodeError(#[from] pub serde_json::Error);

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid coordinates: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    #[error("no API key configured")]
    MissingApiKey,

    /// The request URL carries the API key, so it is stripped on conversion.
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("forecast request failed with status {0}")]
    HttpStatus(u16),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.without_url())
    }
}

impl FetchError {
    /// Message for the retry panel. Transport and decode failures read
    /// differently so "no network" is not confused with an API change.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidCoordinates { latitude, longitude } => format!(
                "La ubicación ({latitude}, {longitude}) no es válida. \
                 Latitud debe estar entre -90 y 90, longitud entre -180 y 180."
            ),
            Self::MissingApiKey => "No hay clave de API configurada.\n\
                 Hint: run `tempgrid configure` or set TEMPGRID_API_KEY."
                .to_string(),
            Self::Transport(_) => {
                "No se pudo conectar con el servicio del clima. Revisa tu conexión.".to_string()
            }
            Self::HttpStatus(401) => "El servicio rechazó la clave de API (401).".to_string(),
            Self::HttpStatus(code) => {
                format!("El servicio del clima respondió con un error ({code}).")
            }
            Self::Decode(_) => {
                "El servicio devolvió datos con un formato inesperado.".to_string()
            }
        }
    }

    /// Whether trying again without changing anything can plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::HttpStatus(code) => *code == 429 || (500..600).contains(code),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("hour {0} is outside 0..=23")]
    InvalidHour(u8),
}
