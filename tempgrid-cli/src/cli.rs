use anyhow::{Context, anyhow, bail};
use clap::{Parser, Subcommand};
use inquire::{CustomType, Password, PasswordDisplayMode};
use std::str::FromStr;
use tempgrid_core::{
    BorderOverrides, Config, ForecastFetcher, LoadOutcome, LocationConfig, Rgba,
    grid::{HOURS_PER_DAY, MAX_DAYS},
    provider_from_config,
};

use crate::{render, session};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "tempgrid", version, about = "Hourly temperature grid for the next 7 days")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the API key and default location.
    Configure,

    /// Fetch the forecast and draw the grid.
    Show {
        /// Latitude; defaults to the configured location.
        #[arg(long, allow_negative_numbers = true, requires = "lon")]
        lat: Option<f64>,

        /// Longitude; defaults to the configured location.
        #[arg(long, allow_negative_numbers = true, requires = "lat")]
        lon: Option<f64>,

        /// Highlight a cell border, as HOUR:DAY or HOUR:DAY:COLOR (negro|naranja).
        #[arg(long = "mark", value_name = "HOUR:DAY[:COLOR]")]
        marks: Vec<Mark>,

        /// Keep the grid open to mark cells, view details and retry.
        #[arg(short, long)]
        interactive: bool,
    },
}

/// A border override given on the command line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mark {
    pub hour: u8,
    pub day: u8,
    pub color: Rgba,
}

impl FromStr for Mark {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':');
        let (Some(hour), Some(day)) = (parts.next(), parts.next()) else {
            return Err(format!("expected HOUR:DAY, got '{s}'"));
        };

        let hour: u8 = hour.trim().parse().map_err(|_| format!("invalid hour '{hour}'"))?;
        let day: u8 = day.trim().parse().map_err(|_| format!("invalid day '{day}'"))?;

        if hour >= HOURS_PER_DAY {
            return Err(format!("hour must be 0-23, got {hour}"));
        }
        if day as usize >= MAX_DAYS {
            return Err(format!("day must be 0-6, got {day}"));
        }

        let color = match parts.next() {
            None => Rgba::BLACK,
            Some(name) => parse_color(name)?,
        };

        if parts.next().is_some() {
            return Err(format!("too many fields in '{s}'"));
        }

        Ok(Mark { hour, day, color })
    }
}

pub fn parse_color(name: &str) -> Result<Rgba, String> {
    match name.trim().to_lowercase().as_str() {
        "negro" | "black" => Ok(Rgba::BLACK),
        "naranja" | "orange" => Ok(Rgba::ORANGE),
        other => Err(format!("unknown color '{other}'; use negro or naranja")),
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { lat, lon, marks, interactive } => {
                show(lat.zip(lon), marks, interactive).await
            }
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    config.set_api_key(api_key.trim().to_string());

    let current = config.location();
    let latitude = CustomType::<f64>::new("Latitude:")
        .with_default(current.latitude)
        .with_error_message("Please type a number")
        .prompt()?;
    let longitude = CustomType::<f64>::new("Longitude:")
        .with_default(current.longitude)
        .with_error_message("Please type a number")
        .prompt()?;
    config.set_location(latitude, longitude).map_err(|e| anyhow!(e.user_message()))?;

    let path = config.save()?;
    println!("Configuration saved to {}", path.display());
    Ok(())
}

async fn show(
    location: Option<(f64, f64)>,
    marks: Vec<Mark>,
    interactive: bool,
) -> anyhow::Result<()> {
    let config = Config::load()?;

    let location = location
        .map(|(latitude, longitude)| LocationConfig { latitude, longitude })
        .unwrap_or_else(|| config.location());
    let coords = location.coordinates().map_err(|e| anyhow!(e.user_message()))?;

    let provider = provider_from_config(&config).map_err(|e| anyhow!(e.user_message()))?;
    let fetcher = ForecastFetcher::new(provider);
    let palette = config.palette();

    let mut overrides = BorderOverrides::new();
    for mark in marks {
        overrides.set(mark.hour, mark.day, mark.color);
    }

    if interactive {
        return session::run(&fetcher, coords, &palette, overrides).await;
    }

    match fetcher.load(coords).await {
        LoadOutcome::Loaded(forecast) => {
            print!("{}", render::screen(&forecast, &palette, &overrides));
            Ok(())
        }
        LoadOutcome::Failed(err) => {
            eprint!("{}", render::error_panel(&err));
            bail!("{}", err)
        }
        LoadOutcome::AlreadyInFlight => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_show_with_negative_longitude_and_marks() {
        let cli = Cli::try_parse_from([
            "tempgrid", "show", "--lat", "25.6866", "--lon", "-100.3161", "--mark", "5:2:naranja",
            "--mark", "0:0",
        ])
        .unwrap();

        let Command::Show { lat, lon, marks, interactive } = cli.command else {
            panic!("expected show");
        };
        assert_eq!(lat, Some(25.6866));
        assert_eq!(lon, Some(-100.3161));
        assert!(!interactive);
        assert_eq!(marks[0], Mark { hour: 5, day: 2, color: Rgba::ORANGE });
        assert_eq!(marks[1].color, Rgba::BLACK);
    }

    #[test]
    fn lat_requires_lon() {
        assert!(Cli::try_parse_from(["tempgrid", "show", "--lat", "10"]).is_err());
    }

    #[test]
    fn mark_rejects_out_of_grid_cells() {
        assert!("24:0".parse::<Mark>().unwrap_err().contains("0-23"));
        assert!("3:7".parse::<Mark>().unwrap_err().contains("0-6"));
        assert!("3".parse::<Mark>().is_err());
        assert!("3:1:purple".parse::<Mark>().unwrap_err().contains("unknown color"));
        assert!("3:1:negro:extra".parse::<Mark>().is_err());
    }
}
