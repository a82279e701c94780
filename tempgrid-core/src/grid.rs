//! Projection of a daily forecast onto a 24 hour × 7 day temperature grid.
//!
//! Rows are hours of the day (0..=23), columns are the first seven forecast
//! days. Each cell gets a Celsius value, a fill color from the
//! [`TemperaturePalette`], and a border that is either the thin default or a
//! user-picked [`BorderOverrides`] entry.

use std::collections::HashMap;

use chrono::{Datelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::{
    error::GridError,
    model::{DailyForecast, ForecastResponse, kelvin_to_celsius},
};

pub const HOURS_PER_DAY: u8 = 24;
pub const MAX_DAYS: usize = 7;

/// Rounded temperatures are printed only on every Nth hour row.
pub const LABEL_EVERY_HOURS: u8 = 4;

/// Color with 0..=1 channels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    #[serde(default = "opaque")]
    pub a: f32,
}

fn opaque() -> f32 {
    1.0
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::rgb(0.0, 0.0, 0.0);
    pub const ORANGE: Rgba = Rgba::rgb(1.0, 0.584, 0.0);
    pub const GRAY: Rgba = Rgba::rgb(0.557, 0.557, 0.576);

    /// Fill for temperatures no range covers.
    pub const FALLBACK: Rgba = Rgba::GRAY.with_alpha(0.3);
    /// Border for cells without an override.
    pub const DEFAULT_BORDER: Rgba = Rgba::GRAY.with_alpha(0.2);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Composite over a white background into 8-bit channels.
    pub fn over_white(&self) -> (u8, u8, u8) {
        let mix = |c: f32| {
            let v = c * self.a + (1.0 - self.a);
            (v.clamp(0.0, 1.0) * 255.0).round() as u8
        };
        (mix(self.r), mix(self.g), mix(self.b))
    }
}

/// Inclusive Celsius band with its display color and legend label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureRange {
    pub lower_c: f64,
    pub upper_c: f64,
    pub color: Rgba,
    pub label: String,
}

impl TemperatureRange {
    pub fn new(lower_c: f64, upper_c: f64, color: Rgba, label: impl Into<String>) -> Self {
        Self { lower_c, upper_c, color, label: label.into() }
    }

    pub fn contains(&self, celsius: f64) -> bool {
        (self.lower_c..=self.upper_c).contains(&celsius)
    }

    /// Legend caption, e.g. `15° a 25°`.
    pub fn caption(&self) -> String {
        format!("{}° a {}°", self.lower_c as i64, self.upper_c as i64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorMatch<'a> {
    pub color: Rgba,
    pub label: Option<&'a str>,
}

/// Ordered list of ranges. Ranges may overlap; the first listed match wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemperaturePalette {
    ranges: Vec<TemperatureRange>,
}

impl Default for TemperaturePalette {
    fn default() -> Self {
        Self::new(vec![
            TemperatureRange::new(-10.0, 5.0, Rgba::rgb(0.7, 0.85, 1.0), "Muy Frío"),
            TemperatureRange::new(5.0, 15.0, Rgba::rgb(0.8, 0.9, 0.95), "Frío"),
            TemperatureRange::new(15.0, 25.0, Rgba::rgb(0.9, 0.95, 0.8), "Templado"),
            TemperatureRange::new(25.0, 30.0, Rgba::rgb(1.0, 0.9, 0.7), "Cálido"),
            TemperatureRange::new(30.0, 40.0, Rgba::rgb(1.0, 0.8, 0.7), "Caliente"),
        ])
    }
}

impl TemperaturePalette {
    pub fn new(ranges: Vec<TemperatureRange>) -> Self {
        Self { ranges }
    }

    pub fn ranges(&self) -> &[TemperatureRange] {
        &self.ranges
    }

    pub fn color_for(&self, celsius: f64) -> ColorMatch<'_> {
        self.ranges
            .iter()
            .find(|range| range.contains(celsius))
            .map(|range| ColorMatch { color: range.color, label: Some(range.label.as_str()) })
            .unwrap_or(ColorMatch { color: Rgba::FALLBACK, label: None })
    }
}

/// Part of the day whose forecast value fills an hour row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DayPeriod {
    Morning,
    Day,
    Night,
}

impl DayPeriod {
    pub const ALL: [DayPeriod; 3] = [DayPeriod::Morning, DayPeriod::Day, DayPeriod::Night];

    pub fn from_hour(hour: u8) -> Result<Self, GridError> {
        match hour {
            4..=11 => Ok(Self::Morning),
            12..=19 => Ok(Self::Day),
            20..=23 | 0..=3 => Ok(Self::Night),
            _ => Err(GridError::InvalidHour(hour)),
        }
    }

    pub fn kelvin(&self, day: &DailyForecast) -> f64 {
        match self {
            Self::Morning => day.temp.morning,
            Self::Day => day.temp.day,
            Self::Night => day.temp.night,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Morning => "Mañana: 4:00-11:00",
            Self::Day => "Tarde: 12:00-19:00",
            Self::Night => "Noche: 20:00-3:00",
        }
    }
}

pub fn temperature_for_cell(day: &DailyForecast, hour: u8) -> Result<f64, GridError> {
    let period = DayPeriod::from_hour(hour)?;
    Ok(kelvin_to_celsius(period.kelvin(day)))
}

/// Grid coordinate: `row` is the hour, `column` the day index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    pub row: u8,
    pub column: u8,
}

impl CellKey {
    pub fn new(row: u8, column: u8) -> Self {
        Self { row, column }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BorderStyle {
    pub color: Rgba,
    pub width: f32,
}

impl BorderStyle {
    pub const BOLD_WIDTH: f32 = 2.0;
    pub const THIN_WIDTH: f32 = 0.5;

    pub const DEFAULT: BorderStyle =
        BorderStyle { color: Rgba::DEFAULT_BORDER, width: Self::THIN_WIDTH };

    pub fn is_override(&self) -> bool {
        self.width == Self::BOLD_WIDTH
    }
}

/// User-picked border colors for the lifetime of one screen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BorderOverrides {
    cells: HashMap<CellKey, Rgba>,
}

impl BorderOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last write wins. Callers keep `row < 24` and `column < 7`.
    pub fn set(&mut self, row: u8, column: u8, color: Rgba) {
        debug_assert!(row < HOURS_PER_DAY, "row {row} out of range");
        debug_assert!((column as usize) < MAX_DAYS, "column {column} out of range");
        self.cells.insert(CellKey::new(row, column), color);
    }

    pub fn border_for(&self, row: u8, column: u8) -> BorderStyle {
        match self.cells.get(&CellKey::new(row, column)) {
            Some(&color) => BorderStyle { color, width: BorderStyle::BOLD_WIDTH },
            None => BorderStyle::DEFAULT,
        }
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }
}

/// Functional form of [`BorderOverrides::set`].
pub fn set_border(
    row: u8,
    column: u8,
    color: Rgba,
    mut overrides: BorderOverrides,
) -> BorderOverrides {
    overrides.set(row, column, color);
    overrides
}

const WEEKDAY_SHORT: [&str; 7] = ["Dom", "Lun", "Mar", "Mié", "Jue", "Vie", "Sáb"];

/// Day names for the cell picker, Sunday first.
pub const WEEKDAY_NAMES: [&str; 7] =
    ["Domingo", "Lunes", "Martes", "Miércoles", "Jueves", "Viernes", "Sábado"];

pub fn weekday_short(weekday: Weekday) -> &'static str {
    WEEKDAY_SHORT[weekday.num_days_from_sunday() as usize]
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    WEEKDAY_NAMES[weekday.num_days_from_sunday() as usize]
}

pub fn hour_label(hour: u8) -> String {
    format!("{hour:02}:00")
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayHeader {
    /// Abbreviated weekday in the city's local time, e.g. `Dom`.
    pub weekday: &'static str,
    /// Full weekday name, e.g. `Domingo`.
    pub weekday_name: &'static str,
    /// `d/M`, e.g. `2/6`.
    pub date: String,
}

impl DayHeader {
    fn for_day(day: &DailyForecast, forecast: &ForecastResponse) -> Self {
        match day.local_date_time(forecast.city.utc_offset()) {
            Some(local) => Self {
                weekday: weekday_short(local.weekday()),
                weekday_name: weekday_name(local.weekday()),
                date: format!("{}/{}", local.day(), local.month()),
            },
            None => Self { weekday: "?", weekday_name: "?", date: String::from("?") },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridCell {
    pub row: u8,
    pub column: u8,
    pub temperature_c: f64,
    pub fill: Rgba,
    pub label: Option<String>,
    pub border: BorderStyle,
    pub show_value: bool,
}

impl GridCell {
    pub fn rounded(&self) -> i64 {
        self.temperature_c.round() as i64
    }
}

/// Render parameters for one screen's worth of forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastGrid {
    pub city: String,
    pub country: String,
    pub columns: Vec<DayHeader>,
    /// `rows[hour][day]`.
    pub rows: Vec<Vec<GridCell>>,
}

impl ForecastGrid {
    pub fn cell(&self, row: u8, column: u8) -> Option<&GridCell> {
        self.rows.get(row as usize)?.get(column as usize)
    }

    pub fn day_count(&self) -> usize {
        self.columns.len()
    }
}

pub fn project(
    forecast: &ForecastResponse,
    palette: &TemperaturePalette,
    overrides: &BorderOverrides,
) -> ForecastGrid {
    let days = forecast.leading_days(MAX_DAYS);

    let columns = days.iter().map(|day| DayHeader::for_day(day, forecast)).collect();

    let rows = (0..HOURS_PER_DAY)
        .filter_map(|hour| DayPeriod::from_hour(hour).ok().map(|period| (hour, period)))
        .map(|(hour, period)| {
            days.iter()
                .enumerate()
                .map(|(column, day)| {
                    let column = column as u8;
                    let temperature_c = kelvin_to_celsius(period.kelvin(day));
                    let matched = palette.color_for(temperature_c);
                    GridCell {
                        row: hour,
                        column,
                        temperature_c,
                        fill: matched.color,
                        label: matched.label.map(str::to_owned),
                        border: overrides.border_for(hour, column),
                        show_value: hour % LABEL_EVERY_HOURS == 0,
                    }
                })
                .collect()
        })
        .collect();

    ForecastGrid {
        city: forecast.city.name.clone(),
        country: forecast.city.country.clone(),
        columns,
        rows,
    }
}

/// Summary shown after a cell is marked.
#[derive(Debug, Clone, PartialEq)]
pub struct DayDetails {
    pub average_c: f64,
    pub min_c: f64,
    pub max_c: f64,
    pub feels_like_c: f64,
    pub humidity_pct: u8,
    pub precipitation_pct: u8,
    pub wind_speed: f64,
    pub rain_volume: Option<f64>,
    pub description: Option<String>,
}

impl DayDetails {
    pub fn from_forecast(day: &DailyForecast) -> Self {
        let periods = DayPeriod::ALL.map(|p| kelvin_to_celsius(p.kelvin(day)));
        let average_c = periods.iter().sum::<f64>() / periods.len() as f64;

        Self {
            average_c,
            min_c: kelvin_to_celsius(day.temp.min),
            max_c: kelvin_to_celsius(day.temp.max),
            feels_like_c: kelvin_to_celsius(day.feels_like.day),
            humidity_pct: day.humidity,
            precipitation_pct: (day.precipitation_probability.clamp(0.0, 1.0) * 100.0).round()
                as u8,
            wind_speed: day.wind_speed,
            rain_volume: day.rain_volume,
            description: day.conditions.first().map(|c| c.description.clone()),
        }
    }
}
