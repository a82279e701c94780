//! Interactive screen: grid plus a menu to mark cells, view details and retry.

use inquire::{InquireError, Select};
use std::fmt;
use tempgrid_core::{
    BorderOverrides, Coordinates, DayDetails, FetchState, ForecastFetcher, ForecastResponse,
    LoadOutcome, Rgba, TemperaturePalette,
    grid::{ForecastGrid, HOURS_PER_DAY, MAX_DAYS, hour_label, project},
};
use tracing::debug;

use crate::render;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MarkCell,
    ShowDetails,
    ClearMarks,
    Retry,
    Quit,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::MarkCell => "Seleccionar celda",
            Action::ShowDetails => "Ver detalles del día",
            Action::ClearMarks => "Limpiar",
            Action::Retry => "Reintentar",
            Action::Quit => "Salir",
        })
    }
}

/// Menu entries that make sense for the current state.
pub fn actions_for(state: &FetchState, overrides: &BorderOverrides) -> Vec<Action> {
    let mut actions = Vec::new();
    if state.forecast().is_some() {
        actions.push(Action::MarkCell);
        actions.push(Action::ShowDetails);
        if !overrides.is_empty() {
            actions.push(Action::ClearMarks);
        }
    }
    if !state.is_loading() {
        actions.push(Action::Retry);
    }
    actions.push(Action::Quit);
    actions
}

#[derive(Debug, Clone, Copy)]
struct ColorChoice(&'static str, Rgba);

impl fmt::Display for ColorChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

const COLORS: [ColorChoice; 2] =
    [ColorChoice("Negro", Rgba::BLACK), ColorChoice("Naranja", Rgba::ORANGE)];

fn is_cancel(err: &InquireError) -> bool {
    matches!(err, InquireError::OperationCanceled | InquireError::OperationInterrupted)
}

pub async fn run(
    fetcher: &ForecastFetcher,
    coords: Coordinates,
    palette: &TemperaturePalette,
    mut overrides: BorderOverrides,
) -> anyhow::Result<()> {
    println!("{}", render::loading());
    fetcher.load(coords).await;

    loop {
        let state = fetcher.state();

        if let Some(forecast) = state.forecast() {
            print!("{}", render::screen(forecast, palette, &overrides));
        }
        if let Some(err) = state.error() {
            eprint!("{}", render::error_panel(err));
        }

        let action = match Select::new("¿Qué quieres hacer?", actions_for(&state, &overrides))
            .prompt()
        {
            Ok(action) => action,
            Err(err) if is_cancel(&err) => break,
            Err(err) => return Err(err.into()),
        };
        debug!(?action, "menu selection");

        match action {
            Action::MarkCell => {
                if let Some(forecast) = state.forecast() {
                    mark_cell(forecast, palette, &mut overrides)?;
                }
            }
            Action::ShowDetails => {
                if let Some(forecast) = state.forecast() {
                    show_details(forecast, palette, &overrides)?;
                }
            }
            Action::ClearMarks => overrides.clear(),
            Action::Retry => {
                println!("{}", render::loading());
                if let LoadOutcome::AlreadyInFlight = fetcher.load(coords).await {
                    debug!("retry ignored, a fetch is already running");
                }
            }
            Action::Quit => break,
        }
    }

    Ok(())
}

/// Pick a day, an hour and a color, apply the border and show that day's details.
fn mark_cell(
    forecast: &ForecastResponse,
    palette: &TemperaturePalette,
    overrides: &mut BorderOverrides,
) -> anyhow::Result<()> {
    let grid = project(forecast, palette, overrides);
    let Some(day) = pick_day(&grid)? else {
        return Ok(());
    };

    let hours: Vec<String> = (0..HOURS_PER_DAY).map(hour_label).collect();
    let hour = match Select::new("Hora", hours).with_page_size(8).raw_prompt() {
        Ok(choice) => choice.index,
        Err(err) if is_cancel(&err) => return Ok(()),
        Err(err) => return Err(err.into()),
    };

    let color = match Select::new("Color del borde", COLORS.to_vec()).prompt() {
        Ok(choice) => choice.1,
        Err(err) if is_cancel(&err) => return Ok(()),
        Err(err) => return Err(err.into()),
    };

    let (row, column) = (hour as u8, day as u8);
    overrides.set(row, column, color);

    let details = DayDetails::from_forecast(&forecast.days[day]);
    println!("{}", render::details(&grid.columns[day], Some(row), &details));
    Ok(())
}

/// Pick a day and print its summary without marking anything.
fn show_details(
    forecast: &ForecastResponse,
    palette: &TemperaturePalette,
    overrides: &BorderOverrides,
) -> anyhow::Result<()> {
    let grid = project(forecast, palette, overrides);
    let Some(day) = pick_day(&grid)? else {
        return Ok(());
    };

    let details = DayDetails::from_forecast(&forecast.days[day]);
    println!("{}", render::details(&grid.columns[day], None, &details));
    Ok(())
}

/// Column index of the chosen day, `None` when there is nothing to pick or
/// the prompt was cancelled.
fn pick_day(grid: &ForecastGrid) -> anyhow::Result<Option<usize>> {
    if grid.columns.is_empty() {
        println!("El pronóstico no tiene días para mostrar.");
        return Ok(None);
    }

    match Select::new("Día", day_labels(grid)).with_page_size(MAX_DAYS).raw_prompt() {
        Ok(choice) => Ok(Some(choice.index)),
        Err(err) if is_cancel(&err) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn day_labels(grid: &ForecastGrid) -> Vec<String> {
    grid.columns
        .iter()
        .map(|header| format!("{} {}", header.weekday_name, header.date))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempgrid_core::FetchError;

    fn forecast() -> Arc<ForecastResponse> {
        let json = serde_json::json!({
            "city": {
                "id": 1, "name": "Monterrey",
                "coord": { "lon": -100.3161, "lat": 25.6866 },
                "country": "MX", "population": 1, "timezone": -21600
            },
            "cod": "200", "message": 0.0, "cnt": 0, "list": []
        });
        Arc::new(ForecastResponse::from_json(&json.to_string()).unwrap())
    }

    #[test]
    fn idle_offers_retry_and_quit() {
        let actions = actions_for(&FetchState::Idle, &BorderOverrides::new());
        assert_eq!(actions, vec![Action::Retry, Action::Quit]);
    }

    #[test]
    fn loaded_offers_marking_and_clear_only_with_marks() {
        let state = FetchState::Loaded(forecast());

        let actions = actions_for(&state, &BorderOverrides::new());
        assert_eq!(
            actions,
            vec![Action::MarkCell, Action::ShowDetails, Action::Retry, Action::Quit]
        );

        let mut overrides = BorderOverrides::new();
        overrides.set(1, 1, Rgba::BLACK);
        let actions = actions_for(&state, &overrides);
        assert!(actions.contains(&Action::ClearMarks));
    }

    #[test]
    fn loading_hides_retry() {
        let state = FetchState::Loading { previous: None };
        let actions = actions_for(&state, &BorderOverrides::new());
        assert_eq!(actions, vec![Action::Quit]);
    }

    #[test]
    fn failure_with_previous_forecast_still_allows_marking() {
        let state = FetchState::Failed {
            error: Arc::new(FetchError::HttpStatus(500)),
            previous: Some(forecast()),
        };
        let actions = actions_for(&state, &BorderOverrides::new());
        assert_eq!(
            actions,
            vec![Action::MarkCell, Action::ShowDetails, Action::Retry, Action::Quit]
        );
    }

    #[test]
    fn details_need_a_forecast() {
        let idle = actions_for(&FetchState::Idle, &BorderOverrides::new());
        assert!(!idle.contains(&Action::ShowDetails));

        let loading = FetchState::Loading { previous: Some(forecast()) };
        let actions = actions_for(&loading, &BorderOverrides::new());
        assert_eq!(actions, vec![Action::MarkCell, Action::ShowDetails, Action::Quit]);
    }

    #[test]
    fn day_labels_use_full_weekday_and_date() {
        let json = serde_json::json!({
            "city": {
                "id": 1, "name": "Monterrey",
                "coord": { "lon": -100.3161, "lat": 25.6866 },
                "country": "MX", "population": 1, "timezone": -21600
            },
            "cod": "200", "message": 0.0, "cnt": 1,
            "list": [{
                "dt": 1717351200, "sunrise": 1717329600, "sunset": 1717372800,
                "temp": { "day": 300.0, "min": 285.0, "max": 301.0, "night": 285.0, "eve": 295.0, "morn": 290.0 },
                "feels_like": { "day": 301.0, "night": 285.0, "eve": 295.0, "morn": 290.0 },
                "pressure": 1012, "humidity": 60,
                "weather": [{ "id": 800, "main": "Clear", "description": "cielo claro", "icon": "01d" }],
                "speed": 2.3, "deg": 120, "gust": 4.1, "clouds": 5, "pop": 0.2
            }]
        });
        let forecast = ForecastResponse::from_json(&json.to_string()).unwrap();
        let grid = project(&forecast, &TemperaturePalette::default(), &BorderOverrides::new());

        assert_eq!(day_labels(&grid), vec!["Domingo 2/6".to_string()]);
    }
}
