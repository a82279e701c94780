//! Terminal drawing of the forecast grid.

use crossterm::style::{Color, Stylize};
use tempgrid_core::{
    BorderOverrides, DayDetails, DayPeriod, FetchError, ForecastResponse, Rgba,
    TemperaturePalette,
    grid::{DayHeader, ForecastGrid, GridCell, hour_label},
    project,
};

const HOUR_COLUMN: usize = 6;
const CELL_WIDTH: usize = 6;

fn term_color(color: Rgba) -> Color {
    let (r, g, b) = color.over_white();
    Color::Rgb { r, g, b }
}

/// Full screen: city header, legend, period guide and the grid.
pub fn screen(
    forecast: &ForecastResponse,
    palette: &TemperaturePalette,
    overrides: &BorderOverrides,
) -> String {
    let grid = project(forecast, palette, overrides);

    format!(
        "{}\n{}\n\n{}\n{}",
        grid.city.as_str().bold(),
        grid.country,
        legend(palette),
        grid_body(&grid)
    )
}

pub fn legend(palette: &TemperaturePalette) -> String {
    let mut out = String::from("Leyenda de Temperaturas\n");

    for range in palette.ranges() {
        let swatch = "    ".on(term_color(range.color));
        out.push_str(&format!("  {swatch} {:<10} {}\n", range.label, range.caption()));
    }

    let periods: Vec<_> = DayPeriod::ALL.iter().map(DayPeriod::label).collect();
    out.push_str(&format!("Períodos del día: {}\n", periods.join("  ")));
    out
}

pub fn grid_body(grid: &ForecastGrid) -> String {
    let header_row = |field: fn(&DayHeader) -> &str| -> String {
        let cells: String =
            grid.columns.iter().map(|header| format!("{:^CELL_WIDTH$}", field(header))).collect();
        format!("{:HOUR_COLUMN$}{cells}\n", "")
    };

    let mut out = header_row(|header| header.weekday);
    out.push_str(&header_row(|header| header.date.as_str()));

    for (hour, row) in grid.rows.iter().enumerate() {
        out.push_str(&format!("{:<HOUR_COLUMN$}", hour_label(hour as u8)));
        out.extend(row.iter().map(cell_text));
        out.push('\n');
    }
    out
}

/// One cell: `[`/`]` in the override color when marked, blanks otherwise.
fn cell_text(cell: &GridCell) -> String {
    let value = if cell.show_value { format!("{:>3}°", cell.rounded()) } else { "    ".into() };
    let body = value.on(term_color(cell.fill)).with(Color::Black);

    if cell.border.is_override() {
        let edge = term_color(cell.border.color);
        format!("{}{}{}", "[".with(edge).bold(), body, "]".with(edge).bold())
    } else {
        format!(" {body} ")
    }
}

pub fn error_panel(err: &FetchError) -> String {
    let mut out = format!(
        "{}\n{}\n",
        "⚠ Error al cargar datos".bold().with(Color::DarkYellow),
        err.user_message().with(Color::Red)
    );
    if err.is_retryable() {
        out.push_str("Puedes reintentar en unos momentos.\n");
    }
    out
}

pub fn loading() -> &'static str {
    "Cargando datos del clima..."
}

/// Day summary. With `hour`, the title names the marked slot.
pub fn details(header: &DayHeader, hour: Option<u8>, details: &DayDetails) -> String {
    let title = match hour {
        Some(hour) => format!(
            "Detalles del día agendado: {} {} a las {}",
            header.weekday_name,
            header.date,
            hour_label(hour)
        ),
        None => format!("Detalles del día: {} {}", header.weekday_name, header.date),
    };

    let mut lines = vec![title.bold().to_string()];
    if let Some(description) = &details.description {
        lines.push(format!("  Clima: {description}"));
    }
    lines.push(format!("  Promedio: {:.0}°C", details.average_c));
    lines.push(format!("  Humedad: {}%", details.humidity_pct));
    lines.push(format!("  Min: {:.0}°C / Máx: {:.0}°C", details.min_c, details.max_c));
    lines.push(format!("  Sensación: {:.0}°C", details.feels_like_c));
    lines.push(format!("  Lluvia: {}%", details.precipitation_pct));
    if let Some(volume) = details.rain_volume {
        lines.push(format!("  Volumen de lluvia: {volume:.1} mm"));
    }
    lines.push(format!("  Vientos: {:.1} m/s", details.wind_speed));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
