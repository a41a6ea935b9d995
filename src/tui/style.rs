//! Color constants for the TUI.

use ratatui::style::Color;

use crate::map::grid::{Cell, Structure};

/// Header bar foreground.
pub const HEADER_FG: Color = Color::White;
/// Header bar background.
pub const HEADER_BG: Color = Color::DarkGray;
/// Footer help text color.
pub const FOOTER_FG: Color = Color::DarkGray;
/// Production line color.
pub const PRODUCTION_COLOR: Color = Color::Cyan;
/// Demand line color.
pub const DEMAND_COLOR: Color = Color::Yellow;

/// Returns a color for the city's happiness.
pub fn happiness_color(happiness: i32) -> Color {
    if happiness >= 50 {
        Color::Green
    } else if happiness >= 20 {
        Color::Yellow
    } else {
        Color::Red
    }
}

/// Foreground for one map cell.
pub fn cell_color(cell: &Cell) -> Color {
    match cell.structure() {
        Some(Structure::Plant(p)) if p.is_operational() => Color::LightYellow,
        Some(Structure::Plant(_)) => Color::DarkGray,
        Some(Structure::Dwelling(d)) if d.is_supplied() => Color::Green,
        Some(Structure::Dwelling(_)) => Color::Red,
        None if cell.is_water() => Color::Blue,
        None if cell.has_line() => Color::Yellow,
        None if cell.is_powered() => Color::Gray,
        None => Color::DarkGray,
    }
}

/// Computes Y-axis bounds from chart data points with 10% padding.
pub fn auto_bounds_y(a: &[(f64, f64)], b: &[(f64, f64)]) -> [f64; 2] {
    let all = a.iter().chain(b.iter()).map(|&(_, y)| y);
    let min = all.clone().fold(f64::INFINITY, f64::min);
    let max = all.fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() || !max.is_finite() {
        return [0.0, 1.0];
    }
    let range = (max - min).max(1.0);
    let pad = range * 0.1;
    [(min - pad).max(0.0), max + pad]
}
