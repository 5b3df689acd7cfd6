// 🫧 Bubble chart layout
// x = GNI per capita, y = life expectancy, size = population, color = country
//
// Bubbles are placed in a square plot space of PLOT_SPAN units per axis so a
// circle stays round no matter how different the data ranges are.

use crate::filter::Bubble;
use serde::Serialize;

pub const X_LABEL: &str = "GNI per Capita";
pub const Y_LABEL: &str = "Life Expectancy";
pub const SIZE_LABEL: &str = "Population";

/// Width and height of the plot space
pub const PLOT_SPAN: f64 = 100.0;

/// Figure size `size_max` is measured against (a 600 unit wide figure)
const REFERENCE_EXTENT: f64 = 600.0;

/// Fraction of the data range added on each side of an axis
const AXIS_PADDING: f64 = 0.05;

/// Palette size; color indices cycle through it
pub const PALETTE_LEN: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedBubble {
    pub country: String,
    /// Data values
    pub gni_per_capita: f64,
    pub lex: f64,
    pub population: f64,
    /// Position and radius in plot space
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub color: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartLayout {
    pub title: String,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    pub bubbles: Vec<PlacedBubble>,
    /// Selected rows that lacked x, y or size
    pub omitted: Vec<String>,
}

impl ChartLayout {
    /// Data value → plot space along the x axis
    pub fn plot_x(&self, value: f64) -> f64 {
        scale(value, self.x_bounds)
    }

    pub fn plot_y(&self, value: f64) -> f64 {
        scale(value, self.y_bounds)
    }

    /// Evenly spaced (plot position, label) pairs for the x axis
    pub fn x_ticks(&self, count: usize) -> Vec<(f64, String)> {
        ticks(self.x_bounds, count)
    }

    pub fn y_ticks(&self, count: usize) -> Vec<(f64, String)> {
        ticks(self.y_bounds, count)
    }
}

/// Lay out the bubbles for one year.
///
/// `color_order` fixes each country's palette slot so colors stay put while
/// the year changes; countries missing from it follow in bubble order.
pub fn layout(bubbles: &[Bubble], year: i32, color_order: &[String], size_max: f64) -> ChartLayout {
    let mut plottable = Vec::new();
    let mut omitted = Vec::new();

    for bubble in bubbles {
        match (bubble.gni_per_capita, bubble.lex, bubble.population) {
            (Some(x), Some(y), Some(size)) if size >= 0.0 => plottable.push((bubble, x, y, size)),
            _ => omitted.push(bubble.country.clone()),
        }
    }

    let x_bounds = padded_bounds(plottable.iter().map(|p| p.1));
    let y_bounds = padded_bounds(plottable.iter().map(|p| p.2));
    let max_size = plottable.iter().map(|p| p.3).fold(0.0_f64, f64::max);
    let max_radius = size_max / 2.0 / REFERENCE_EXTENT * PLOT_SPAN;

    let mut extra_colors: Vec<&str> = Vec::new();
    let placed = plottable
        .into_iter()
        .map(|(bubble, x, y, size)| {
            let slot = match color_order.iter().position(|c| c == &bubble.country) {
                Some(pos) => pos,
                None => {
                    let pos = match extra_colors.iter().position(|c| *c == bubble.country) {
                        Some(pos) => pos,
                        None => {
                            extra_colors.push(&bubble.country);
                            extra_colors.len() - 1
                        }
                    };
                    color_order.len() + pos
                }
            };

            // Area ∝ population
            let radius = if max_size > 0.0 {
                max_radius * (size / max_size).sqrt()
            } else {
                0.0
            };

            PlacedBubble {
                country: bubble.country.clone(),
                gni_per_capita: x,
                lex: y,
                population: size,
                x: scale(x, x_bounds),
                y: scale(y, y_bounds),
                radius,
                color: slot % PALETTE_LEN,
            }
        })
        .collect();

    ChartLayout {
        title: format!("Year {}", year),
        x_bounds,
        y_bounds,
        bubbles: placed,
        omitted,
    }
}

fn scale(value: f64, bounds: [f64; 2]) -> f64 {
    let span = bounds[1] - bounds[0];
    if span <= 0.0 {
        return PLOT_SPAN / 2.0;
    }
    (value - bounds[0]) / span * PLOT_SPAN
}

fn padded_bounds(values: impl Iterator<Item = f64>) -> [f64; 2] {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });

    if !min.is_finite() || !max.is_finite() {
        return [0.0, 1.0];
    }

    let span = max - min;
    let pad = if span > 0.0 {
        span * AXIS_PADDING
    } else if min != 0.0 {
        min.abs() * AXIS_PADDING
    } else {
        1.0
    };
    [min - pad, max + pad]
}

fn ticks(bounds: [f64; 2], count: usize) -> Vec<(f64, String)> {
    if count < 2 {
        return Vec::new();
    }
    (0..count)
        .map(|i| {
            let fraction = i as f64 / (count - 1) as f64;
            let value = bounds[0] + (bounds[1] - bounds[0]) * fraction;
            (fraction * PLOT_SPAN, format_compact(value))
        })
        .collect()
}

/// Short axis label: 1234 → "1.2k", 82000000 → "82.0M"
pub fn format_compact(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1e9 {
        format!("{:.1}B", value / 1e9)
    } else if abs >= 1e6 {
        format!("{:.1}M", value / 1e6)
    } else if abs >= 1e3 {
        format!("{:.1}k", value / 1e3)
    } else {
        format!("{:.0}", value)
    }
}
