// Gapminder Dashboard - Core Library
// Exposes the data pipeline for use in the terminal UI, API server, and tests

pub mod cache;
pub mod chart;
pub mod coerce;
pub mod config;
pub mod controls;
pub mod error;
pub mod filter;
pub mod impute;
pub mod logging;
pub mod merge;
pub mod pipeline;
pub mod reshape;

// Re-export commonly used types
pub use cache::TtlCache;
pub use chart::{layout, ChartLayout, PlacedBubble};
pub use coerce::{coerce_cell, parse_number};
pub use config::Config;
pub use controls::{current_selection, CountryPicker, YearSlider};
pub use error::{DashboardError, Result};
pub use filter::{available_defaults, filter_bubbles, filter_rows, Bubble, Selection};
pub use impute::fill_missing;
pub use merge::{merge_metrics, outer_join, MergedRecord, MergedTable, WideRow, WideTable};
pub use pipeline::{load_data, preprocess, DataStore};
pub use reshape::{load_wide_csv, melt, metric_name, CellValue, LongRecord, LongTable};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
