// Error types for the dashboard library
// Binaries wrap these in anyhow with context; the library stays typed.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    /// A header that should be a year could not be parsed as an integer
    #[error("Data format error in {file}: year column '{label}' is not an integer")]
    DataFormat { file: String, label: String },

    #[error("Data format error in {file}: year column {year} appears more than once")]
    DuplicateYear { file: String, year: i32 },

    #[error("Data format error in {file}: missing 'country' column")]
    MissingCountryColumn { file: String },

    #[error("Data format error in {file}: country '{country}' appears more than once")]
    DuplicateCountry { file: String, country: String },

    #[error("CSV error in {file}: {source}")]
    Csv {
        file: String,
        #[source]
        source: csv::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, DashboardError>;
