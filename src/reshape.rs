// 📂 Loader/Reshaper - wide CSV → long form
// One row per country, one column per year  →  one record per (country, year)

use crate::error::{DashboardError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Name of the id column every source file must carry
pub const COUNTRY_COLUMN: &str = "country";

/// Cell spellings read as missing, same set pandas' `read_csv` uses
const NA_TOKENS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

// ============================================================================
// CORE TYPES
// ============================================================================

/// A single metric cell, kept as read.
///
/// Gapminder exports mix plain numbers with magnitude shorthand such as
/// `"12.3k"`. Those strings are carried through fill and merge untouched and
/// only turned into numbers at the presentation boundary (see `coerce`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Parse a raw CSV field. Empty fields and NA tokens are missing.
    pub fn parse(raw: &str) -> Option<CellValue> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || NA_TOKENS.contains(&trimmed) {
            return None;
        }

        match trimmed.parse::<f64>() {
            Ok(n) if n.is_nan() => None,
            Ok(n) => Some(CellValue::Number(n)),
            Err(_) => Some(CellValue::Text(trimmed.to_string())),
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

/// One observation of one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongRecord {
    pub country: String,
    pub year: i32,
    pub value: Option<CellValue>,
}

impl LongRecord {
    pub fn new(country: &str, year: i32, value: Option<CellValue>) -> Self {
        LongRecord {
            country: country.to_string(),
            year,
            value,
        }
    }
}

/// A melted metric table: the metric name plus its long-form records
#[derive(Debug, Clone, PartialEq)]
pub struct LongTable {
    pub metric: String,
    pub records: Vec<LongRecord>,
}

impl LongTable {
    pub fn new(metric: &str, records: Vec<LongRecord>) -> Self {
        LongTable {
            metric: metric.to_string(),
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Stable sort by (country, year) ascending
    pub fn sort(&mut self) {
        self.records
            .sort_by(|a, b| a.country.cmp(&b.country).then(a.year.cmp(&b.year)));
    }
}

// ============================================================================
// LOADING
// ============================================================================

/// Metric name derived from a file name: `lex.csv` → `lex`
pub fn metric_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("value")
        .to_string()
}

/// Load a wide CSV file and melt it into a sorted long table.
pub fn load_wide_csv(path: &Path) -> Result<LongTable> {
    let file = File::open(path)?;
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown.csv")
        .to_string();

    let table = melt(file, &metric_name(path), &filename)?;
    debug!(
        file = %filename,
        records = table.len(),
        "Reshaped wide table into long form"
    );
    Ok(table)
}

/// Melt any wide-form CSV source.
///
/// `source` is only used to label errors. Output is sorted by
/// (country, year).
pub fn melt<R: Read>(reader: R, metric: &str, source: &str) -> Result<LongTable> {
    let csv_error = |e: csv::Error| DashboardError::Csv {
        file: source.to_string(),
        source: e,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    let headers = reader.headers().map_err(csv_error)?.clone();

    let country_idx = headers
        .iter()
        .position(|h| h.trim() == COUNTRY_COLUMN)
        .ok_or_else(|| DashboardError::MissingCountryColumn {
            file: source.to_string(),
        })?;

    // Every other column must be a distinct year
    let mut year_columns = Vec::with_capacity(headers.len().saturating_sub(1));
    let mut years_seen = HashSet::new();
    for (idx, label) in headers.iter().enumerate() {
        if idx == country_idx {
            continue;
        }
        let year = label
            .trim()
            .parse::<i32>()
            .map_err(|_| DashboardError::DataFormat {
                file: source.to_string(),
                label: label.to_string(),
            })?;
        if !years_seen.insert(year) {
            return Err(DashboardError::DuplicateYear {
                file: source.to_string(),
                year,
            });
        }
        year_columns.push((idx, year));
    }

    let mut records = Vec::new();
    let mut seen = HashSet::new();

    for result in reader.records() {
        let row = result.map_err(csv_error)?;
        let country = row.get(country_idx).unwrap_or("").trim().to_string();

        if !seen.insert(country.clone()) {
            return Err(DashboardError::DuplicateCountry {
                file: source.to_string(),
                country,
            });
        }

        for &(idx, year) in &year_columns {
            let value = row.get(idx).and_then(CellValue::parse);
            records.push(LongRecord {
                country: country.clone(),
                year,
                value,
            });
        }
    }

    let mut table = LongTable::new(metric, records);
    table.sort();
    Ok(table)
}

// ============================================================================
// TESTS
// ============================================================================
