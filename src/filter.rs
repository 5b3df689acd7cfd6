// 🔍 Filter - merged rows for one year and a set of countries
// Output rows have their metric fields coerced to numbers.

use crate::coerce::coerce_cell;
use crate::merge::{MergedRecord, MergedTable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// What the user has picked: one year, any number of countries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub year: i32,
    pub countries: BTreeSet<String>,
}

impl Selection {
    pub fn new<I, S>(year: i32, countries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Selection {
            year,
            countries: countries.into_iter().map(Into::into).collect(),
        }
    }

    pub fn matches(&self, record: &MergedRecord) -> bool {
        record.year == self.year && self.countries.contains(&record.country)
    }
}

/// One chart-ready row: x = gni_per_capita, y = lex, size = population
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bubble {
    pub country: String,
    pub year: i32,
    pub gni_per_capita: Option<f64>,
    pub lex: Option<f64>,
    pub population: Option<f64>,
}

impl Bubble {
    pub fn from_record(record: &MergedRecord) -> Self {
        Bubble {
            country: record.country.clone(),
            year: record.year,
            gni_per_capita: coerce_cell(record.gni_per_capita.as_ref()),
            lex: coerce_cell(record.lex.as_ref()),
            population: coerce_cell(record.population.as_ref()),
        }
    }

    /// All three chart dimensions are present
    pub fn is_plottable(&self) -> bool {
        self.gni_per_capita.is_some() && self.lex.is_some() && self.population.is_some()
    }
}

/// Exactly the rows whose year equals the selected year and whose country is
/// selected, in table order
pub fn filter_rows<'a>(table: &'a MergedTable, selection: &Selection) -> Vec<&'a MergedRecord> {
    table
        .records
        .iter()
        .filter(|record| selection.matches(record))
        .collect()
}

pub fn filter_bubbles(table: &MergedTable, selection: &Selection) -> Vec<Bubble> {
    filter_rows(table, selection)
        .into_iter()
        .map(Bubble::from_record)
        .collect()
}

/// Preferred default countries that actually exist in the table
pub fn available_defaults(table: &MergedTable, preferred: &[String]) -> Vec<String> {
    let known: BTreeSet<String> = table.countries().into_iter().collect();
    preferred
        .iter()
        .filter(|c| known.contains(c.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reshape::CellValue;

    fn record(country: &str, year: i32, lex: f64, gni: &str, pop: &str) -> MergedRecord {
        MergedRecord {
            country: country.to_string(),
            year,
            lex: Some(CellValue::Number(lex)),
            gni_per_capita: Some(CellValue::from(gni)),
            population: Some(CellValue::from(pop)),
        }
    }

    fn sample_table() -> MergedTable {
        MergedTable {
            records: vec![
                record("Germany", 2000, 78.0, "30k", "82M"),
                record("Germany", 2001, 78.5, "31k", "82M"),
                record("Japan", 2000, 81.0, "28k", "127M"),
                record("USA", 2000, 77.0, "45k", "282M"),
                record("Vietnam", 2000, 70.0, "abc", "79M"),
            ],
        }
    }

    #[test]
    fn test_filter_exact_year_and_countries() {
        let table = sample_table();
        let selection = Selection::new(2000, ["Germany", "USA"]);

        let rows = filter_rows(&table, &selection);

        let keys: Vec<(&str, i32)> = rows.iter().map(|r| (r.country.as_str(), r.year)).collect();
        assert_eq!(keys, vec![("Germany", 2000), ("USA", 2000)]);
    }

    #[test]
    fn test_filter_matches_predicate_for_every_row() {
        let table = sample_table();
        let selection = Selection::new(2000, ["Germany", "Japan", "Atlantis"]);

        let rows = filter_rows(&table, &selection);
        let expected: Vec<&MergedRecord> = table
            .records
            .iter()
            .filter(|r| r.year == 2000 && selection.countries.contains(&r.country))
            .collect();

        assert_eq!(rows, expected);
    }

    #[test]
    fn test_filter_empty_selection() {
        let table = sample_table();
        let selection = Selection::new(2000, Vec::<String>::new());

        assert!(filter_rows(&table, &selection).is_empty());
        assert!(filter_rows(&table, &Selection::new(1800, ["Germany"])).is_empty());
    }

    #[test]
    fn test_bubbles_are_coerced() {
        let table = sample_table();
        let bubbles = filter_bubbles(&table, &Selection::new(2000, ["USA", "Vietnam"]));

        assert_eq!(bubbles.len(), 2);
        assert_eq!(bubbles[0].gni_per_capita, Some(45000.0));
        assert_eq!(bubbles[0].population, Some(282e6));
        assert!(bubbles[0].is_plottable());

        // Unparseable GNI becomes missing, the row is still returned
        assert_eq!(bubbles[1].country, "Vietnam");
        assert_eq!(bubbles[1].gni_per_capita, None);
        assert!(!bubbles[1].is_plottable());
    }

    #[test]
    fn test_available_defaults() {
        let table = sample_table();
        let preferred = vec!["Germany".to_string(), "France".to_string(), "USA".to_string()];

        assert_eq!(available_defaults(&table, &preferred), vec!["Germany", "USA"]);
    }
}
