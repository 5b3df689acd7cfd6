// 🔗 Merger - outer join of metric tables on (country, year)
// No row is ever dropped; absent metrics stay missing.

use crate::reshape::{CellValue, LongTable};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ============================================================================
// GENERIC N-WAY OUTER JOIN
// ============================================================================

/// One joined row: a value slot per input metric, in input order
#[derive(Debug, Clone, PartialEq)]
pub struct WideRow {
    pub country: String,
    pub year: i32,
    pub values: Vec<Option<CellValue>>,
}

/// Result of joining any number of long tables
#[derive(Debug, Clone, PartialEq)]
pub struct WideTable {
    pub metrics: Vec<String>,
    pub rows: Vec<WideRow>,
}

/// Outer join every table on (country, year).
///
/// Joining left to right is equivalent to the sequential pairwise join: a key
/// seen in any table gets a row, and each metric slot is filled only by its
/// own table. Rows come out sorted by (country, year).
pub fn outer_join(tables: &[&LongTable]) -> WideTable {
    let width = tables.len();
    let mut joined: BTreeMap<(String, i32), Vec<Option<CellValue>>> = BTreeMap::new();

    for (slot, table) in tables.iter().enumerate() {
        for record in &table.records {
            let values = joined
                .entry((record.country.clone(), record.year))
                .or_insert_with(|| vec![None; width]);
            values[slot] = record.value.clone();
        }
    }

    let rows = joined
        .into_iter()
        .map(|((country, year), values)| WideRow {
            country,
            year,
            values,
        })
        .collect();

    WideTable {
        metrics: tables.iter().map(|t| t.metric.clone()).collect(),
        rows,
    }
}

// ============================================================================
// THE THREE-METRIC DASHBOARD TABLE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedRecord {
    pub country: String,
    pub year: i32,
    pub lex: Option<CellValue>,
    pub gni_per_capita: Option<CellValue>,
    pub population: Option<CellValue>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedTable {
    pub records: Vec<MergedRecord>,
}

impl MergedTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// (min, max) year, or None for an empty table
    pub fn year_range(&self) -> Option<(i32, i32)> {
        let min = self.records.iter().map(|r| r.year).min()?;
        let max = self.records.iter().map(|r| r.year).max()?;
        Some((min, max))
    }

    /// Distinct country names, sorted
    pub fn countries(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.country.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// All rows of one country in year order
    pub fn series(&self, country: &str) -> Vec<&MergedRecord> {
        self.records.iter().filter(|r| r.country == country).collect()
    }

    /// Every (country, year) key present
    pub fn keys(&self) -> BTreeSet<(String, i32)> {
        self.records
            .iter()
            .map(|r| (r.country.clone(), r.year))
            .collect()
    }
}

/// Join life expectancy with GNI per capita, then with population.
pub fn merge_metrics(lex: &LongTable, gni: &LongTable, population: &LongTable) -> MergedTable {
    let wide = outer_join(&[lex, gni, population]);

    let records = wide
        .rows
        .into_iter()
        .map(|row| {
            let mut values = row.values.into_iter();
            MergedRecord {
                country: row.country,
                year: row.year,
                lex: values.next().flatten(),
                gni_per_capita: values.next().flatten(),
                population: values.next().flatten(),
            }
        })
        .collect();

    MergedTable { records }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reshape::LongRecord;

    fn num(n: f64) -> Option<CellValue> {
        Some(CellValue::Number(n))
    }

    fn table(metric: &str, rows: &[(&str, i32, f64)]) -> LongTable {
        LongTable::new(
            metric,
            rows.iter()
                .map(|(c, y, v)| LongRecord::new(c, *y, num(*v)))
                .collect(),
        )
    }

    #[test]
    fn test_merge_population_only_country() {
        let lex = table("lex", &[("Germany", 2000, 78.0)]);
        let gni = table("gni", &[("Germany", 2000, 30000.0)]);
        let pop = table("pop", &[("Germany", 2000, 82e6), ("Testland", 2000, 1234.0)]);

        let merged = merge_metrics(&lex, &gni, &pop);

        let testland = merged.series("Testland");
        assert_eq!(testland.len(), 1);
        assert_eq!(
            *testland[0],
            MergedRecord {
                country: "Testland".to_string(),
                year: 2000,
                lex: None,
                gni_per_capita: None,
                population: num(1234.0),
            }
        );
    }

    #[test]
    fn test_merge_keys_are_union_of_inputs() {
        let lex = table("lex", &[("A", 2000, 1.0), ("B", 2001, 1.0)]);
        let gni = table("gni", &[("A", 2000, 2.0), ("C", 1999, 2.0)]);
        let pop = table("pop", &[("D", 2005, 3.0), ("B", 2001, 3.0)]);

        let merged = merge_metrics(&lex, &gni, &pop);

        let expected: BTreeSet<(String, i32)> = [lex, gni, pop]
            .iter()
            .flat_map(|t| t.records.iter().map(|r| (r.country.clone(), r.year)))
            .collect();

        assert_eq!(merged.keys(), expected);
        assert_eq!(merged.len(), 4);
    }

    #[test]
    fn test_merge_row_count_at_least_largest_input() {
        let lex = table("lex", &[("A", 2000, 1.0)]);
        let gni = table("gni", &[]);
        let pop = table("pop", &[("A", 2000, 3.0), ("A", 2001, 3.0), ("A", 2002, 3.0)]);

        let merged = merge_metrics(&lex, &gni, &pop);

        assert!(merged.len() >= 3);
        assert!(merged.records.iter().all(|r| r.gni_per_capita.is_none()));
    }

    #[test]
    fn test_merge_keeps_metrics_in_their_own_columns() {
        let lex = table("lex", &[("A", 2000, 70.0)]);
        let gni = table("gni", &[("A", 2000, 5000.0)]);
        let pop = table("pop", &[("A", 2000, 9.0)]);

        let merged = merge_metrics(&lex, &gni, &pop);
        let row = &merged.records[0];

        assert_eq!(row.lex, num(70.0));
        assert_eq!(row.gni_per_capita, num(5000.0));
        assert_eq!(row.population, num(9.0));
    }

    #[test]
    fn test_outer_join_join_order_does_not_change_coverage() {
        let a = table("a", &[("X", 1, 1.0)]);
        let b = table("b", &[("Y", 2, 2.0)]);
        let c = table("c", &[("X", 3, 3.0)]);

        let abc = outer_join(&[&a, &b, &c]);
        let cba = outer_join(&[&c, &b, &a]);

        let keys = |t: &WideTable| -> Vec<(String, i32)> {
            t.rows.iter().map(|r| (r.country.clone(), r.year)).collect()
        };
        assert_eq!(keys(&abc), keys(&cba));
        assert_eq!(abc.metrics, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_merged_table_helpers() {
        let lex = table("lex", &[("Vietnam", 1990, 70.0), ("Germany", 2010, 80.0)]);
        let merged = merge_metrics(&lex, &table("gni", &[]), &table("pop", &[]));

        assert_eq!(merged.year_range(), Some((1990, 2010)));
        assert_eq!(merged.countries(), vec!["Germany", "Vietnam"]);
        assert_eq!(MergedTable::default().year_range(), None);
    }
}
