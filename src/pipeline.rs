// 🔄 Pipeline - load, fill and merge the three metric files
// The merged table is memoized per input file list for the configured TTL.

use crate::cache::TtlCache;
use crate::config::Config;
use crate::error::Result;
use crate::impute::fill_missing;
use crate::merge::{merge_metrics, MergedTable};
use crate::reshape::{load_wide_csv, LongTable};
use chrono::{DateTime, Duration, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Load one wide CSV, melt it and fill its gaps
pub fn preprocess(path: &Path) -> Result<LongTable> {
    let mut table = load_wide_csv(path)?;
    fill_missing(&mut table);
    Ok(table)
}

/// Build the merged dashboard table from (lex, gni, population) files
pub fn load_data(paths: &[PathBuf; 3]) -> Result<MergedTable> {
    let lex = preprocess(&paths[0])?;
    let gni = preprocess(&paths[1])?;
    let population = preprocess(&paths[2])?;

    let merged = merge_metrics(&lex, &gni, &population);
    info!(
        lex = lex.len(),
        gni = gni.len(),
        population = population.len(),
        merged = merged.len(),
        "Merged metric tables"
    );
    Ok(merged)
}

/// Owner of the memoized merged table.
///
/// The key is the ordered list of input paths, so pointing the store at other
/// files never returns a stale table for the old ones.
pub struct DataStore {
    paths: [PathBuf; 3],
    cache: TtlCache<Vec<PathBuf>, Arc<MergedTable>>,
}

impl DataStore {
    pub fn new(paths: [PathBuf; 3], ttl: Duration) -> Self {
        DataStore {
            paths,
            cache: TtlCache::new(ttl),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.metric_paths(), config.cache_ttl())
    }

    /// The merged table, recomputed only when the cached one has expired
    pub fn merged(&mut self) -> Result<Arc<MergedTable>> {
        self.merged_at(Utc::now())
    }

    pub fn merged_at(&mut self, now: DateTime<Utc>) -> Result<Arc<MergedTable>> {
        let key = self.paths.to_vec();
        let paths = &self.paths;

        self.cache.get_or_try_insert_at(key, now, || {
            debug!("Cache miss, reloading metric files");
            load_data(paths).map(Arc::new)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reshape::CellValue;
    use std::fs;

    fn write_fixture(dir: &Path) -> [PathBuf; 3] {
        let lex = dir.join("lex.csv");
        let gni = dir.join("ny_gnp_pcap_pp_cd.csv");
        let pop = dir.join("pop.csv");

        fs::write(&lex, "country,2000,2001,2002\nGermany,,78,79\nVietnam,70,,\n").unwrap();
        fs::write(&gni, "country,2000,2001,2002\nGermany,30k,31k,\n").unwrap();
        fs::write(&pop, "country,2000,2001,2002\nGermany,82M,82M,83M\nTestland,1k,,\n").unwrap();

        [lex, gni, pop]
    }

    #[test]
    fn test_preprocess_fills_gaps() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_fixture(dir.path());

        let lex = preprocess(&paths[0]).unwrap();

        assert_eq!(lex.metric, "lex");
        assert!(lex.records.iter().all(|r| r.value.is_some()));
        assert_eq!(lex.records[0].value, Some(CellValue::Number(78.0)));
    }

    #[test]
    fn test_load_data_outer_join() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_fixture(dir.path());

        let merged = load_data(&paths).unwrap();

        // Germany, Testland and Vietnam for three years each
        assert_eq!(merged.len(), 9);
        assert_eq!(merged.countries(), vec!["Germany", "Testland", "Vietnam"]);

        let testland = merged.series("Testland");
        assert!(testland.iter().all(|r| r.lex.is_none() && r.gni_per_capita.is_none()));
        assert!(testland.iter().all(|r| r.population == Some(CellValue::from("1k"))));

        let vietnam = merged.series("Vietnam");
        assert!(vietnam.iter().all(|r| r.gni_per_capita.is_none()));
    }

    #[test]
    fn test_load_data_bad_year_header() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_fixture(dir.path());
        fs::write(&paths[1], "country,2000,twenty-one\nGermany,1,2\n").unwrap();

        let err = load_data(&paths).unwrap_err();
        assert!(err.to_string().contains("twenty-one"));
    }

    #[test]
    fn test_data_store_memoizes_until_ttl() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_fixture(dir.path());
        let mut store = DataStore::new(paths.clone(), Duration::seconds(3600));
        let t0 = Utc::now();

        let first = store.merged_at(t0).unwrap();

        // Removing a file does not matter while the entry is fresh
        fs::remove_file(&paths[2]).unwrap();
        let second = store.merged_at(t0 + Duration::minutes(30)).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        // After expiry the pipeline runs again and sees the missing file
        assert!(store.merged_at(t0 + Duration::hours(2)).is_err());
    }
}
