// 🩹 Imputer - per-country forward fill, then backward fill
// Nearest-in-time carry only. Never interpolates, never crosses countries.

use crate::reshape::{LongRecord, LongTable};

/// Fill gaps in a long table in place.
///
/// Records are stably sorted by (country, year) first, then every country
/// group is filled independently: a forward pass carries the last seen value
/// into gaps, a backward pass fills whatever leading gap is left. A country
/// without a single observed value stays entirely missing.
pub fn fill_missing(table: &mut LongTable) {
    table.sort();

    let mut start = 0;
    while start < table.records.len() {
        let country = &table.records[start].country;
        let end = start
            + table.records[start..]
                .iter()
                .take_while(|r| &r.country == country)
                .count();

        fill_group(&mut table.records[start..end]);
        start = end;
    }
}

/// Forward fill then backward fill a single country's records
fn fill_group(group: &mut [LongRecord]) {
    let mut last_seen = None;
    for record in group.iter_mut() {
        match &record.value {
            Some(value) => last_seen = Some(value.clone()),
            None => record.value = last_seen.clone(),
        }
    }

    // Only a leading gap can survive the forward pass
    let mut next_seen = None;
    for record in group.iter_mut().rev() {
        match &record.value {
            Some(value) => next_seen = Some(value.clone()),
            None => record.value = next_seen.clone(),
        }
    }
}
