// 🔢 Numeric coercion at the presentation boundary
// "12.3k" → 12300.0, "1.2M" → 1200000.0, anything unparseable → missing

use crate::reshape::CellValue;

/// Coerce a raw text value to a number.
///
/// Every `k` becomes `e3` and every `M` becomes `e6` before the float parse.
/// Returns None instead of failing on malformed input. Infinities and NaN
/// count as missing since they cannot be plotted.
pub fn parse_number(raw: &str) -> Option<f64> {
    let expanded = raw.trim().replace('k', "e3").replace('M', "e6");
    expanded.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Coerce a (possibly missing) cell to a number
pub fn coerce_cell(cell: Option<&CellValue>) -> Option<f64> {
    match cell? {
        CellValue::Number(n) if !n.is_finite() => None,
        CellValue::Number(n) => Some(*n),
        CellValue::Text(s) => parse_number(s),
    }
}
