//! Store-count normalisation.
//!
//! Property-graph drivers disagree on how they surface integers: some return
//! native JSON numbers, others a big-integer object (`{"low": .., "high": ..}`
//! in 32-bit-pair form, or a wrapper with a `"value"` field). Every count that
//! crosses the store port goes through [`normalize_count`].

use serde_json::Value;

/// Convert a store-provided count into a `u64`.
///
/// Accepts native integers, floats with integral value, numeric strings,
/// `{low, high}` 32-bit pairs, and `{value}` wrappers. Anything else
/// normalises to zero — a count we cannot read must not poison an analysis.
#[must_use]
pub fn normalize_count(value: &Value) -> u64 {
    match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                u
            } else if let Some(i) = n.as_i64() {
                i.max(0) as u64
            } else {
                n.as_f64().map_or(0, |f| if f > 0.0 { f as u64 } else { 0 })
            }
        }
        Value::String(s) => s.parse::<u64>().unwrap_or(0),
        Value::Object(map) => {
            if let (Some(low), Some(high)) = (map.get("low"), map.get("high")) {
                let low = normalize_count(low);
                let high = normalize_count(high);
                (high << 32) | (low & 0xFFFF_FFFF)
            } else if let Some(inner) = map.get("value") {
                normalize_count(inner)
            } else {
                0
            }
        }
        _ => 0,
    }
}
