//! Frequency aggregation over multi-valued columns.
//!
//! The listing exports store several logical items in one textual cell, for
//! example `"email, phone, government_id"` for host verifications or a long
//! comma-separated amenities list. [`aggregate`] decomposes every row's cell
//! into tokens, counts token occurrence across the whole result set, and
//! computes each token's share of the counted rows as a percentage. The flat
//! output carries a constant root label so a treemap can render it as a
//! single-level hierarchy.

use serde::Serialize;
use std::collections::HashMap;

use crate::error::{Result, StaylensError};
use crate::store::{RawRow, Value};

/// Root label attached to every entry for single-level treemap rendering.
pub const TREEMAP_ROOT: &str = "";
/// Delimiter the listing exports use for multi-valued columns.
pub const LIST_DELIMITER: &str = ", ";

/// How often one token occurred, and its share of the rows that reported
/// the attribute at all. Built fresh per result set, never mutated after.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenFrequency {
    pub token: String,
    pub count: u64,
    pub ratio_percent: f64,
    pub parent: &'static str,
}

/// Explodes a delimiter-joined column into a token frequency table.
///
/// Cell values are lower-cased before splitting so that case variants merge,
/// and tokens are trimmed of surrounding whitespace. Rows whose cell is null,
/// missing, or empty after trimming report nothing and stay out of the ratio
/// denominator. The output is sorted by count descending; ties keep
/// first-encounter order (stable sort), so re-running over the same rows
/// yields an identical sequence.
///
/// Fails with `MissingColumn` when no row carries the column at all. An
/// empty input, or input where every cell is null, yields an empty table.
pub fn aggregate(rows: &[RawRow], column: &str, delimiter: &str) -> Result<Vec<TokenFrequency>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    if !rows.iter().any(|row| row.has_column(column)) {
        return Err(StaylensError::MissingColumn(format!(
            "column {column:?} is not present in the result set"
        )));
    }
    // first-encounter order doubles as the tie-break order
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, u64> = HashMap::new();
    let mut rows_counted: u64 = 0;
    for row in rows {
        let text = match row.get(column) {
            Some(Value::Text(text)) => text,
            _ => continue,
        };
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = lowered
            .split(delimiter)
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .collect();
        if tokens.is_empty() {
            // nothing reported, so the row stays out of the denominator
            continue;
        }
        rows_counted += 1;
        for token in tokens {
            match counts.get_mut(token) {
                Some(count) => *count += 1,
                None => {
                    order.push(token.to_string());
                    counts.insert(token.to_string(), 1);
                }
            }
        }
    }
    if rows_counted == 0 {
        return Ok(Vec::new());
    }
    let mut frequencies: Vec<TokenFrequency> = order
        .into_iter()
        .map(|token| {
            let count = counts[&token];
            TokenFrequency {
                count,
                ratio_percent: 100.0 * count as f64 / rows_counted as f64,
                token,
                parent: TREEMAP_ROOT,
            }
        })
        .collect();
    frequencies.sort_by(|a, b| b.count.cmp(&a.count));
    Ok(frequencies)
}

/// Coerces a single-value aggregate result (a count or a sum) into a
/// display-ready integer.
///
/// A null cell coerces to zero, since `sum()` over zero rows comes back as
/// null. Fails with `NonNumericAggregate` when the cell holds text that is
/// not a number, and with `MissingColumn` when the column is absent.
pub fn scalar(rows: &[RawRow], column: &str) -> Result<i64> {
    let value = rows.first().and_then(|row| row.get(column)).ok_or_else(|| {
        StaylensError::MissingColumn(format!(
            "aggregate column {column:?} is not present in the result set"
        ))
    })?;
    match value {
        Value::Integer(count) => Ok(*count),
        Value::Real(sum) => Ok(sum.round() as i64),
        Value::Null => Ok(0),
        Value::Text(text) => text.trim().parse::<i64>().map_err(|_| {
            StaylensError::NonNumericAggregate(format!(
                "aggregate column {column:?} holds non-numeric value {text:?}"
            ))
        }),
    }
}
