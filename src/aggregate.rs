// Grouping and aggregate functions over report rows.

use crate::data::{coerce_number, number_value, Row};
use anyhow::{anyhow, Result};
use std::collections::{HashMap, HashSet};

/// Bucket label for rows whose group value is missing, null, or empty.
pub const MISSING_GROUP_LABEL: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFn {
    Count,
    DistinctCount,
    Sum,
    Avg,
    Min,
    Max,
    Median,
    Mode,
    Percentage,
}

impl AggregateFn {
    /// Parse an aggregate name case-insensitively ("MEAN" is an alias for AVG).
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "COUNT" => Ok(Self::Count),
            "DISTINCT_COUNT" => Ok(Self::DistinctCount),
            "SUM" => Ok(Self::Sum),
            "AVG" | "MEAN" => Ok(Self::Avg),
            "MIN" => Ok(Self::Min),
            "MAX" => Ok(Self::Max),
            "MEDIAN" => Ok(Self::Median),
            "MODE" => Ok(Self::Mode),
            "PERCENTAGE" => Ok(Self::Percentage),
            other => Err(anyhow!("Unknown aggregate function '{}'", other)),
        }
    }

    /// True for functions that reduce a specific value column and therefore
    /// require an `aggregate_column` in a chart spec.
    pub fn needs_value_column(self) -> bool {
        matches!(
            self,
            Self::Sum | Self::Avg | Self::Min | Self::Max | Self::Median | Self::Mode
        )
    }
}

/// Label under which a row is grouped. Missing/null/empty values land in the
/// designated "unknown" bucket; everything else is stringified.
pub fn group_label(value: Option<&serde_json::Value>) -> String {
    use serde_json::Value;
    match value {
        None | Some(Value::Null) => MISSING_GROUP_LABEL.to_string(),
        Some(Value::String(s)) if s.is_empty() => MISSING_GROUP_LABEL.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Partition rows by a grouping column. The returned key list is in
/// first-appearance order of each group in the row sequence (never sorted).
pub fn partition<'a>(
    rows: &'a [Row],
    group_column: &str,
) -> (Vec<String>, HashMap<String, Vec<&'a Row>>) {
    let mut keys: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<&'a Row>> = HashMap::new();

    for row in rows {
        let key = group_label(row.get(group_column));
        if !groups.contains_key(&key) {
            keys.push(key.clone());
        }
        groups.entry(key).or_default().push(row);
    }

    (keys, groups)
}

/// Reduce one group of rows to a single value.
///
/// `value_column` of None means "all": COUNT/DISTINCT_COUNT/PERCENTAGE fall
/// back to row-count semantics, numeric functions see an empty input set.
/// `total_rows` is the full dataset row count, used only by PERCENTAGE.
pub fn aggregate(
    rows: &[&Row],
    value_column: Option<&str>,
    function: AggregateFn,
    total_rows: usize,
) -> serde_json::Value {
    match function {
        AggregateFn::Count => serde_json::Value::from(rows.len()),
        AggregateFn::Percentage => {
            if total_rows == 0 {
                number_value(0.0)
            } else {
                number_value(100.0 * rows.len() as f64 / total_rows as f64)
            }
        }
        AggregateFn::DistinctCount => distinct_count(rows, value_column),
        AggregateFn::Mode => mode(rows, value_column),
        AggregateFn::Sum => number_value(numeric_values(rows, value_column).iter().sum()),
        AggregateFn::Avg => {
            let values = numeric_values(rows, value_column);
            if values.is_empty() {
                number_value(0.0)
            } else {
                number_value(values.iter().sum::<f64>() / values.len() as f64)
            }
        }
        AggregateFn::Min => {
            // Empty input set yields 0 (documented constant, not null).
            match numeric_values(rows, value_column).into_iter().reduce(f64::min) {
                Some(v) => number_value(v),
                None => number_value(0.0),
            }
        }
        AggregateFn::Max => {
            match numeric_values(rows, value_column).into_iter().reduce(f64::max) {
                Some(v) => number_value(v),
                None => number_value(0.0),
            }
        }
        AggregateFn::Median => median(&mut numeric_values(rows, value_column)),
    }
}

/// Numeric-coerced values of a column within a group; values that fail
/// coercion are dropped, not treated as zero.
fn numeric_values(rows: &[&Row], value_column: Option<&str>) -> Vec<f64> {
    let Some(column) = value_column else {
        return Vec::new();
    };
    rows.iter()
        .filter_map(|row| row.get(column))
        .filter_map(coerce_number)
        .collect()
}

fn distinct_count(rows: &[&Row], value_column: Option<&str>) -> serde_json::Value {
    let Some(column) = value_column else {
        // "all": every row is its own distinct entry.
        return serde_json::Value::from(rows.len());
    };
    let mut seen: HashSet<String> = HashSet::new();
    for row in rows {
        match row.get(column) {
            None | Some(serde_json::Value::Null) => {}
            Some(value) => {
                seen.insert(group_label(Some(value)));
            }
        }
    }
    serde_json::Value::from(seen.len())
}

/// Most frequent raw value; ties broken by first-encountered order. Empty
/// input yields 0. The one aggregate whose output may be non-numeric.
fn mode(rows: &[&Row], value_column: Option<&str>) -> serde_json::Value {
    let Some(column) = value_column else {
        return serde_json::Value::from(0);
    };

    let mut counts: Vec<(&serde_json::Value, usize)> = Vec::new();
    for row in rows {
        match row.get(column) {
            None | Some(serde_json::Value::Null) => {}
            Some(value) => {
                if let Some(entry) = counts.iter_mut().find(|(v, _)| *v == value) {
                    entry.1 += 1;
                } else {
                    counts.push((value, 1));
                }
            }
        }
    }

    let mut best: Option<(&serde_json::Value, usize)> = None;
    for (value, count) in counts {
        // Strictly-greater keeps the first-encountered value on ties.
        if best.map_or(true, |(_, n)| count > n) {
            best = Some((value, count));
        }
    }

    match best {
        Some((value, _)) => value.clone(),
        None => serde_json::Value::from(0),
    }
}

/// Middle value of the sorted set; average of the two middle values when the
/// count is even. Empty input yields 0.
fn median(values: &mut Vec<f64>) -> serde_json::Value {
    if values.is_empty() {
        return number_value(0.0);
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = values.len();
    let mid = n / 2;
    let result = if n % 2 == 1 {
        values[mid]
    } else {
        (values[mid - 1] + values[mid]) / 2.0
    };
    number_value(result)
}
