// Column type inference: classify each column as numeric, date, or
// categorical by sampling the first rows of the dataset.

use crate::data::{coerce_number, ReportData};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::sync::LazyLock;

/// How many leading rows contribute to classification. Rows beyond this
/// never change the result.
pub const SAMPLE_ROWS: usize = 10;

/// Column-name fragments that mark a column as date-like for the keyword
/// fallback (matched against the lower-cased name).
const DATE_KEYWORDS: [&str; 6] = ["date", "time", "created", "updated", "modified", "timestamp"];

// Shape-only date patterns. DD/MM/YYYY vs MM/DD/YYYY is inherently ambiguous
// and matched as a shape without locale disambiguation.
static DATE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^\d{4}-\d{2}-\d{2}( \d{2}:\d{2}:\d{2})?$", // YYYY-MM-DD [HH:MM:SS]
        r"^\d{1,2}-[A-Za-z]{3}-\d{4}$",              // DD-MMM-YYYY
        r"^\d{1,2}/[A-Za-z]{3}/\d{4}$",              // DD/MMM/YYYY
        r"^\d{1,2}/\d{1,2}/\d{4}$",                  // DD/MM/YYYY or MM/DD/YYYY
        r"^\d{4}/\d{1,2}/\d{1,2}$",                  // YYYY/MM/DD
        r"^\d{1,2}-\d{1,2}-\d{4}$",                  // D-M-YYYY
        r"^[A-Za-z]{3} \d{1,2}, \d{4}$",             // MMM D, YYYY
        r"^\d{1,2} [A-Za-z]{3} \d{4}$",              // D MMM YYYY
    ]
    .iter()
    .map(|p| Regex::new(p).expect("date pattern must compile"))
    .collect()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Numeric,
    Date,
    Categorical,
}

/// Inferred type for one column, plus the first row's raw value as a
/// display sample (may be null; never feeds back into classification).
#[derive(Debug, Clone, Serialize)]
pub struct ColumnProfile {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub sample: Value,
}

/// Infer a type per column. Columns are the keys of the first row, in that
/// row's key order.
pub fn infer_column_types(data: &ReportData) -> Vec<ColumnProfile> {
    let first = &data.rows[0];
    first
        .keys()
        .map(|name| ColumnProfile {
            name: name.clone(),
            column_type: classify_column(data, name),
            sample: first.get(name).cloned().unwrap_or(Value::Null),
        })
        .collect()
}

/// Look up the inferred type of a single column; None if the column is not
/// part of the first row.
pub fn column_type(data: &ReportData, name: &str) -> Option<ColumnType> {
    if !data.rows[0].contains_key(name) {
        return None;
    }
    Some(classify_column(data, name))
}

fn classify_column(data: &ReportData, name: &str) -> ColumnType {
    let keyword = has_date_keyword(name);
    let mut total = 0usize;
    let mut numeric = 0usize;
    let mut date = 0usize;

    for row in data.rows.iter().take(SAMPLE_ROWS) {
        let Some(value) = row.get(name) else { continue };
        if value.is_null() {
            continue;
        }
        if matches!(value, Value::String(s) if s.is_empty()) {
            continue;
        }

        total += 1;

        // Each sampled value is classified exactly once: numeric wins over
        // date, date is only tested for non-numeric strings.
        if coerce_number(value).is_some() {
            numeric += 1;
        } else if let Value::String(s) = value {
            if matches_date_pattern(s) || (keyword && parses_as_datetime(s)) {
                date += 1;
            }
        }
    }

    if total == 0 {
        return ColumnType::Categorical;
    }

    let total = total as f64;
    if numeric as f64 / total > 0.5 {
        ColumnType::Numeric
    } else if date as f64 / total > 0.5 {
        ColumnType::Date
    } else if date > 0 && keyword {
        ColumnType::Date
    } else {
        ColumnType::Categorical
    }
}

fn has_date_keyword(name: &str) -> bool {
    let lower = name.to_lowercase();
    DATE_KEYWORDS.iter().any(|k| lower.contains(k))
}

fn matches_date_pattern(s: &str) -> bool {
    DATE_PATTERNS.iter().any(|p| p.is_match(s))
}

/// General-purpose fallback parse used only behind the column-name keyword:
/// RFC 3339, RFC 2822, or a set of common date/datetime formats.
fn parses_as_datetime(s: &str) -> bool {
    let trimmed = s.trim();
    if DateTime::parse_from_rfc3339(trimmed).is_ok() || DateTime::parse_from_rfc2822(trimmed).is_ok()
    {
        return true;
    }

    const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
    const DATE_FORMATS: [&str; 7] = [
        "%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d", "%d-%b-%Y", "%b %d, %Y", "%d %b %Y",
    ];

    DATETIME_FORMATS
        .iter()
        .any(|f| NaiveDateTime::parse_from_str(trimmed, f).is_ok())
        || DATE_FORMATS
            .iter()
            .any(|f| NaiveDate::parse_from_str(trimmed, f).is_ok())
}
