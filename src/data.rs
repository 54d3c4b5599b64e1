use anyhow::{anyhow, Result};
use serde_json::{Map, Value};

/// One report row: column name -> scalar JSON value.
pub type Row = Map<String, Value>;

/// An ordered set of report rows. Row order is preserved throughout: it
/// defines first-row column semantics, first-appearance group order, and
/// raw-mode point order.
#[derive(Debug, Clone)]
pub struct ReportData {
    pub rows: Vec<Row>,
}

impl ReportData {
    /// Validate a row set: it must be non-empty and its first row must carry
    /// at least one column.
    pub fn new(rows: Vec<Row>) -> Result<Self> {
        if rows.is_empty() {
            return Err(anyhow!("No report data supplied"));
        }
        if rows[0].is_empty() {
            return Err(anyhow!("First row of report data has no columns"));
        }
        Ok(Self { rows })
    }

    /// Create ReportData from a JSON array of flat objects
    pub fn from_json(value: &Value) -> Result<Self> {
        let array = value
            .as_array()
            .ok_or_else(|| anyhow!("report_data must be a JSON array of objects"))?;

        let mut rows = Vec::with_capacity(array.len());
        for item in array {
            let obj = item
                .as_object()
                .ok_or_else(|| anyhow!("Items in report_data must be objects"))?;

            for (key, val) in obj {
                if val.is_array() || val.is_object() {
                    return Err(anyhow!("Unsupported nested value for field '{}'", key));
                }
            }
            rows.push(obj.clone());
        }

        Self::new(rows)
    }

    /// Column names, taken from the first row in its key order.
    pub fn columns(&self) -> Vec<String> {
        self.rows[0].keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Coerce a scalar value to a finite float. Numeric strings count as numbers;
/// anything that fails to parse yields None (callers drop it, never zero it).
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok().filter(|f| f.is_finite())
        }
        _ => None,
    }
}

/// Wrap a float as a JSON number, collapsing integral values to integers so
/// counts and integer sums serialize without a trailing ".0".
pub fn number_value(n: f64) -> Value {
    const MAX_SAFE_INT: f64 = 9_007_199_254_740_992.0;
    if n.fract() == 0.0 && n.abs() < MAX_SAFE_INT {
        Value::from(n as i64)
    } else {
        Value::from(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_basic() {
        let value = json!([{"a": 1, "b": "x"}, {"a": 2, "b": "y"}]);
        let data = ReportData::from_json(&value).unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data.columns(), vec!["a", "b"]);
    }

    #[test]
    fn test_from_json_preserves_key_order() {
        let value = json!([{"zeta": 1, "alpha": 2, "mid": 3}]);
        let data = ReportData::from_json(&value).unwrap();
        assert_eq!(data.columns(), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_from_json_not_array() {
        let result = ReportData::from_json(&json!({"a": 1}));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("array"));
    }

    #[test]
    fn test_from_json_empty_array() {
        let result = ReportData::from_json(&json!([]));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("No report data"));
    }

    #[test]
    fn test_from_json_empty_first_row() {
        let result = ReportData::from_json(&json!([{}]));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("no columns"));
    }

    #[test]
    fn test_from_json_non_object_item() {
        let result = ReportData::from_json(&json!([1, 2, 3]));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("objects"));
    }

    #[test]
    fn test_from_json_nested_value_rejected() {
        let result = ReportData::from_json(&json!([{"a": [1, 2]}]));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("nested"));
    }

    #[test]
    fn test_coerce_number_variants() {
        assert_eq!(coerce_number(&json!(3)), Some(3.0));
        assert_eq!(coerce_number(&json!(2.5)), Some(2.5));
        assert_eq!(coerce_number(&json!("42")), Some(42.0));
        assert_eq!(coerce_number(&json!("-1.5")), Some(-1.5));
        assert_eq!(coerce_number(&json!("+7")), Some(7.0));
        assert_eq!(coerce_number(&json!(" 10 ")), Some(10.0));
        assert_eq!(coerce_number(&json!("1e3")), Some(1000.0));
    }

    #[test]
    fn test_coerce_number_rejects_non_numeric() {
        assert_eq!(coerce_number(&json!("abc")), None);
        assert_eq!(coerce_number(&json!("")), None);
        assert_eq!(coerce_number(&json!(null)), None);
        assert_eq!(coerce_number(&json!(true)), None);
        assert_eq!(coerce_number(&json!("inf")), None);
        assert_eq!(coerce_number(&json!("NaN")), None);
    }

    #[test]
    fn test_number_value_integral_collapse() {
        assert_eq!(number_value(30.0), json!(30));
        assert_eq!(number_value(-5.0), json!(-5));
        assert_eq!(number_value(2.5), json!(2.5));
    }
}
