// Chart data builder: dispatch on chart_type and shape the aggregated
// series each chart needs for rendering.

use crate::aggregate::{aggregate, group_label, partition, AggregateFn};
use crate::data::{coerce_number, number_value, ReportData};
use crate::infer::{column_type, ColumnType};
use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Declarative request for one chart. Only `chart_type` is mandatory; the
/// builder validates the rest per chart kind.
#[derive(Debug, Clone, Deserialize)]
pub struct ChartSpec {
    pub chart_type: String,
    #[serde(default)]
    pub column: Option<String>,
    #[serde(default)]
    pub x_column: Option<String>,
    #[serde(default)]
    pub y_column: Option<String>,
    #[serde(default)]
    pub group_column: Option<String>,
    #[serde(default)]
    pub series_column: Option<String>,
    #[serde(default)]
    pub aggregate: Option<String>,
    #[serde(default)]
    pub aggregate_column: Option<String>,
    #[serde(default)]
    pub line_mode: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub x_label: Option<String>,
    #[serde(default)]
    pub y_label: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Point {
    pub x: Value,
    pub y: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeriesData {
    pub label: String,
    pub data: Vec<Value>,
}

/// Renderer-agnostic chart payload.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ChartData {
    Series {
        labels: Vec<String>,
        values: Vec<Value>,
    },
    Points {
        points: Vec<Point>,
        #[serde(skip_serializing_if = "Option::is_none")]
        x_is_date: Option<bool>,
    },
    Grouped {
        labels: Vec<String>,
        datasets: Vec<SeriesData>,
    },
}

/// Result for one requested chart: a data payload or an error message,
/// never both.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ChartResult {
    Success {
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        chart_type: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        x_label: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        y_label: Option<String>,
        data: ChartData,
    },
    Failure { error: String },
}

/// Build the data payload for one chart spec against the dataset.
pub fn build_chart(data: &ReportData, spec: &ChartSpec) -> Result<ChartData> {
    let chart_type = spec.chart_type.to_lowercase();
    match chart_type.as_str() {
        "count_chart" => {
            let column = require(&spec.column, "column", &chart_type)?;
            check_column(data, column)?;
            Ok(aggregated_series(data, column, None, AggregateFn::Count))
        }
        "bar_chart" | "pie_chart" => {
            let column = require(&spec.column, "column", &chart_type)?;
            check_column(data, column)?;
            let function = parse_aggregate(spec, &chart_type)?;
            let value_column = resolve_value_column(data, spec, function, &chart_type)?;
            Ok(aggregated_series(data, column, value_column, function))
        }
        "line_chart" => build_line_chart(data, spec, &chart_type),
        "xy_chart" | "scatter_chart" => {
            let x_column = require(&spec.x_column, "x_column", &chart_type)?;
            let y_column = require(&spec.y_column, "y_column", &chart_type)?;
            check_column(data, x_column)?;
            check_column(data, y_column)?;
            let x_is_date = column_type(data, x_column) == Some(ColumnType::Date);
            let points = extract_points(data, x_column, y_column, x_is_date);
            Ok(ChartData::Points {
                points,
                x_is_date: Some(x_is_date),
            })
        }
        "grouped_bar_chart" => build_grouped_bar(data, spec, &chart_type),
        other => bail!("Unsupported chart type '{}'", other),
    }
}

fn build_line_chart(data: &ReportData, spec: &ChartSpec, chart_type: &str) -> Result<ChartData> {
    let x_column = require(&spec.x_column, "x_column", chart_type)?;
    let y_column = require(&spec.y_column, "y_column", chart_type)?;
    check_column(data, x_column)?;
    check_column(data, y_column)?;

    let aggregated = match spec.line_mode.as_deref() {
        Some("aggregated") => true,
        Some("raw") => false,
        Some(other) => bail!("Unknown line_mode '{}' (expected 'raw' or 'aggregated')", other),
        None => spec.aggregate.is_some(),
    };

    if aggregated {
        let function = parse_aggregate(spec, chart_type)?;
        Ok(aggregated_series(data, x_column, Some(y_column), function))
    } else {
        // Raw mode: one point per row with both values present, in row order.
        let points = extract_points(data, x_column, y_column, false);
        Ok(ChartData::Points {
            points,
            x_is_date: None,
        })
    }
}

fn build_grouped_bar(data: &ReportData, spec: &ChartSpec, chart_type: &str) -> Result<ChartData> {
    let group_column = require(&spec.group_column, "group_column", chart_type)?;
    let series_column = require(&spec.series_column, "series_column", chart_type)?;
    check_column(data, group_column)?;
    check_column(data, series_column)?;
    let function = parse_aggregate(spec, chart_type)?;
    let value_column = resolve_value_column(data, spec, function, chart_type)?;

    // Two-level grouping, both levels in first-appearance order.
    let mut group_keys: Vec<String> = Vec::new();
    let mut series_keys: Vec<String> = Vec::new();
    let mut cells: HashMap<(String, String), Vec<&crate::data::Row>> = HashMap::new();

    for row in &data.rows {
        let group = group_label(row.get(group_column));
        let series = group_label(row.get(series_column));
        if !group_keys.contains(&group) {
            group_keys.push(group.clone());
        }
        if !series_keys.contains(&series) {
            series_keys.push(series.clone());
        }
        cells.entry((group, series)).or_default().push(row);
    }

    let total = data.len();
    let datasets = series_keys
        .into_iter()
        .map(|series| {
            let values = group_keys
                .iter()
                .map(|group| {
                    // A (group, series) cell with no rows still gets an
                    // explicit 0, never an omitted entry.
                    match cells.get(&(group.clone(), series.clone())) {
                        Some(rows) => aggregate(rows, value_column, function, total),
                        None => number_value(0.0),
                    }
                })
                .collect();
            SeriesData {
                label: series,
                data: values,
            }
        })
        .collect();

    Ok(ChartData::Grouped {
        labels: group_keys,
        datasets,
    })
}

/// Group by a column and reduce each group, labels in first-appearance order.
fn aggregated_series(
    data: &ReportData,
    group_column: &str,
    value_column: Option<&str>,
    function: AggregateFn,
) -> ChartData {
    let (keys, groups) = partition(&data.rows, group_column);
    let total = data.len();
    let values = keys
        .iter()
        .map(|key| aggregate(&groups[key], value_column, function, total))
        .collect();
    ChartData::Series {
        labels: keys,
        values,
    }
}

/// One point per row with both columns present and a numeric-coercible y.
/// Numeric x passes through; a date-typed string x passes through verbatim;
/// any other string x maps to a first-appearance index.
fn extract_points(data: &ReportData, x_column: &str, y_column: &str, date_x: bool) -> Vec<Point> {
    let mut points = Vec::new();
    let mut x_indices: HashMap<String, usize> = HashMap::new();

    for row in &data.rows {
        let (Some(x_val), Some(y_val)) = (row.get(x_column), row.get(y_column)) else {
            continue;
        };
        if x_val.is_null() || y_val.is_null() {
            continue;
        }
        let Some(y) = coerce_number(y_val) else {
            continue;
        };

        let x = if let Some(n) = coerce_number(x_val) {
            number_value(n)
        } else if date_x && x_val.is_string() {
            x_val.clone()
        } else {
            let key = group_label(Some(x_val));
            let next = x_indices.len();
            let index = *x_indices.entry(key).or_insert(next);
            Value::from(index)
        };

        points.push(Point {
            x,
            y: number_value(y),
        });
    }

    points
}

fn require<'a>(field: &'a Option<String>, name: &str, chart_type: &str) -> Result<&'a str> {
    field
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| anyhow!("Field '{}' is required for {}", name, chart_type))
}

fn check_column(data: &ReportData, name: &str) -> Result<()> {
    if data.rows[0].contains_key(name) {
        Ok(())
    } else {
        Err(anyhow!("Column '{}' not found in report data", name))
    }
}

fn parse_aggregate(spec: &ChartSpec, chart_type: &str) -> Result<AggregateFn> {
    let raw = require(&spec.aggregate, "aggregate", chart_type)?;
    AggregateFn::parse(raw)
}

/// Resolve the aggregate target column. "all" (or absence, for the
/// row-count-style functions) means no value column.
fn resolve_value_column<'a>(
    data: &ReportData,
    spec: &'a ChartSpec,
    function: AggregateFn,
    chart_type: &str,
) -> Result<Option<&'a str>> {
    match spec.aggregate_column.as_deref() {
        Some("all") | Some("") | None => {
            if function.needs_value_column() {
                bail!("Field 'aggregate_column' is required for {} with this aggregate", chart_type);
            }
            Ok(None)
        }
        Some(column) => {
            check_column(data, column)?;
            Ok(Some(column))
        }
    }
}
