// Orchestrator: run every requested chart spec independently and assemble
// the response, plus the read-only column-report projection.

use crate::chart::{build_chart, ChartResult, ChartSpec};
use crate::data::ReportData;
use crate::infer::infer_column_types;
use anyhow::{bail, Result};
use serde::Serialize;
use serde_json::{json, Map, Value};

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub charts: Vec<ChartResult>,
    pub report_count: usize,
}

/// Run each chart spec in input order. A failing chart becomes an error
/// entry at its position and never aborts the rest of the batch.
pub fn analyze(data: &ReportData, configs: &[ChartSpec]) -> Result<AnalysisResponse> {
    if configs.is_empty() {
        bail!("chart_configs must be a non-empty array");
    }

    let charts = configs
        .iter()
        .map(|spec| match build_chart(data, spec) {
            Ok(chart_data) => ChartResult::Success {
                title: spec.title.clone(),
                chart_type: spec.chart_type.to_lowercase(),
                x_label: spec.x_label.clone(),
                y_label: spec.y_label.clone(),
                data: chart_data,
            },
            Err(e) => ChartResult::Failure {
                error: e.to_string(),
            },
        })
        .collect();

    Ok(AnalysisResponse {
        charts,
        report_count: data.len(),
    })
}

/// Column report for building a chart-configuration UI: column names in
/// first-row order, inferred type plus display sample per column, row count.
pub fn describe_columns(data: &ReportData) -> Value {
    let profiles = infer_column_types(data);
    let columns: Vec<&str> = profiles.iter().map(|p| p.name.as_str()).collect();

    let mut column_types = Map::new();
    for profile in &profiles {
        column_types.insert(
            profile.name.clone(),
            json!({"type": profile.column_type, "sample": profile.sample}),
        );
    }

    json!({
        "columns": columns,
        "column_types": column_types,
        "row_count": data.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data_from(value: Value) -> ReportData {
        ReportData::from_json(&value).unwrap()
    }

    fn specs_from(value: Value) -> Vec<ChartSpec> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_batch_isolation() {
        // Spec 2 references a nonexistent column; specs 1 and 3 still succeed.
        let data = data_from(json!([
            {"type": "A", "amt": 10},
            {"type": "B", "amt": 5}
        ]));
        let configs = specs_from(json!([
            {"chart_type": "count_chart", "column": "type"},
            {"chart_type": "count_chart", "column": "missing"},
            {"chart_type": "bar_chart", "column": "type", "aggregate": "SUM", "aggregate_column": "amt"}
        ]));

        let response = analyze(&data, &configs).unwrap();
        assert_eq!(response.charts.len(), 3);
        assert_eq!(response.report_count, 2);
        assert!(matches!(response.charts[0], ChartResult::Success { .. }));
        assert!(matches!(response.charts[1], ChartResult::Failure { .. }));
        assert!(matches!(response.charts[2], ChartResult::Success { .. }));
    }

    #[test]
    fn test_report_count_with_all_failures() {
        let data = data_from(json!([{"a": 1}, {"a": 2}, {"a": 3}]));
        let configs = specs_from(json!([{"chart_type": "nope"}]));
        let response = analyze(&data, &configs).unwrap();
        assert_eq!(response.report_count, 3);
        assert!(matches!(response.charts[0], ChartResult::Failure { .. }));
    }

    #[test]
    fn test_empty_configs_rejected() {
        let data = data_from(json!([{"a": 1}]));
        let result = analyze(&data, &[]);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("chart_configs"));
    }

    #[test]
    fn test_result_never_mixes_data_and_error() {
        let data = data_from(json!([{"type": "A"}]));
        let configs = specs_from(json!([
            {"chart_type": "count_chart", "column": "type"},
            {"chart_type": "count_chart"}
        ]));
        let response = analyze(&data, &configs).unwrap();
        let serialized = serde_json::to_value(&response).unwrap();
        let charts = serialized["charts"].as_array().unwrap();
        assert!(charts[0].get("data").is_some());
        assert!(charts[0].get("error").is_none());
        assert!(charts[1].get("error").is_some());
        assert!(charts[1].get("data").is_none());
    }

    #[test]
    fn test_title_and_labels_pass_through_verbatim() {
        let data = data_from(json!([{"type": "A"}]));
        let configs = specs_from(json!([
            {"chart_type": "count_chart", "column": "type",
             "title": "Orders", "x_label": "Type", "y_label": "Count"},
            {"chart_type": "count_chart", "column": "type"}
        ]));
        let response = analyze(&data, &configs).unwrap();
        let serialized = serde_json::to_value(&response).unwrap();
        assert_eq!(serialized["charts"][0]["title"], json!("Orders"));
        assert_eq!(serialized["charts"][0]["x_label"], json!("Type"));
        // No auto-generated title on the second chart.
        assert!(serialized["charts"][1].get("title").is_none());
    }

    #[test]
    fn test_end_to_end_bar_sum() {
        let data = data_from(json!([
            {"type": "A", "amt": 10},
            {"type": "A", "amt": 20},
            {"type": "B", "amt": 5}
        ]));
        let configs = specs_from(json!([
            {"chart_type": "bar_chart", "column": "type",
             "aggregate": "SUM", "aggregate_column": "amt"}
        ]));
        let response = analyze(&data, &configs).unwrap();
        let serialized = serde_json::to_value(&response).unwrap();
        assert_eq!(
            serialized["charts"][0]["data"],
            json!({"labels": ["A", "B"], "values": [30, 5]})
        );
    }

    #[test]
    fn test_describe_columns_report() {
        let data = data_from(json!([
            {"name": "alice", "age": 30, "joined": "2024-01-15"},
            {"name": "bob", "age": 25, "joined": "2024-02-20"}
        ]));
        let report = describe_columns(&data);
        assert_eq!(report["columns"], json!(["name", "age", "joined"]));
        assert_eq!(report["row_count"], json!(2));
        assert_eq!(report["column_types"]["age"]["type"], json!("numeric"));
        assert_eq!(report["column_types"]["name"]["type"], json!("categorical"));
        assert_eq!(report["column_types"]["joined"]["type"], json!("date"));
        assert_eq!(report["column_types"]["age"]["sample"], json!(30));
    }
}
