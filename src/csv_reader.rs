// CSV ingestion: an alternative source of report rows. Every cell arrives
// as a string; type inference and numeric coercion handle the rest.

use crate::data::{ReportData, Row};
use anyhow::{Context, Result};
use serde_json::Value;
use std::io::{self, Read};

pub fn read_rows_from_reader<R: Read>(reader: R) -> Result<ReportData> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let headers = csv_reader
        .headers()
        .context("Failed to read CSV headers")?
        .clone();

    let mut rows = Vec::new();
    for (idx, record) in csv_reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to parse CSV row {}", idx + 1))?;
        let mut row = Row::new();
        for (header, field) in headers.iter().zip(record.iter()) {
            row.insert(header.to_string(), Value::String(field.to_string()));
        }
        rows.push(row);
    }

    ReportData::new(rows)
}

pub fn read_rows_from_stdin() -> Result<ReportData> {
    read_rows_from_reader(io::stdin())
}
