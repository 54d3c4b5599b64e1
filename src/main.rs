mod aggregate;
mod analyze;
mod chart;
mod csv_reader;
mod data;
mod infer;

use anyhow::{anyhow, Context, Result};
use chart::ChartSpec;
use clap::{Parser, ValueEnum};
use data::ReportData;
use serde_json::json;
use std::io::{self, Read, Write};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum InputFormat {
    Json,
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "reportgraph")]
#[command(about = "Infer column types and compute chart series from report rows", long_about = None)]
struct Args {
    /// Chart configurations as a JSON array
    /// (e.g., '[{"chart_type":"count_chart","column":"partyType"}]')
    configs: Option<String>,

    /// Print the inferred column report instead of building charts
    #[arg(long)]
    columns: bool,

    /// Format of the report rows read from stdin
    #[arg(long, value_enum, default_value = "json")]
    format: InputFormat,
}

fn main() {
    if let Err(e) = run() {
        // Request-level failures surface as a single top-level JSON error.
        eprintln!("{}", json!({"error": e.to_string()}));
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    let data = match args.format {
        InputFormat::Json => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read report data from stdin")?;
            let value = serde_json::from_str(&input).context("report_data is not valid JSON")?;
            ReportData::from_json(&value)?
        }
        InputFormat::Csv => {
            csv_reader::read_rows_from_stdin().context("Failed to read CSV from stdin")?
        }
    };

    let response = if args.columns {
        analyze::describe_columns(&data)
    } else {
        let configs_text = args
            .configs
            .ok_or_else(|| anyhow!("Chart configurations are required unless --columns is set"))?;
        let configs: Vec<ChartSpec> =
            serde_json::from_str(&configs_text).context("chart_configs is not valid JSON")?;
        serde_json::to_value(analyze::analyze(&data, &configs)?)
            .context("Failed to serialize response")?
    };

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    serde_json::to_writer(&mut handle, &response).context("Failed to write response")?;
    handle.write_all(b"\n").context("Failed to write response")?;
    handle.flush().context("Failed to flush stdout")?;

    Ok(())
}
