//! CLI binary for votergrid.
//!
//! A thin shim over the library crate: loads the grid configuration JSON,
//! runs the extraction, writes CSV or JSON output and prints a stats
//! summary. Cloud providers are not wired here — the CLI runs on the
//! embedded text layer, which covers digitally-produced rolls; service
//! deployments inject their OCR/vision backends through the library API.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use votergrid::{extract, sink, ExtractionConfig, ExtractionOutput, Providers};

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

/// Extract structured voter records from grid-laid-out scanned PDF rolls.
#[derive(Parser, Debug)]
#[command(name = "votergrid", version, about)]
struct Cli {
    /// PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Grid/cell-template configuration (JSON).
    #[arg(short, long, value_name = "FILE")]
    config: PathBuf,

    /// Output file; stdout when omitted.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,

    /// Suppress the stats summary on stderr.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config_json = std::fs::read_to_string(&cli.config)
        .with_context(|| format!("reading config file {}", cli.config.display()))?;
    let config = ExtractionConfig::from_json(&config_json).context("parsing configuration")?;

    let providers = Providers::new();
    let output = extract(&cli.input, &config, &providers)
        .await
        .context("extraction failed")?;

    write_output(&cli, &output)?;

    if !cli.quiet {
        print_summary(&output);
    }

    Ok(())
}

fn write_output(cli: &Cli, output: &ExtractionOutput) -> Result<()> {
    match (&cli.output, cli.format) {
        (Some(path), OutputFormat::Csv) => {
            sink::write_csv_file(&output.extracted_data, path)
                .with_context(|| format!("writing {}", path.display()))?;
        }
        (Some(path), OutputFormat::Json) => {
            let json = serde_json::to_string_pretty(output)?;
            std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        }
        (None, OutputFormat::Csv) => {
            use votergrid::RecordSink;
            let mut csv_sink = votergrid::CsvSink::new(std::io::stdout().lock());
            csv_sink.write_records(&output.extracted_data)?;
        }
        (None, OutputFormat::Json) => {
            println!("{}", serde_json::to_string_pretty(output)?);
        }
    }
    Ok(())
}

fn print_summary(output: &ExtractionOutput) {
    let s = &output.stats;
    eprintln!();
    eprintln!(
        "{} {}",
        green("✓"),
        bold(&format!(
            "{} records from {} cells ({} skipped)",
            s.records_extracted, s.total_cells, s.cells_skipped
        ))
    );
    eprintln!(
        "  {}",
        dim(&format!(
            "text layer: {}  local OCR: {}  cloud: {}  photos: {}",
            s.text_layer_fields, s.local_ocr_fields, s.cloud_ocr_fields, s.photos_extracted
        ))
    );
    eprintln!(
        "  {}",
        dim(&format!(
            "accuracy: {:.2}%  time: {:.2}s",
            s.accuracy_rate, s.extraction_time_seconds
        ))
    );
}
