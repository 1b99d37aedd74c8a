//! Report output: logs, JSON files and a CSV summary that grows by one row
//! per rule per run.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::results::ValidationReport;
use crate::rules::Severity;
use csv::WriterBuilder;
use std::fs::{File, OpenOptions};
use std::io::BufWriter;
use std::path::Path;

/// Logs the report using Rust's debug pretty-print format.
pub fn print_pretty(report: &ValidationReport) {
    debug!("{:#?}", report);
}

/// Logs the report as pretty-printed JSON.
pub fn print_json(report: &ValidationReport) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

/// Writes the report as pretty-printed JSON, replacing any existing file.
pub fn write_json(path: impl AsRef<Path>, report: &ValidationReport) -> Result<()> {
    let path = path.as_ref();
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, report)?;
    debug!(path = %path.display(), "Wrote JSON report");
    Ok(())
}

/// One CSV row: a rule hit during one validation run.
#[derive(Debug, Serialize)]
struct SummaryRow<'a> {
    generated_at: DateTime<Utc>,
    header_timestamp: Option<u64>,
    rule_id: &'a str,
    severity: Severity,
    title: &'a str,
    occurrence_count: usize,
}

/// Appends one row per rule with occurrences to a CSV file.
///
/// Creates the file with headers if it does not already exist. A clean run
/// appends nothing.
pub fn append_record(path: &str, report: &ValidationReport) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, "Appending CSV records");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    for (rule, occurrences) in report.result.iter() {
        writer.serialize(SummaryRow {
            generated_at: report.generated_at,
            header_timestamp: report.summary.header_timestamp,
            rule_id: rule.id,
            severity: rule.severity,
            title: rule.title,
            occurrence_count: occurrences.len(),
        })?;
    }
    writer.flush()?;

    Ok(())
}
