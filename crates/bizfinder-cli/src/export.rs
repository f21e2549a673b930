//! Writes search results to CSV or JSON files.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use bizfinder_core::BusinessRecord;
use clap::ValueEnum;

const CSV_HEADERS: [&str; 10] = [
    "name",
    "address",
    "phone",
    "website",
    "rating",
    "total_ratings",
    "is_open_now",
    "place_id",
    "latitude",
    "longitude",
];

const MISSING: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub(crate) fn default_file_name(self) -> &'static str {
        match self {
            ExportFormat::Csv => "business_results.csv",
            ExportFormat::Json => "business_results.json",
        }
    }
}

/// Write `records` to `path`. Returns `false` without touching the
/// filesystem when there is nothing to write.
pub(crate) fn export(
    path: &Path,
    format: ExportFormat,
    records: &[BusinessRecord],
) -> anyhow::Result<bool> {
    if records.is_empty() {
        return Ok(false);
    }

    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    match format {
        ExportFormat::Csv => write_csv(&mut writer, records)?,
        ExportFormat::Json => write_json(&mut writer, records)?,
    }
    writer
        .flush()
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(true)
}

pub(crate) fn write_csv<W: Write>(writer: W, records: &[BusinessRecord]) -> anyhow::Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(CSV_HEADERS)?;
    for record in records {
        csv.write_record(csv_row(record))?;
    }
    csv.flush()?;
    Ok(())
}

pub(crate) fn write_json<W: Write>(writer: W, records: &[BusinessRecord]) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(writer, records).context("failed to serialize results")
}

fn csv_row(record: &BusinessRecord) -> [String; 10] {
    fn text(value: Option<&String>) -> String {
        value
            .filter(|v| !v.trim().is_empty())
            .map_or_else(|| MISSING.to_owned(), Clone::clone)
    }
    fn number<T: ToString>(value: Option<T>) -> String {
        value.map_or_else(|| MISSING.to_owned(), |v| v.to_string())
    }

    let open_now = match record.is_open_now {
        Some(true) => "Yes",
        Some(false) => "No",
        None => MISSING,
    };

    [
        text(record.name.as_ref()),
        text(record.address.as_ref()),
        text(record.phone.as_ref()),
        text(record.website.as_ref()),
        number(record.rating),
        number(record.review_count),
        open_now.to_owned(),
        record.place_id.clone(),
        number(record.location.map(|c| c.latitude)),
        number(record.location.map(|c| c.longitude)),
    ]
}
