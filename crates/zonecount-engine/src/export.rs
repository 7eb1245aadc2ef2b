//! Report serialization: pretty JSON and the flat CSV export.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use zonecount_models::report::TABULAR_HEADER;
use zonecount_models::TrackingReport;

use crate::error::EngineResult;

/// Write the report as pretty-printed JSON.
pub fn write_json(report: &TrackingReport, path: &Path) -> EngineResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Write the tabular export: one row per person and consolidated visit.
pub fn write_csv(report: &TrackingReport, path: &Path) -> EngineResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(to_csv(report).as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Render the tabular export in memory.
pub fn to_csv(report: &TrackingReport) -> String {
    let mut out = String::new();
    push_row(&mut out, TABULAR_HEADER.iter().copied());
    for row in report.tabular_rows() {
        push_row(&mut out, row.iter().map(String::as_str));
    }
    out
}

fn push_row<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>) {
    for (i, field) in fields.enumerate() {
        if i > 0 {
            out.push(',');
        }
        push_field(out, field);
    }
    out.push_str("\r\n");
}

/// Quote a field when it contains a delimiter, quote or line break.
fn push_field(out: &mut String, field: &str) {
    if field.contains([',', '"', '\n', '\r']) {
        out.push('"');
        out.push_str(&field.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(field);
    }
}
