// src/export/mod.rs

use csv::WriterBuilder;
use std::io::Write;

use crate::metadata::VectorMetadata;
use crate::pivot::{YearlyRecord, YEAR};
use crate::projects_map::ProjectLocation;
use crate::table::Row;

/// Write `records` as a CSV table with the given column order. `year` is a
/// valid column name; absent cells are left empty.
pub fn write_yearly<W: Write>(
    out: W,
    columns: &[String],
    records: &[YearlyRecord],
) -> csv::Result<()> {
    let mut wtr = WriterBuilder::new().from_writer(out);
    wtr.write_record(columns)?;
    for rec in records {
        let line = columns.iter().map(|col| {
            if col == YEAR {
                rec.year.to_string()
            } else {
                rec.get(col).map(|v| v.to_string()).unwrap_or_default()
            }
        });
        wtr.write_record(line)?;
    }
    wtr.flush()?;
    Ok(())
}

/// [`write_yearly`] into a string, for the "download data" button.
pub fn yearly_to_string(columns: &[String], records: &[YearlyRecord]) -> csv::Result<String> {
    let mut buf = Vec::new();
    write_yearly(&mut buf, columns, records)?;
    String::from_utf8(buf)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e).into())
}

/// Write raw source rows back out under `headers`.
pub fn write_rows<W: Write>(out: W, headers: &[String], rows: &[&Row]) -> csv::Result<()> {
    let mut wtr = WriterBuilder::new().from_writer(out);
    wtr.write_record(headers)?;
    for row in rows {
        wtr.write_record(
            headers
                .iter()
                .map(|h| row.get(h).map(|c| c.to_string()).unwrap_or_default()),
        )?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_metadata<W: Write>(out: W, entries: &[VectorMetadata]) -> csv::Result<()> {
    let mut wtr = WriterBuilder::new().from_writer(out);
    for entry in entries {
        wtr.serialize(entry)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Map projects in the exporter's column order; missing numbers stay empty.
pub fn write_project_locations<W: Write>(out: W, projects: &[&ProjectLocation]) -> csv::Result<()> {
    let mut wtr = WriterBuilder::new().from_writer(out);
    for project in projects {
        wtr.serialize(project)?;
    }
    wtr.flush()?;
    Ok(())
}
