use std::io;
use std::path::Path;

use csv::{Writer, WriterBuilder};

use crate::error::ReportError;
use crate::model::{AggregateTable, Cell, DerivedTable};

const DOCUMENT_HEADER: &str = "Document";
const REPORTS_HEADER: &str = "Reports";

fn write_derived<W: io::Write>(
    writer: &mut Writer<W>,
    table: &DerivedTable,
) -> Result<(), ReportError> {
    let mut headers = vec![DOCUMENT_HEADER.to_string()];
    headers.extend(table.columns.iter().cloned());
    writer.write_record(&headers)?;

    for row in &table.rows {
        let mut record = vec![row.document.clone()];
        record.extend(
            table
                .columns
                .iter()
                .map(|column| row.cells.get(column).map(Cell::render).unwrap_or_default()),
        );
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_aggregate<W: io::Write>(
    writer: &mut Writer<W>,
    table: &AggregateTable,
) -> Result<(), ReportError> {
    let mut headers = vec![table.group_by.clone(), REPORTS_HEADER.to_string()];
    headers.extend(table.columns.iter().cloned());
    headers.push(table.rank_column.clone());
    writer.write_record(&headers)?;

    for row in &table.rows {
        let mut record = vec![row.key.clone(), row.reports.to_string()];
        record.extend(table.columns.iter().map(|column| {
            row.values
                .get(column)
                .map(ToString::to_string)
                .unwrap_or_default()
        }));
        record.push(row.rank.to_string());
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn into_bytes(writer: Writer<Vec<u8>>) -> Result<Vec<u8>, ReportError> {
    writer
        .into_inner()
        .map_err(|error| ReportError::Csv(error.into_error().into()))
}

fn into_string(bytes: Vec<u8>) -> Result<String, ReportError> {
    String::from_utf8(bytes)
        .map_err(|error| ReportError::InvalidOption(format!("invalid utf-8 csv output: {error}")))
}

pub fn write_derived_csv(
    path: &Path,
    table: &DerivedTable,
    delimiter: u8,
) -> Result<(), ReportError> {
    let mut writer = WriterBuilder::new().delimiter(delimiter).from_path(path)?;
    write_derived(&mut writer, table)
}

pub fn derived_to_csv_string(table: &DerivedTable, delimiter: u8) -> Result<String, ReportError> {
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::<u8>::new());
    write_derived(&mut writer, table)?;
    into_string(into_bytes(writer)?)
}

/// UTF-8 CSV bytes of a comparison table, as offered for download.
pub fn aggregate_to_csv_bytes(table: &AggregateTable) -> Result<Vec<u8>, ReportError> {
    let mut writer = WriterBuilder::new().from_writer(Vec::<u8>::new());
    write_aggregate(&mut writer, table)?;
    into_bytes(writer)
}

#[must_use]
pub fn comparison_file_name(group_by: &str) -> String {
    format!("{group_by}_comparison.csv")
}
