mod aggregate;
mod batch;
mod coerce;
mod csv_out;
mod derive;
mod error;
mod extract;
mod model;
mod options;
mod pdf_reader;
mod status;
mod template;
mod warning;

use serde::Serialize;

use crate::warning::WarningCode;

pub use aggregate::{AggregatePlan, Stat, aggregate, stat_column, summarize};
pub use batch::{BatchOutcome, load_documents, process_documents};
pub use coerce::{parse_number, parse_report_date, to_float};
pub use csv_out::{
    aggregate_to_csv_bytes, comparison_file_name, derived_to_csv_string, write_derived_csv,
};
pub use derive::{columns, derive};
pub use error::ReportError;
pub use extract::{RuleSet, extract};
pub use model::{
    AggregateRow, AggregateTable, Cell, ColumnSummary, DerivedRow, DerivedTable,
    DocumentFailure, ExtractedDocument, FieldRecord, FieldSource, FieldValue, SourceDocument,
};
pub use options::{DeriveOptions, Guards, Selection, ViewRequest, ZeroGuard};
pub use pdf_reader::read_report_text;
pub use status::{Status, StatusBands};
pub use template::{Capture, Family, FieldKind, Rule, Template, fields};
pub use warning::{ReportWarning, WarningCode as ReportWarningCode};

/// Everything a dashboard view shows for one batch of uploads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub template: Template,
    pub table: DerivedTable,
    pub aggregate: Option<AggregateTable>,
    pub summary: Vec<ColumnSummary>,
    pub failures: Vec<DocumentFailure>,
    pub warnings: Vec<ReportWarning>,
}

impl DashboardReport {
    /// True when no document produced a row.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

fn apply_selection(table: &mut DerivedTable, selection: &Selection) {
    table.rows.retain(|row| {
        row.text(&selection.column)
            .is_some_and(|value| selection.contains(value))
    });
}

fn coercion_warnings(table: &DerivedTable) -> Vec<ReportWarning> {
    table
        .rows
        .iter()
        .flat_map(|row| {
            row.unparsed.iter().map(|field| {
                ReportWarning::new(
                    WarningCode::NumericCoercion,
                    "value is not a number; 0 used",
                )
                .with_document(&row.document)
                .with_field(field)
            })
        })
        .collect()
}

/// Extracts, derives and aggregates a batch of documents for one view.
///
/// Each call recomputes everything from `documents`; nothing is cached
/// between requests.
#[must_use]
pub fn build_report(documents: &[SourceDocument], request: &ViewRequest) -> DashboardReport {
    let BatchOutcome {
        documents: extracted,
        failures,
        mut warnings,
    } = process_documents(request.template, documents);

    let mut table = derive(request.template, &extracted, &request.options);
    if let Some(selection) = &request.selection {
        apply_selection(&mut table, selection);
    }
    warnings.extend(coercion_warnings(&table));

    let aggregate = request
        .group_by
        .as_deref()
        .map(|group_by| aggregate(&table, group_by));
    let summary = summarize(&table, request.template.summary_columns());

    DashboardReport {
        template: request.template,
        table,
        aggregate,
        summary,
        failures,
        warnings,
    }
}

/// The comparison download for a grouped report: file name and CSV bytes.
///
/// # Errors
///
/// Returns [`ReportError::InvalidOption`] when the report was built without a
/// grouping key, or a CSV error if serialization fails.
pub fn comparison_csv(report: &DashboardReport) -> Result<(String, Vec<u8>), ReportError> {
    let table = report.aggregate.as_ref().ok_or_else(|| {
        ReportError::InvalidOption("a grouping column is required for comparison".to_string())
    })?;
    Ok((
        comparison_file_name(&table.group_by),
        aggregate_to_csv_bytes(table)?,
    ))
}
