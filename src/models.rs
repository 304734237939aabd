use chrono::{DateTime, SecondsFormat, Utc};
use mud_report_metrics::{
    AggregateTable, ColumnSummary, DashboardReport, DerivedRow, DocumentFailure, FieldKind,
    ReportWarning, Template,
};
use serde::{Deserialize, Serialize};

/// Template used when neither the query nor `DEFAULT_TEMPLATE` names one.
pub const DEFAULT_TEMPLATE: Template = Template::ShakerScreen;
/// Multipart field carrying the uploaded PDFs.
pub const UPLOAD_FIELD: &str = "files";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: String,
    pub kind: FieldKind,
    pub default: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TemplateInfo {
    pub name: Template,
    pub fields: Vec<FieldInfo>,
    pub categorical_columns: Vec<String>,
    pub derived_columns: Vec<String>,
}

impl TemplateInfo {
    pub fn from_template(template: Template) -> Self {
        let fields = template
            .rules()
            .iter()
            .flat_map(|rule| {
                rule.output_fields().into_iter().map(|name| FieldInfo {
                    name: name.to_string(),
                    kind: rule.kind,
                    default: rule.default.to_string(),
                })
            })
            .collect();

        Self {
            name: template,
            fields,
            categorical_columns: to_strings(template.categorical_columns()),
            derived_columns: to_strings(template.derived_columns()),
        }
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TemplatesResponse {
    pub default_template: Template,
    pub items: Vec<TemplateInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportResponse {
    pub template: Template,
    pub generated_at: String,
    pub columns: Vec<String>,
    pub rows: Vec<DerivedRow>,
    pub failures: Vec<DocumentFailure>,
    pub warnings: Vec<ReportWarning>,
    pub aggregate: Option<AggregateTable>,
    pub summary: Vec<ColumnSummary>,
}

impl ReportResponse {
    pub fn from_report(report: DashboardReport, generated_at: DateTime<Utc>) -> Self {
        Self {
            template: report.template,
            generated_at: generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            columns: report.table.columns,
            rows: report.table.rows,
            failures: report.failures,
            warnings: report.warnings,
            aggregate: report.aggregate,
            summary: report.summary,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}
