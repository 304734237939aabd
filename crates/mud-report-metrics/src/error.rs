use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to load PDF: {0}")]
    PdfLoad(#[from] lopdf::Error),

    #[error("invalid field pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("unknown report template: '{0}'")]
    UnknownTemplate(String),

    #[error("column '{column}' cannot be used for grouping in the {template} template")]
    InvalidGroupKey { column: String, template: String },

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("document has no pages")]
    NoPages,
}
