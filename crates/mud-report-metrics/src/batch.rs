use std::path::PathBuf;

use tracing::{debug, warn};

use crate::extract::RuleSet;
use crate::model::{DocumentFailure, ExtractedDocument, SourceDocument};
use crate::pdf_reader::read_report_text;
use crate::template::Template;
use crate::warning::{ReportWarning, WarningCode};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    /// Successfully read documents, in upload order.
    pub documents: Vec<ExtractedDocument>,
    pub failures: Vec<DocumentFailure>,
    pub warnings: Vec<ReportWarning>,
}

/// Extracts every document in order. A document that cannot be read is
/// reported in `failures` and the rest of the batch continues.
#[must_use]
pub fn process_documents(template: Template, documents: &[SourceDocument]) -> BatchOutcome {
    let rules = RuleSet::builtin(template);
    let mut outcome = BatchOutcome::default();

    for document in documents {
        let text = match read_report_text(&document.bytes) {
            Ok(text) => text,
            Err(error) => {
                warn!(document = %document.name, %error, "skipping unreadable report");
                outcome.failures.push(DocumentFailure {
                    name: document.name.clone(),
                    message: error.to_string(),
                });
                continue;
            }
        };

        if text.trim().is_empty() {
            outcome.warnings.push(
                ReportWarning::new(WarningCode::EmptyText, "no text could be read from the report")
                    .with_document(&document.name),
            );
        }

        let record = rules.extract(&text);
        let defaulted = record.defaulted_fields();
        debug!(
            document = %document.name,
            %template,
            fields = record.len(),
            defaulted = defaulted.len(),
            "extracted report fields"
        );
        outcome.warnings.extend(defaulted.iter().map(|field| {
            ReportWarning::new(WarningCode::FieldDefaulted, "pattern not found; default used")
                .with_document(&document.name)
                .with_field(*field)
        }));

        outcome.documents.push(ExtractedDocument {
            name: document.name.clone(),
            record,
        });
    }

    outcome
}

/// Reads files from disk; unreadable paths become failures.
#[must_use]
pub fn load_documents(paths: &[PathBuf]) -> (Vec<SourceDocument>, Vec<DocumentFailure>) {
    let mut documents = Vec::new();
    let mut failures = Vec::new();
    for path in paths {
        match SourceDocument::from_path(path) {
            Ok(document) => documents.push(document),
            Err(error) => {
                warn!(path = %path.display(), %error, "skipping unreadable file");
                failures.push(DocumentFailure {
                    name: path.display().to_string(),
                    message: error.to_string(),
                });
            }
        }
    }
    (documents, failures)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{load_documents, process_documents};
    use crate::model::SourceDocument;
    use crate::template::Template;

    #[test]
    fn every_invalid_document_is_reported_by_name() {
        let documents = vec![
            SourceDocument::new("day-1.pdf", b"garbage".to_vec()),
            SourceDocument::new("day-2.pdf", Vec::new()),
        ];
        let outcome = process_documents(Template::ShakerScreen, &documents);
        assert!(outcome.documents.is_empty());
        let names = outcome
            .failures
            .iter()
            .map(|failure| failure.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["day-1.pdf", "day-2.pdf"]);
        assert!(outcome.failures.iter().all(|failure| !failure.message.is_empty()));
    }

    #[test]
    fn missing_files_become_failures() {
        let (documents, failures) =
            load_documents(&[PathBuf::from("/definitely/not/here/report.pdf")]);
        assert!(documents.is_empty());
        assert_eq!(failures.len(), 1);
        assert!(failures[0].name.ends_with("report.pdf"));
    }
}
