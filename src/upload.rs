use mud_report_metrics::SourceDocument;
use worker::{FormEntry, Request};

use crate::error::ApiError;
use crate::models::UPLOAD_FIELD;

/// Reads every file posted under the upload field, in form order.
pub async fn read_uploaded_documents(req: &mut Request) -> Result<Vec<SourceDocument>, ApiError> {
    let form = req
        .form_data()
        .await
        .map_err(|error| ApiError::BadRequest(format!("expected multipart form data: {error}")))?;

    let mut documents = Vec::new();
    for entry in form.get_all(UPLOAD_FIELD).unwrap_or_default() {
        if let FormEntry::File(file) = entry {
            let bytes = file.bytes().await?;
            documents.push(SourceDocument::new(file.name(), bytes));
        }
    }

    if documents.is_empty() {
        return Err(ApiError::BadRequest(format!(
            "no files uploaded under form field '{UPLOAD_FIELD}'"
        )));
    }
    Ok(documents)
}
