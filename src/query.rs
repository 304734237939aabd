use std::collections::HashMap;
use std::str::FromStr;

use mud_report_metrics::{Selection, Template, ViewRequest};

use crate::error::ApiError;

fn non_empty<'a>(query: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    query
        .get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

/// Parses the worker's `DEFAULT_TEMPLATE` variable.
pub fn parse_default_template(value: &str) -> Result<Template, ApiError> {
    Ok(Template::from_str(value)?)
}

pub fn parse_template_query(
    query: &HashMap<String, String>,
    fallback: Template,
) -> Result<Template, ApiError> {
    match non_empty(query, "template") {
        Some(value) => Ok(Template::from_str(value)?),
        None => Ok(fallback),
    }
}

pub fn parse_group_by_query(query: &HashMap<String, String>) -> Option<String> {
    non_empty(query, "group_by").map(str::to_string)
}

/// `select=v1,v2` filters well names; `select=Rig=R7,R9` names the column.
pub fn parse_selection_query(
    query: &HashMap<String, String>,
) -> Result<Option<Selection>, ApiError> {
    non_empty(query, "select")
        .map(|value| Selection::from_str(value).map_err(ApiError::BadRequest))
        .transpose()
}

pub fn parse_view_request(
    query: &HashMap<String, String>,
    fallback: Template,
) -> Result<ViewRequest, ApiError> {
    let mut request = ViewRequest::new(parse_template_query(query, fallback)?);
    if let Some(column) = parse_group_by_query(query) {
        request = request.with_group_by(column)?;
    }
    if let Some(selection) = parse_selection_query(query)? {
        request = request.with_selection(selection)?;
    }
    Ok(request)
}

pub fn require_group_by(request: &ViewRequest) -> Result<&str, ApiError> {
    request.group_by.as_deref().ok_or_else(|| {
        ApiError::BadRequest("group_by is required for a comparison download".to_string())
    })
}

/// Attachment header with a quoted ASCII name and an RFC 5987 `filename*`.
pub fn content_disposition(file_name: &str) -> String {
    let quoted = file_name
        .chars()
        .map(|ch| if ch == '"' || ch == '\\' || !ch.is_ascii() { '_' } else { ch })
        .collect::<String>();
    format!(
        "attachment; filename=\"{quoted}\"; filename*=UTF-8''{}",
        urlencoding::encode(file_name)
    )
}
