use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ReportError;
use crate::template::Template;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub page_number: u32,
    pub text: String,
}

/// One uploaded report, before text extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SourceDocument {
    #[must_use]
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// # Errors
    ///
    /// Returns [`ReportError::Io`] if the file cannot be read.
    pub fn from_path(path: &Path) -> Result<Self, ReportError> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned());
        Ok(Self { name, bytes })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSource {
    Matched,
    Defaulted,
    Counted,
    Composite,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValue {
    pub value: String,
    pub source: FieldSource,
}

impl FieldValue {
    #[must_use]
    pub fn new(value: impl Into<String>, source: FieldSource) -> Self {
        Self {
            value: value.into(),
            source,
        }
    }

    #[must_use]
    pub fn is_defaulted(&self) -> bool {
        self.source == FieldSource::Defaulted
    }
}

/// Extracted fields of one report, in rule order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRecord {
    fields: Vec<(String, FieldValue)>,
}

impl FieldRecord {
    /// Inserts or replaces `name`, keeping its original position.
    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        let name = name.into();
        if let Some(slot) = self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            slot.1 = value;
        } else {
            self.fields.push((name, value));
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    /// The field's string value, if the record has it.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&str> {
        self.get(name).map(|field| field.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    #[must_use]
    pub fn defaulted_fields(&self) -> Vec<&str> {
        self.iter()
            .filter(|(_, value)| value.is_defaulted())
            .map(|(name, _)| name)
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    pub name: String,
    pub record: FieldRecord,
}

/// A document that was dropped from the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFailure {
    pub name: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
}

impl Cell {
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(_) => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            Self::Number(_) => None,
        }
    }

    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Number(value) => value.to_string(),
            Self::Text(value) => value.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedRow {
    pub document: String,
    pub date: Option<NaiveDate>,
    pub cells: BTreeMap<String, Cell>,
    /// Fields that fell back to their rule default.
    pub defaulted: Vec<String>,
    /// Numeric fields whose extracted text did not parse.
    pub unparsed: Vec<String>,
}

impl DerivedRow {
    /// Numeric cell value; absent or textual cells read as `0.0`.
    #[must_use]
    pub fn number(&self, column: &str) -> f64 {
        self.cells
            .get(column)
            .and_then(Cell::as_number)
            .unwrap_or(0.0)
    }

    #[must_use]
    pub fn text(&self, column: &str) -> Option<&str> {
        self.cells.get(column).and_then(Cell::as_text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedTable {
    pub template: Template,
    pub columns: Vec<String>,
    pub rows: Vec<DerivedRow>,
}

impl DerivedTable {
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Numeric values of one column in row order.
    #[must_use]
    pub fn column_values(&self, column: &str) -> Vec<f64> {
        self.rows.iter().map(|row| row.number(column)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    pub key: String,
    pub reports: usize,
    pub values: BTreeMap<String, f64>,
    pub rank: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateTable {
    pub group_by: String,
    /// Value columns in display order.
    pub columns: Vec<String>,
    pub rank_column: String,
    pub rows: Vec<AggregateRow>,
}

impl AggregateTable {
    #[must_use]
    pub fn row(&self, key: &str) -> Option<&AggregateRow> {
        self.rows.iter().find(|row| row.key == key)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub p25: Option<f64>,
    pub p50: Option<f64>,
    pub p75: Option<f64>,
    pub max: Option<f64>,
}
