use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ReportError;
use crate::status::StatusBands;
use crate::template::{Template, fields};

/// Policy applied to a divisor that may be zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "policy", content = "value")]
pub enum ZeroGuard {
    /// Replace an exactly-zero divisor with the given value.
    Substitute(f64),
    /// Report `0.0` instead of dividing by zero.
    ZeroResult,
}

impl ZeroGuard {
    #[must_use]
    pub fn guarded(self, value: f64) -> f64 {
        match self {
            Self::Substitute(replacement) if value == 0.0 => replacement,
            _ => value,
        }
    }

    #[must_use]
    pub fn divide(self, numerator: f64, denominator: f64) -> f64 {
        let denominator = self.guarded(denominator);
        if denominator == 0.0 {
            0.0
        } else {
            numerator / denominator
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Guards {
    pub screen_count: ZeroGuard,
    pub api_screen: ZeroGuard,
    pub total_circulation: ZeroGuard,
    pub sce_loss: ZeroGuard,
    pub drilling_hours: ZeroGuard,
}

impl Guards {
    #[must_use]
    pub const fn uniform(guard: ZeroGuard) -> Self {
        Self {
            screen_count: guard,
            api_screen: guard,
            total_circulation: guard,
            sce_loss: guard,
            drilling_hours: guard,
        }
    }

    #[must_use]
    pub const fn for_template(template: Template) -> Self {
        match template {
            Template::ShakerScreen => Self {
                api_screen: ZeroGuard::Substitute(100.0),
                ..Self::uniform(ZeroGuard::Substitute(1.0))
            },
            Template::SolidsControl => Self::uniform(ZeroGuard::Substitute(1.0)),
            Template::DailyDrilling => Self::uniform(ZeroGuard::ZeroResult),
        }
    }
}

/// Constants used by the derived-metric formulas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeriveOptions {
    pub guards: Guards,
    pub bottom_deck_factor: f64,
    pub wear_clip: f64,
    pub top_deck_loss_share: f64,
    pub top_deck_bands: StatusBands,
    pub bottom_deck_bands: StatusBands,
    pub cuttings_bands: StatusBands,
}

impl DeriveOptions {
    #[must_use]
    pub const fn for_template(template: Template) -> Self {
        Self {
            guards: Guards::for_template(template),
            bottom_deck_factor: 0.8,
            wear_clip: 100.0,
            top_deck_loss_share: 0.6,
            top_deck_bands: StatusBands::TOP_DECK,
            bottom_deck_bands: StatusBands::BOTTOM_DECK,
            cuttings_bands: match template {
                Template::DailyDrilling => StatusBands::DAILY_DRILLING_CUTTINGS,
                Template::ShakerScreen | Template::SolidsControl => {
                    StatusBands::SOLIDS_CONTROL_CUTTINGS
                }
            },
        }
    }
}

/// Rows to keep, by value of one categorical column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub column: String,
    pub values: BTreeSet<String>,
}

impl Selection {
    #[must_use]
    pub fn new<I, S>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        self.values.contains(value)
    }
}

/// Parses `column=v1,v2` or `v1,v2` (column defaults to the well name).
impl FromStr for Selection {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (column, list) = match value.split_once('=') {
            Some((column, list)) => (column.trim(), list),
            None => (fields::WELL_NAME, value),
        };
        if column.is_empty() {
            return Err("selection column cannot be empty".to_string());
        }

        let values = list
            .split(',')
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .collect::<BTreeSet<_>>();
        if values.is_empty() {
            return Err("selection cannot be empty".to_string());
        }

        Ok(Self {
            column: column.to_string(),
            values,
        })
    }
}

/// Everything one dashboard interaction needs besides the documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewRequest {
    pub template: Template,
    pub options: DeriveOptions,
    pub selection: Option<Selection>,
    pub group_by: Option<String>,
}

impl ViewRequest {
    #[must_use]
    pub fn new(template: Template) -> Self {
        Self {
            template,
            options: DeriveOptions::for_template(template),
            selection: None,
            group_by: None,
        }
    }

    /// # Errors
    ///
    /// Returns [`ReportError::InvalidGroupKey`] if `column` is not categorical.
    pub fn with_group_by(mut self, column: impl Into<String>) -> Result<Self, ReportError> {
        let column = column.into();
        self.template.validate_group_key(&column)?;
        self.group_by = Some(column);
        Ok(self)
    }

    /// # Errors
    ///
    /// Returns [`ReportError::InvalidGroupKey`] if the selection column is not
    /// categorical.
    pub fn with_selection(mut self, selection: Selection) -> Result<Self, ReportError> {
        self.template.validate_group_key(&selection.column)?;
        self.selection = Some(selection);
        Ok(self)
    }
}
