//! Report templates and their declarative field rules.
//!
//! Each template is a fixed, ordered list of [`Rule`]s. Rules are evaluated in
//! order, so a [`Capture::Sum`] rule may refer to fields produced by earlier
//! rules of the same template.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::aggregate::{AggregatePlan, Stat};
use crate::derive::columns;
use crate::error::ReportError;

/// Field names shared by the built-in templates.
pub mod fields {
    pub const WELL_NAME: &str = "Well Name";
    pub const RIG: &str = "Rig";
    pub const DATE: &str = "Date";
    pub const MUD_WEIGHT: &str = "Mud Weight";
    pub const PV: &str = "PV";
    pub const YP: &str = "YP";
    pub const AVE_TEMP: &str = "Ave Temp";
    pub const PUMP_1_GPM: &str = "Pump 1 GPM";
    pub const PUMP_2_GPM: &str = "Pump 2 GPM";
    pub const PUMP_3_GPM: &str = "Pump 3 GPM";
    pub const API_SCREEN: &str = "API Screen";
    pub const SCREEN_COUNT: &str = "Screen Count";
    pub const DEPTH_DRILLED: &str = "Depth Drilled";
    pub const DRILLING_HOURS: &str = "Drilling Hours";
    pub const ACTIVE_VOLUME: &str = "Active Volume";
    pub const RESERVE_VOLUME: &str = "Reserve Volume";
    pub const HOLE_VOLUME: &str = "Hole Volume";
    pub const PIT_VOLUME: &str = "Pit Volume";
    pub const TOTAL_CIRCULATION: &str = "Total Circulation";
    pub const BASE_OIL_ADDED: &str = "Base Oil Added";
    pub const WATER_ADDED: &str = "Water Added";
    pub const CHEMICALS_ADDED: &str = "Chemicals Added";
    pub const PREMIX_ADDED: &str = "Premix Added";
    pub const SCE_LOSS: &str = "SCE Loss";

    pub const PUMP_GPM: [&str; 3] = [PUMP_1_GPM, PUMP_2_GPM, PUMP_3_GPM];
}

use fields::{
    ACTIVE_VOLUME, API_SCREEN, AVE_TEMP, BASE_OIL_ADDED, CHEMICALS_ADDED, DATE, DEPTH_DRILLED,
    DRILLING_HOURS, HOLE_VOLUME, MUD_WEIGHT, PIT_VOLUME, PREMIX_ADDED, PUMP_GPM, PV,
    RESERVE_VOLUME, RIG, SCE_LOSS, SCREEN_COUNT, TOTAL_CIRCULATION, WATER_ADDED, WELL_NAME, YP,
};

/// Value used when a rule finds nothing.
pub const DEFAULT_VALUE: &str = "0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Numeric,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    /// First match, first capture group, trimmed.
    First(&'static str),
    /// Every non-overlapping match, assigned to `fields` in order.
    Slots {
        pattern: &'static str,
        fields: &'static [&'static str],
    },
    /// Number of non-overlapping matches.
    Count(&'static str),
    /// Sum of two fields extracted earlier in the same record.
    Sum(&'static str, &'static str),
}

impl Capture {
    #[must_use]
    pub const fn pattern(&self) -> Option<&'static str> {
        match self {
            Self::First(pattern) | Self::Count(pattern) | Self::Slots { pattern, .. } => {
                Some(*pattern)
            }
            Self::Sum(..) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub field: &'static str,
    pub capture: Capture,
    pub kind: FieldKind,
    pub default: &'static str,
}

impl Rule {
    const fn text(field: &'static str, pattern: &'static str) -> Self {
        Self {
            field,
            capture: Capture::First(pattern),
            kind: FieldKind::Text,
            default: DEFAULT_VALUE,
        }
    }

    const fn numeric(field: &'static str, pattern: &'static str) -> Self {
        Self {
            field,
            capture: Capture::First(pattern),
            kind: FieldKind::Numeric,
            default: DEFAULT_VALUE,
        }
    }

    const fn slots(
        field: &'static str,
        pattern: &'static str,
        fields: &'static [&'static str],
    ) -> Self {
        Self {
            field,
            capture: Capture::Slots { pattern, fields },
            kind: FieldKind::Numeric,
            default: DEFAULT_VALUE,
        }
    }

    const fn count(field: &'static str, pattern: &'static str) -> Self {
        Self {
            field,
            capture: Capture::Count(pattern),
            kind: FieldKind::Numeric,
            default: DEFAULT_VALUE,
        }
    }

    const fn sum(field: &'static str, left: &'static str, right: &'static str) -> Self {
        Self {
            field,
            capture: Capture::Sum(left, right),
            kind: FieldKind::Numeric,
            default: DEFAULT_VALUE,
        }
    }

    /// Names of the record fields this rule writes.
    #[must_use]
    pub fn output_fields(&self) -> Vec<&'static str> {
        match self.capture {
            Capture::Slots { fields, .. } => fields.to_vec(),
            _ => vec![self.field],
        }
    }
}

const SHAKER_SCREEN_RULES: &[Rule] = &[
    Rule::text(WELL_NAME, r"Well Name\s*:?[\s\n]*(.*?)\s"),
    Rule::text(DATE, r"Report\s+#\d+\s+([0-9]{2}/[0-9]{2}/[0-9]{2})"),
    Rule::numeric(MUD_WEIGHT, r"MUD WT\s*([0-9.]+)"),
    Rule::numeric(PV, r"PV\s*=\s*([0-9.]+)"),
    Rule::numeric(YP, r"YP\s*=\s*([0-9.]+)"),
    Rule::numeric(AVE_TEMP, r"Flowline Temperature.*?([0-9]{2,3})\s*°F"),
    Rule::slots("Pump GPM", r"PUMP\s+#\d+\s*([0-9.]+)\s*gpm", &PUMP_GPM),
    Rule::numeric(API_SCREEN, r"Screens.*?([0-9]{2,3})\s*ppb"),
    Rule::count(SCREEN_COUNT, r"Shaker\s+\d+"),
];

const SOLIDS_CONTROL_RULES: &[Rule] = &[
    Rule::text(
        WELL_NAME,
        r"\bWell(?:[ \t]+Name)?[ \t]*:[ \t]*([^\r\n]+?)(?:[ \t]{2,}|\r?\n|$)",
    ),
    Rule::text(
        RIG,
        r"\bRig(?:[ \t]+(?:Name|No\.?))?[ \t]*:[ \t]*([^\r\n]+?)(?:[ \t]{2,}|\r?\n|$)",
    ),
    Rule::text(DATE, r"\bDate[ \t]*:[ \t]*([0-9]{1,2}/[0-9]{1,2}/[0-9]{2,4})"),
    Rule::numeric(MUD_WEIGHT, r"Mud[ \t]+Weight[ \t]*:?[ \t]*([0-9.,]+)"),
    Rule::numeric(
        DEPTH_DRILLED,
        r"(?:Footage|Depth)[ \t]+Drilled[ \t]*:?[ \t]*([0-9.,]+)",
    ),
    Rule::numeric(
        DRILLING_HOURS,
        r"Drilling[ \t]+(?:Hours|Hrs)[ \t]*:?[ \t]*([0-9.,]+)",
    ),
    Rule::numeric(
        ACTIVE_VOLUME,
        r"Active[ \t]+(?:System[ \t]+)?Volume[ \t]*:?[ \t]*([0-9.,]+)",
    ),
    Rule::numeric(RESERVE_VOLUME, r"Reserve[ \t]+Volume[ \t]*:?[ \t]*([0-9.,]+)"),
    Rule::sum(TOTAL_CIRCULATION, ACTIVE_VOLUME, RESERVE_VOLUME),
    Rule::numeric(BASE_OIL_ADDED, r"Base[ \t]+Oil[ \t]+Added[ \t]*:?[ \t]*([0-9.,]+)"),
    Rule::numeric(WATER_ADDED, r"Water[ \t]+Added[ \t]*:?[ \t]*([0-9.,]+)"),
    Rule::numeric(
        CHEMICALS_ADDED,
        r"Chemicals?[ \t]+Added[ \t]*:?[ \t]*([0-9.,]+)",
    ),
    Rule::numeric(SCE_LOSS, r"SCE[ \t]+Loss(?:es)?[ \t]*:?[ \t]*([0-9.,]+)"),
];

const DAILY_DRILLING_RULES: &[Rule] = &[
    Rule::text(WELL_NAME, r"Well\s+Name\s*:?\s*(\S+)"),
    Rule::text(RIG, r"\bRig\b\s*:?\s*(\S+)"),
    Rule::text(
        DATE,
        r"Report\s+Date.*?([0-9]{4}-[0-9]{2}-[0-9]{2}|[0-9]{1,2}[/-][0-9]{1,2}[/-][0-9]{2,4})",
    ),
    Rule::numeric(MUD_WEIGHT, r"Mud\s+Weight.*?([0-9]+(?:\.[0-9]+)?)"),
    Rule::numeric(DEPTH_DRILLED, r"Daily\s+Footage.*?([0-9][0-9.,]*)"),
    Rule::numeric(DRILLING_HOURS, r"Rotating\s+Hours.*?([0-9][0-9.,]*)"),
    Rule::numeric(HOLE_VOLUME, r"Hole\s+Volume.*?([0-9][0-9.,]*)"),
    Rule::numeric(PIT_VOLUME, r"Pit\s+Volume.*?([0-9][0-9.,]*)"),
    Rule::sum(TOTAL_CIRCULATION, HOLE_VOLUME, PIT_VOLUME),
    Rule::numeric(PREMIX_ADDED, r"Premix.*?([0-9][0-9.,]*)"),
    Rule::numeric(WATER_ADDED, r"Water\s+Added.*?([0-9][0-9.,]*)"),
    Rule::numeric(BASE_OIL_ADDED, r"Base\s+Oil.*?([0-9][0-9.,]*)"),
    Rule::numeric(SCE_LOSS, r"Losses\s+to\s+SCE.*?([0-9][0-9.,]*)"),
];

/// How a template's records turn into derived columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    /// Pump flow and shaker screen wear.
    Shaker,
    /// Volume additions, losses and penetration rate.
    Dilution { additions: [&'static str; 3] },
}

static SHAKER_AGGREGATE: AggregatePlan = AggregatePlan {
    sums: &[columns::GPM_TOTAL],
    means: &[
        PV,
        YP,
        MUD_WEIGHT,
        columns::GPM_TOTAL,
        columns::TOP_DECK_WEAR,
        columns::BOTTOM_DECK_WEAR,
    ],
    rank_by: (columns::TOP_DECK_WEAR, Stat::Mean),
    delta_of: (MUD_WEIGHT, Stat::Mean),
};

static DILUTION_AGGREGATE: AggregatePlan = AggregatePlan {
    sums: &[columns::TOTAL_DILUTION, SCE_LOSS, DEPTH_DRILLED],
    means: &[
        columns::ROP,
        columns::DSRE_PERCENT,
        columns::DISCARD_RATIO,
        MUD_WEIGHT,
    ],
    rank_by: (columns::TOTAL_DILUTION, Stat::Sum),
    delta_of: (columns::ROP, Stat::Mean),
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Template {
    /// BAKU state daily mud report: pumps, rheology and shaker screens.
    ShakerScreen,
    /// Solids-control report with `label: value` lines.
    SolidsControl,
    /// Daily drilling report laid out as a grid, values below labels.
    DailyDrilling,
}

impl Template {
    pub const ALL: [Self; 3] = [Self::ShakerScreen, Self::SolidsControl, Self::DailyDrilling];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ShakerScreen => "shaker-screen",
            Self::SolidsControl => "solids-control",
            Self::DailyDrilling => "daily-drilling",
        }
    }

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::ShakerScreen => 0,
            Self::SolidsControl => 1,
            Self::DailyDrilling => 2,
        }
    }

    #[must_use]
    pub const fn rules(self) -> &'static [Rule] {
        match self {
            Self::ShakerScreen => SHAKER_SCREEN_RULES,
            Self::SolidsControl => SOLIDS_CONTROL_RULES,
            Self::DailyDrilling => DAILY_DRILLING_RULES,
        }
    }

    /// Whether `.` in this template's patterns also matches line breaks.
    #[must_use]
    pub const fn spans_lines(self) -> bool {
        matches!(self, Self::DailyDrilling)
    }

    #[must_use]
    pub const fn family(self) -> Family {
        match self {
            Self::ShakerScreen => Family::Shaker,
            Self::SolidsControl => Family::Dilution {
                additions: [BASE_OIL_ADDED, WATER_ADDED, CHEMICALS_ADDED],
            },
            Self::DailyDrilling => Family::Dilution {
                additions: [PREMIX_ADDED, WATER_ADDED, BASE_OIL_ADDED],
            },
        }
    }

    /// All record fields in rule order.
    #[must_use]
    pub fn field_names(self) -> Vec<&'static str> {
        self.rules().iter().flat_map(Rule::output_fields).collect()
    }

    #[must_use]
    pub fn field_kind(self, field: &str) -> Option<FieldKind> {
        self.rules()
            .iter()
            .find(|rule| rule.output_fields().iter().any(|name| *name == field))
            .map(|rule| rule.kind)
    }

    /// Text fields usable as a grouping or selection key.
    #[must_use]
    pub const fn categorical_columns(self) -> &'static [&'static str] {
        match self {
            Self::ShakerScreen => &[WELL_NAME],
            Self::SolidsControl | Self::DailyDrilling => &[WELL_NAME, RIG],
        }
    }

    #[must_use]
    pub const fn derived_columns(self) -> &'static [&'static str] {
        match self.family() {
            Family::Shaker => &[
                columns::GPM_TOTAL,
                columns::GPM_PER_SCREEN,
                columns::TOP_DECK_WEAR,
                columns::BOTTOM_DECK_WEAR,
                columns::TOP_DECK_STATUS,
                columns::BOTTOM_DECK_STATUS,
            ],
            Family::Dilution { .. } => &[
                columns::TOTAL_DILUTION,
                columns::DISCARD_RATIO,
                columns::DSRE_PERCENT,
                columns::ROP,
                columns::CUTTING_RATIO,
                columns::TOP_DECK_LOSS,
                columns::BOTTOM_DECK_LOSS,
                columns::STATUS,
            ],
        }
    }

    /// Columns reported by the statistical summary.
    #[must_use]
    pub const fn summary_columns(self) -> &'static [&'static str] {
        match self.family() {
            Family::Shaker => &[
                PV,
                YP,
                MUD_WEIGHT,
                AVE_TEMP,
                columns::GPM_TOTAL,
                columns::GPM_PER_SCREEN,
                columns::TOP_DECK_WEAR,
            ],
            Family::Dilution { .. } => &[
                columns::ROP,
                columns::TOTAL_DILUTION,
                columns::DISCARD_RATIO,
                columns::DSRE_PERCENT,
                SCE_LOSS,
                columns::CUTTING_RATIO,
            ],
        }
    }

    #[must_use]
    pub fn aggregate_plan(self) -> &'static AggregatePlan {
        match self.family() {
            Family::Shaker => &SHAKER_AGGREGATE,
            Family::Dilution { .. } => &DILUTION_AGGREGATE,
        }
    }

    /// Checks that `column` can key a grouping for this template.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::InvalidGroupKey`] for non-categorical columns.
    pub fn validate_group_key(self, column: &str) -> Result<(), ReportError> {
        if self.categorical_columns().iter().any(|name| *name == column) {
            Ok(())
        } else {
            Err(ReportError::InvalidGroupKey {
                column: column.to_string(),
                template: self.as_str().to_string(),
            })
        }
    }
}

impl Display for Template {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Template {
    type Err = ReportError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "shaker-screen" | "shaker" | "baku" | "a" => Ok(Self::ShakerScreen),
            "solids-control" | "solids" | "b" => Ok(Self::SolidsControl),
            "daily-drilling" | "drilling" | "c" => Ok(Self::DailyDrilling),
            _ => Err(ReportError::UnknownTemplate(value.to_string())),
        }
    }
}
