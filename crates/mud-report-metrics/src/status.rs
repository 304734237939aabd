use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Status {
    Good,
    Caution,
    Critical,
}

impl Status {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Caution => "Caution",
            Self::Critical => "Critical",
        }
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Upper bounds (inclusive) of the `Good` and `Caution` bands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusBands {
    pub good_max: f64,
    pub caution_max: f64,
}

impl StatusBands {
    pub const TOP_DECK: Self = Self::new(2.5, 4.0);
    pub const BOTTOM_DECK: Self = Self::new(2.0, 3.5);
    pub const SOLIDS_CONTROL_CUTTINGS: Self = Self::new(10.0, 20.0);
    pub const DAILY_DRILLING_CUTTINGS: Self = Self::new(8.0, 15.0);

    #[must_use]
    pub const fn new(good_max: f64, caution_max: f64) -> Self {
        Self {
            good_max,
            caution_max,
        }
    }

    #[must_use]
    pub fn classify(&self, value: f64) -> Status {
        if value <= self.good_max {
            Status::Good
        } else if value <= self.caution_max {
            Status::Caution
        } else {
            Status::Critical
        }
    }
}
