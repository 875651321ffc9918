//! Accounting period model.
//!
//! A period is either one calendar month or one full calendar year. The
//! variant makes the "annual close" case explicit instead of threading a
//! nullable month through every check.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::ClosureError;
use super::types::ClosureType;
use crate::gateway::DateRange;

/// A calendar period over which financial activity is aggregated and closed.
///
/// Construct monthly periods through [`Period::monthly`]; the date helpers
/// assume `month` is in `1..=12`. Deserialization routes through the same
/// check, so an out-of-range month never enters from the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPeriod")]
pub enum Period {
    /// One calendar month of a year.
    Monthly {
        /// Calendar year.
        year: i32,
        /// Month number, 1-12.
        month: u32,
    },
    /// One full calendar year.
    Annual {
        /// Calendar year.
        year: i32,
    },
}

/// Unvalidated mirror of [`Period`] for deserialization.
#[derive(Deserialize)]
enum RawPeriod {
    Monthly { year: i32, month: u32 },
    Annual { year: i32 },
}

impl TryFrom<RawPeriod> for Period {
    type Error = ClosureError;

    fn try_from(raw: RawPeriod) -> Result<Self, Self::Error> {
        match raw {
            RawPeriod::Monthly { year, month } => Self::monthly(year, month),
            RawPeriod::Annual { year } => Ok(Self::annual(year)),
        }
    }
}

impl Period {
    /// Builds a monthly period.
    ///
    /// # Errors
    ///
    /// Returns [`ClosureError::InvalidMonth`] if `month` is outside `1..=12`.
    pub fn monthly(year: i32, month: u32) -> Result<Self, ClosureError> {
        if !(1..=12).contains(&month) {
            return Err(ClosureError::InvalidMonth(month));
        }
        Ok(Self::Monthly { year, month })
    }

    /// Builds an annual period.
    #[must_use]
    pub const fn annual(year: i32) -> Self {
        Self::Annual { year }
    }

    /// The calendar year of the period.
    #[must_use]
    pub const fn year(&self) -> i32 {
        match self {
            Self::Monthly { year, .. } | Self::Annual { year } => *year,
        }
    }

    /// The month number for monthly periods, `None` for annual.
    #[must_use]
    pub const fn month(&self) -> Option<u32> {
        match self {
            Self::Monthly { month, .. } => Some(*month),
            Self::Annual { .. } => None,
        }
    }

    /// The closure type a record for this period carries.
    #[must_use]
    pub const fn closure_type(&self) -> ClosureType {
        match self {
            Self::Monthly { .. } => ClosureType::Monthly,
            Self::Annual { .. } => ClosureType::Annual,
        }
    }

    /// The half-open date range `[first-day 00:00, day-after-last 00:00)`
    /// covering the period.
    #[must_use]
    pub fn date_range(&self) -> DateRange {
        let (start, end) = match *self {
            Self::Monthly { year, month } => {
                (first_of_month(year, month), first_of_next_month(year, month))
            }
            Self::Annual { year } => (first_of_month(year, 1), first_of_month(year + 1, 1)),
        };
        DateRange {
            start: start.and_hms_opt(0, 0, 0).unwrap(),
            end: end.and_hms_opt(0, 0, 0).unwrap(),
        }
    }

    /// The last calendar day of the period; closing entries are dated here.
    #[must_use]
    pub fn last_day(&self) -> NaiveDate {
        match *self {
            Self::Monthly { year, month } => {
                first_of_next_month(year, month).pred_opt().unwrap()
            }
            Self::Annual { year } => NaiveDate::from_ymd_opt(year, 12, 31).unwrap(),
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Monthly { year, month } => write!(f, "{year}-{month:02}"),
            Self::Annual { year } => write!(f, "{year}"),
        }
    }
}

/// First day of a month.
fn first_of_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap()
}

/// First day of the month after the given one.
fn first_of_next_month(year: i32, month: u32) -> NaiveDate {
    if month == 12 {
        first_of_month(year + 1, 1)
    } else {
        first_of_month(year, month + 1)
    }
}
