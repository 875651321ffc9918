//! Closure domain types.
//!
//! This module defines the durable closure record, the transient validation
//! report, and the value objects the orchestrating service returns.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tesoria_shared::types::{ActorId, ClosureId};

use super::period::Period;
use crate::gateway::JournalEntry;

/// Closure type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClosureType {
    /// Closure of a single calendar month.
    Monthly,
    /// Closure of a full calendar year.
    Annual,
}

impl std::fmt::Display for ClosureType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Monthly => write!(f, "MONTHLY"),
            Self::Annual => write!(f, "ANNUAL"),
        }
    }
}

/// Status of a closure record.
///
/// Transitions go `Closed -> Reopened` only. Reopening annotates the record
/// and unlocks the period for correction; it never deletes the record and
/// never retracts the closing entries already posted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClosureStatus {
    /// The period is closed.
    Closed,
    /// The period was closed and later reopened for correction.
    Reopened,
}

impl std::fmt::Display for ClosureStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "CLOSED"),
            Self::Reopened => write!(f, "REOPENED"),
        }
    }
}

/// Aggregate income/expense totals computed while closing a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosureTotals {
    /// Total income of the period.
    pub total_income: Decimal,
    /// Total expense of the period.
    pub total_expense: Decimal,
    /// Period result (`income - expense`).
    pub result: Decimal,
}

impl ClosureTotals {
    /// Creates totals from income and expense sums.
    #[must_use]
    pub fn new(total_income: Decimal, total_expense: Decimal) -> Self {
        Self {
            total_income,
            total_expense,
            result: total_income - total_expense,
        }
    }
}

/// The durable record of a closed (or reopened) period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClosureRecord {
    /// Unique identifier.
    pub id: ClosureId,
    /// Calendar year.
    pub year: i32,
    /// Month number (1-12) for monthly closures, absent for annual.
    pub month: Option<u32>,
    /// Closure type.
    pub closure_type: ClosureType,
    /// Current status.
    pub status: ClosureStatus,
    /// Actor who closed the period.
    pub closed_by: ActorId,
    /// When the period was closed.
    pub closed_at: DateTime<Utc>,
    /// Total income of the period at close time.
    pub total_income: Decimal,
    /// Total expense of the period at close time.
    pub total_expense: Decimal,
    /// Period result (`income - expense`).
    pub result: Decimal,
    /// Free-form notes attached at close time.
    pub notes: Option<String>,
    /// Actor who reopened the period, if it was reopened.
    pub reopened_by: Option<ActorId>,
    /// When the period was reopened.
    pub reopened_at: Option<DateTime<Utc>>,
    /// Reason given for reopening.
    pub reopen_reason: Option<String>,
}

impl ClosureRecord {
    /// Creates a new CLOSED record for a period.
    #[must_use]
    pub fn closed(
        period: &Period,
        totals: ClosureTotals,
        closed_by: ActorId,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: ClosureId::new(),
            year: period.year(),
            month: period.month(),
            closure_type: period.closure_type(),
            status: ClosureStatus::Closed,
            closed_by,
            closed_at: Utc::now(),
            total_income: totals.total_income,
            total_expense: totals.total_expense,
            result: totals.result,
            notes,
            reopened_by: None,
            reopened_at: None,
            reopen_reason: None,
        }
    }

    /// The period this record covers.
    #[must_use]
    pub fn period(&self) -> Period {
        match self.month {
            Some(month) => Period::Monthly {
                year: self.year,
                month,
            },
            None => Period::Annual { year: self.year },
        }
    }
}

/// Result of pre-close validation. Transient, never persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Violations that block closing, in check order.
    pub errors: Vec<String>,
    /// Non-blocking findings. Structurally reserved; currently always empty.
    pub warnings: Vec<String>,
}

impl ValidationReport {
    /// Returns true if no blocking violation was found.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Records a blocking violation.
    pub fn push_error(&mut self, message: String) {
        self.errors.push(message);
    }
}

/// Filter for listing closure records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClosureFilter {
    /// Restrict to a calendar year.
    pub year: Option<i32>,
    /// Restrict to a closure type.
    pub closure_type: Option<ClosureType>,
    /// Restrict to a status.
    pub status: Option<ClosureStatus>,
}

impl ClosureFilter {
    /// Returns true if the record matches every set criterion.
    #[must_use]
    pub fn matches(&self, record: &ClosureRecord) -> bool {
        self.year.is_none_or(|y| record.year == y)
            && self.closure_type.is_none_or(|t| record.closure_type == t)
            && self.status.is_none_or(|s| record.status == s)
    }
}

/// Yearly closure statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClosureStats {
    /// The year the stats cover.
    pub year: i32,
    /// Number of monthly closures with status CLOSED.
    pub months_closed: u32,
    /// Months of the year not yet closed (`12 - months_closed`).
    pub months_pending: u32,
    /// True if an annual closure with status CLOSED exists.
    pub year_closed: bool,
    /// Income summed across all closure records of the year.
    pub total_income: Decimal,
    /// Expense summed across all closure records of the year.
    pub total_expense: Decimal,
    /// Result summed across all closure records of the year.
    pub total_result: Decimal,
    /// The underlying records.
    pub closures: Vec<ClosureRecord>,
}

/// Totals and persisted entries produced by the closing-entry generator.
#[derive(Debug)]
pub struct GenerationOutcome {
    /// Aggregate income/expense/result for the period.
    pub totals: ClosureTotals,
    /// The closing entries created (0, 1, or 2).
    pub entries: Vec<JournalEntry>,
}

/// Result of a successful monthly close.
#[derive(Debug)]
pub struct MonthCloseOutcome {
    /// The closure record created.
    pub closure: ClosureRecord,
    /// The closing entries posted.
    pub entries: Vec<JournalEntry>,
    /// The validation report the close passed.
    pub validation: ValidationReport,
}

/// Result of a successful annual close.
#[derive(Debug)]
pub struct YearCloseOutcome {
    /// The closure record created.
    pub closure: ClosureRecord,
    /// The closing entries posted.
    pub entries: Vec<JournalEntry>,
    /// The validation report the close passed.
    pub validation: ValidationReport,
    /// True if an active budget for the year was transitioned to closed.
    pub budget_closed: bool,
}
