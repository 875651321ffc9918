//! Abstract data-access seams for the closure engine.
//!
//! The engine never talks to a storage backend directly. It reads ledger data
//! and persists its outputs through two narrow traits:
//!
//! - [`LedgerGateway`] - read access to accounting entries, treasury
//!   transactions, bank reconciliations, and budgets; write access for
//!   closing entries and budget status.
//! - [`ClosureStore`] - raw persistence for [`ClosureRecord`]s. Invariant
//!   enforcement lives in [`crate::closure::ClosureLedger`], not here.
//!
//! Implementations backed by a real database are expected to wrap the
//! closing-entry writes and the closure-record insert of one close operation
//! in a single storage transaction.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tesoria_shared::types::{BudgetId, ClosureId, EntryId};

use crate::closure::period::Period;
use crate::closure::types::{ClosureFilter, ClosureRecord};

/// Half-open date-time range `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// Inclusive lower bound.
    pub start: NaiveDateTime,
    /// Exclusive upper bound.
    pub end: NaiveDateTime,
}

impl DateRange {
    /// Returns true if the instant falls inside the range.
    #[must_use]
    pub fn contains(&self, at: NaiveDateTime) -> bool {
        at >= self.start && at < self.end
    }

    /// Returns true if the whole `[start, end]` day span falls inside the range.
    #[must_use]
    pub fn contains_day_span(&self, start: NaiveDate, end: NaiveDate) -> bool {
        let start_at = start.and_hms_opt(0, 0, 0).unwrap();
        let end_at = end.and_hms_opt(0, 0, 0).unwrap();
        self.contains(start_at) && self.contains(end_at)
    }
}

/// Treasury transaction status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    /// Committed but not yet accrued. Blocks period closing.
    #[serde(rename = "COMPROMISO")]
    CommittedPendingAccrual,
    /// Accrued against the ledger.
    #[serde(rename = "DEVENGADO")]
    Accrued,
    /// Fully paid out.
    #[serde(rename = "PAGADO")]
    Paid,
}

/// Bank reconciliation status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReconciliationStatus {
    /// Being drafted.
    Draft,
    /// Awaiting approval.
    Pending,
    /// Approved. Only approved reconciliations allow closing.
    Approved,
}

/// Budget status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BudgetStatus {
    /// Budget is in execution.
    Active,
    /// Budget was closed together with its fiscal year.
    Closed,
}

/// Accounting entry classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    /// Ordinary bookkeeping entry.
    #[serde(rename = "NORMAL")]
    Regular,
    /// Closing entry produced by the engine.
    #[serde(rename = "CIERRE")]
    Closing,
}

/// A single debit/credit line of an accounting entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryLine {
    /// Chart-of-accounts code the line posts to.
    pub account_code: String,
    /// Debit amount (zero for credit lines).
    pub debit: Decimal,
    /// Credit amount (zero for debit lines).
    pub credit: Decimal,
}

impl EntryLine {
    /// Builds a debit line.
    #[must_use]
    pub fn debit(account_code: impl Into<String>, amount: Decimal) -> Self {
        Self {
            account_code: account_code.into(),
            debit: amount,
            credit: Decimal::ZERO,
        }
    }

    /// Builds a credit line.
    #[must_use]
    pub fn credit(account_code: impl Into<String>, amount: Decimal) -> Self {
        Self {
            account_code: account_code.into(),
            debit: Decimal::ZERO,
            credit: amount,
        }
    }
}

/// An accounting entry with its detail lines, as read from the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Unique identifier.
    pub id: EntryId,
    /// Date the entry is booked under.
    pub entry_date: NaiveDate,
    /// Human-readable description.
    pub description: String,
    /// Entry classification.
    pub kind: EntryKind,
    /// Debit/credit detail lines.
    pub lines: Vec<EntryLine>,
}

/// A closing entry to be persisted through the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewClosingEntry {
    /// Date the entry is booked under (last day of the closed period).
    pub entry_date: NaiveDate,
    /// Human-readable description.
    pub description: String,
    /// Entry classification; always [`EntryKind::Closing`].
    pub kind: EntryKind,
    /// Debit/credit detail lines.
    pub lines: Vec<EntryLine>,
}

impl NewClosingEntry {
    /// Builds a closing entry for the given date.
    #[must_use]
    pub fn closing(entry_date: NaiveDate, description: String, lines: Vec<EntryLine>) -> Self {
        Self {
            entry_date,
            description,
            kind: EntryKind::Closing,
            lines,
        }
    }
}

/// A budget as seen through the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    /// Unique identifier.
    pub id: BudgetId,
    /// Fiscal year the budget covers.
    pub year: i32,
    /// Budget name.
    pub name: String,
    /// Current status.
    pub status: BudgetStatus,
}

/// Error raised by a [`LedgerGateway`] implementation.
///
/// Lower-level storage errors propagate unchanged inside the message; the
/// engine never swallows or reclassifies them.
#[derive(Debug, thiserror::Error)]
#[error("ledger gateway error: {0}")]
pub struct GatewayError(pub String);

/// Error raised by a [`ClosureStore`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A CLOSED record already exists for the `(year, month, type)` key.
    ///
    /// Implementations enforce this with a unique constraint so that two
    /// concurrent closes racing past the already-closed guard cannot both
    /// commit.
    #[error("a closed record already exists for this period key")]
    DuplicateClosedKey,

    /// Record to update does not exist.
    #[error("closure record not found: {0}")]
    RecordMissing(ClosureId),

    /// Any other storage failure, propagated unchanged.
    #[error("closure store error: {0}")]
    Storage(String),
}

/// Read/write access to the ledger data the closure engine depends on.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Counts treasury transactions with the given status created inside the range.
    async fn count_transactions(
        &self,
        status: TransactionStatus,
        range: &DateRange,
    ) -> Result<u64, GatewayError>;

    /// Counts bank reconciliations whose status is *not* the given one and
    /// whose period falls inside the range.
    async fn count_reconciliations_excluding(
        &self,
        status: ReconciliationStatus,
        range: &DateRange,
    ) -> Result<u64, GatewayError>;

    /// Fetches all accounting entries (with detail lines) dated inside the range.
    async fn entries_in_range(&self, range: &DateRange) -> Result<Vec<JournalEntry>, GatewayError>;

    /// Persists a closing entry and returns it with its assigned identifier.
    async fn create_closing_entry(
        &self,
        entry: NewClosingEntry,
    ) -> Result<JournalEntry, GatewayError>;

    /// Finds the budget for a year with the given status, if any.
    async fn find_budget(
        &self,
        year: i32,
        status: BudgetStatus,
    ) -> Result<Option<Budget>, GatewayError>;

    /// Updates a budget's status.
    async fn set_budget_status(
        &self,
        id: BudgetId,
        status: BudgetStatus,
    ) -> Result<(), GatewayError>;
}

/// Raw persistence for closure records.
///
/// Keeps no business rules beyond the unique CLOSED-key constraint; ordering,
/// transition checks, and stats live in [`crate::closure::ClosureLedger`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClosureStore: Send + Sync {
    /// Inserts a new closure record.
    async fn insert(&self, record: ClosureRecord) -> Result<(), StoreError>;

    /// Finds a record by id.
    async fn find_by_id(&self, id: ClosureId) -> Result<Option<ClosureRecord>, StoreError>;

    /// Finds the CLOSED record for the exact period key, if any.
    async fn find_closed(&self, period: &Period) -> Result<Option<ClosureRecord>, StoreError>;

    /// Replaces an existing record (matched by id).
    async fn update(&self, record: ClosureRecord) -> Result<(), StoreError>;

    /// Lists records matching the filter, in no particular order.
    async fn list(&self, filter: &ClosureFilter) -> Result<Vec<ClosureRecord>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_date_range_half_open() {
        let range = DateRange {
            start: at(2025, 3, 1),
            end: at(2025, 4, 1),
        };
        assert!(range.contains(at(2025, 3, 1)));
        assert!(range.contains(at(2025, 3, 31)));
        assert!(!range.contains(at(2025, 4, 1)));
        assert!(!range.contains(at(2025, 2, 28)));
    }

    #[test]
    fn test_contains_day_span() {
        let range = DateRange {
            start: at(2025, 3, 1),
            end: at(2025, 4, 1),
        };
        let d = |day| NaiveDate::from_ymd_opt(2025, 3, day).unwrap();
        assert!(range.contains_day_span(d(1), d(31)));
        assert!(!range.contains_day_span(
            NaiveDate::from_ymd_opt(2025, 2, 15).unwrap(),
            d(15)
        ));
    }

    #[test]
    fn test_entry_line_builders() {
        let line = EntryLine::debit("4300", Decimal::new(100, 0));
        assert_eq!(line.debit, Decimal::new(100, 0));
        assert_eq!(line.credit, Decimal::ZERO);

        let line = EntryLine::credit("3999", Decimal::new(100, 0));
        assert_eq!(line.credit, Decimal::new(100, 0));
        assert_eq!(line.debit, Decimal::ZERO);
    }

    #[test]
    fn test_closing_entry_is_tagged_cierre() {
        let entry = NewClosingEntry::closing(
            NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
            "Income closing".to_string(),
            vec![],
        );
        assert_eq!(entry.kind, EntryKind::Closing);
        let json = serde_json::to_string(&entry.kind).unwrap();
        assert_eq!(json, "\"CIERRE\"");
    }
}
