//! Accounting period closure engine.
//!
//! This module implements monthly and annual ledger closing:
//! - Period model (calendar month or calendar year)
//! - Pre-close validation (pending accruals, reconciliations, trial balance)
//! - Closing-entry generation (income/expense zeroed into the result account)
//! - Closure ledger (authoritative closed/reopened record keeping)
//! - Orchestrating service (close, reopen, queries)
//! - Error types for closure operations

pub mod error;
pub mod generator;
pub mod ledger;
pub mod period;
pub mod service;
pub mod types;
pub mod validator;

#[cfg(test)]
mod props;

pub use error::ClosureError;
pub use generator::{aggregate_totals, build_closing_entries, ClosingEntryGenerator};
pub use ledger::ClosureLedger;
pub use period::Period;
pub use service::ClosureService;
pub use types::{
    ClosureFilter, ClosureRecord, ClosureStats, ClosureStatus, ClosureTotals, ClosureType,
    GenerationOutcome, MonthCloseOutcome, ValidationReport, YearCloseOutcome,
};
pub use validator::{trial_balance_error, PreCloseValidator};
