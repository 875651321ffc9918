//! Closing-entry generation.
//!
//! For a validated period, computes aggregate income and expense by
//! account-code convention and synthesizes the entries that zero the result
//! accounts into the equity/result account. Posting the entries is a side
//! effect; the orchestrator guarantees it happens at most once per
//! successful close.

use rust_decimal::Decimal;
use tesoria_shared::ClosureConfig;

use super::error::ClosureError;
use super::period::Period;
use super::types::{ClosureTotals, GenerationOutcome};
use crate::gateway::{EntryLine, JournalEntry, LedgerGateway, NewClosingEntry};

/// Computes aggregate income and expense for a set of entries.
///
/// Income accounts (code prefixed by `config.income_prefix`) accumulate
/// `credit - debit`; expense accounts (`config.expense_prefix`) accumulate
/// `debit - credit`.
#[must_use]
pub fn aggregate_totals(entries: &[JournalEntry], config: &ClosureConfig) -> ClosureTotals {
    let mut income = Decimal::ZERO;
    let mut expense = Decimal::ZERO;

    for entry in entries {
        for line in &entry.lines {
            if line.account_code.starts_with(&config.income_prefix) {
                income += line.credit - line.debit;
            }
            if line.account_code.starts_with(&config.expense_prefix) {
                expense += line.debit - line.credit;
            }
        }
    }

    ClosureTotals::new(income, expense)
}

/// Synthesizes the closing entries for a period's totals.
///
/// Produces 0, 1, or 2 entries dated at the period's last calendar day; a
/// side whose aggregate is not positive is skipped.
#[must_use]
pub fn build_closing_entries(
    period: &Period,
    totals: &ClosureTotals,
    config: &ClosureConfig,
) -> Vec<NewClosingEntry> {
    let entry_date = period.last_day();
    let mut entries = Vec::with_capacity(2);

    if totals.total_income > Decimal::ZERO {
        entries.push(NewClosingEntry::closing(
            entry_date,
            format!("Income closing for period {period}"),
            vec![
                EntryLine::debit(config.income_summary_account.clone(), totals.total_income),
                EntryLine::credit(config.result_account.clone(), totals.total_income),
            ],
        ));
    }

    if totals.total_expense > Decimal::ZERO {
        entries.push(NewClosingEntry::closing(
            entry_date,
            format!("Expense closing for period {period}"),
            vec![
                EntryLine::debit(config.result_account.clone(), totals.total_expense),
                EntryLine::credit(
                    config.expense_summary_account.clone(),
                    totals.total_expense,
                ),
            ],
        ));
    }

    entries
}

/// Generates and persists closing entries for a period.
pub struct ClosingEntryGenerator<'a> {
    gateway: &'a dyn LedgerGateway,
    config: &'a ClosureConfig,
}

impl<'a> ClosingEntryGenerator<'a> {
    /// Creates a generator writing through the given gateway.
    #[must_use]
    pub fn new(gateway: &'a dyn LedgerGateway, config: &'a ClosureConfig) -> Self {
        Self { gateway, config }
    }

    /// Computes totals for the period and posts the closing entries.
    ///
    /// Not idempotent: a second call for the same period would double-post.
    /// The orchestrator's already-closed guard keeps this to one call per
    /// successful close.
    ///
    /// # Errors
    ///
    /// Returns [`ClosureError::Gateway`] if a read or write fails; no further
    /// entries are posted after the first failure.
    pub async fn generate(&self, period: &Period) -> Result<GenerationOutcome, ClosureError> {
        let entries = self.gateway.entries_in_range(&period.date_range()).await?;
        let totals = aggregate_totals(&entries, self.config);

        let mut created = Vec::new();
        for new_entry in build_closing_entries(period, &totals, self.config) {
            created.push(self.gateway.create_closing_entry(new_entry).await?);
        }

        Ok(GenerationOutcome {
            totals,
            entries: created,
        })
    }
}
