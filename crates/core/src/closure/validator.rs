//! Pre-close validation.
//!
//! Decides whether a period may be closed. The three checks run
//! independently and their violations accumulate, so callers see every
//! blocker in one round trip. Purely read-and-decide; safe to call any
//! number of times.

use rust_decimal::Decimal;
use tesoria_shared::ClosureConfig;

use super::error::ClosureError;
use super::period::Period;
use super::types::ValidationReport;
use crate::gateway::{LedgerGateway, ReconciliationStatus, TransactionStatus};

/// Validates that a period's data permits closing.
pub struct PreCloseValidator<'a> {
    gateway: &'a dyn LedgerGateway,
    config: &'a ClosureConfig,
}

impl<'a> PreCloseValidator<'a> {
    /// Creates a validator reading through the given gateway.
    #[must_use]
    pub fn new(gateway: &'a dyn LedgerGateway, config: &'a ClosureConfig) -> Self {
        Self { gateway, config }
    }

    /// Runs all pre-close checks for the period.
    ///
    /// # Errors
    ///
    /// Returns [`ClosureError::Gateway`] if a read fails. Check violations do
    /// not error here; they land in the report's `errors` list.
    pub async fn validate(&self, period: &Period) -> Result<ValidationReport, ClosureError> {
        let range = period.date_range();
        let mut report = ValidationReport::default();

        let pending = self
            .gateway
            .count_transactions(TransactionStatus::CommittedPendingAccrual, &range)
            .await?;
        if pending > 0 {
            report.push_error(format!(
                "{pending} committed transaction(s) pending accrual in the period"
            ));
        }

        let unapproved = self
            .gateway
            .count_reconciliations_excluding(ReconciliationStatus::Approved, &range)
            .await?;
        if unapproved > 0 {
            report.push_error(format!(
                "{unapproved} bank reconciliation(s) not yet approved in the period"
            ));
        }

        let entries = self.gateway.entries_in_range(&range).await?;
        let mut total_debit = Decimal::ZERO;
        let mut total_credit = Decimal::ZERO;
        for entry in &entries {
            for line in &entry.lines {
                total_debit += line.debit;
                total_credit += line.credit;
            }
        }
        if let Some(message) =
            trial_balance_error(total_debit, total_credit, self.config.trial_balance_tolerance)
        {
            report.push_error(message);
        }

        Ok(report)
    }
}

/// Checks the trial balance against an absolute tolerance.
///
/// Returns a violation message naming both totals when
/// `|debit - credit| > tolerance`, `None` otherwise. The tolerance absorbs
/// rounding noise from upstream systems.
#[must_use]
pub fn trial_balance_error(
    total_debit: Decimal,
    total_credit: Decimal,
    tolerance: Decimal,
) -> Option<String> {
    if (total_debit - total_credit).abs() > tolerance {
        Some(format!(
            "trial balance mismatch: total debit {total_debit}, total credit {total_credit}"
        ))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use tesoria_shared::types::EntryId;

    use crate::gateway::{EntryKind, EntryLine, JournalEntry, MockLedgerGateway};

    fn entry(lines: Vec<EntryLine>) -> JournalEntry {
        JournalEntry {
            id: EntryId::new(),
            entry_date: NaiveDate::from_ymd_opt(2025, 3, 15).unwrap(),
            description: "Test entry".to_string(),
            kind: EntryKind::Regular,
            lines,
        }
    }

    fn gateway(pending: u64, unapproved: u64, entries: Vec<JournalEntry>) -> MockLedgerGateway {
        let mut gateway = MockLedgerGateway::new();
        gateway
            .expect_count_transactions()
            .returning(move |_, _| Ok(pending));
        gateway
            .expect_count_reconciliations_excluding()
            .returning(move |_, _| Ok(unapproved));
        gateway
            .expect_entries_in_range()
            .returning(move |_| Ok(entries.clone()));
        gateway
    }

    #[tokio::test]
    async fn test_clean_period_is_valid() {
        let gateway = gateway(
            0,
            0,
            vec![entry(vec![
                EntryLine::debit("1000", dec!(100)),
                EntryLine::credit("4300", dec!(100)),
            ])],
        );
        let config = ClosureConfig::default();
        let period = Period::monthly(2025, 3).unwrap();

        let report = PreCloseValidator::new(&gateway, &config)
            .validate(&period)
            .await
            .unwrap();

        assert!(report.is_valid());
        assert!(report.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_violations_accumulate_in_check_order() {
        let gateway = gateway(
            3,
            2,
            vec![entry(vec![
                EntryLine::debit("1000", dec!(100)),
                EntryLine::credit("4300", dec!(50)),
            ])],
        );
        let config = ClosureConfig::default();
        let period = Period::monthly(2025, 3).unwrap();

        let report = PreCloseValidator::new(&gateway, &config)
            .validate(&period)
            .await
            .unwrap();

        assert!(!report.is_valid());
        assert_eq!(report.errors.len(), 3);
        assert!(report.errors[0].contains("3 committed transaction(s)"));
        assert!(report.errors[1].contains("2 bank reconciliation(s)"));
        assert!(report.errors[2].contains("total debit 100"));
        assert!(report.errors[2].contains("total credit 50"));
    }

    #[tokio::test]
    async fn test_empty_period_is_valid() {
        let gateway = gateway(0, 0, vec![]);
        let config = ClosureConfig::default();
        let period = Period::annual(2025);

        let report = PreCloseValidator::new(&gateway, &config)
            .validate(&period)
            .await
            .unwrap();

        assert!(report.is_valid());
    }

    #[test]
    fn test_trial_balance_within_tolerance_passes() {
        assert!(trial_balance_error(dec!(100.00), dec!(100.01), dec!(0.01)).is_none());
        assert!(trial_balance_error(dec!(100.01), dec!(100.00), dec!(0.01)).is_none());
        assert!(trial_balance_error(dec!(100), dec!(100), dec!(0.01)).is_none());
    }

    #[test]
    fn test_trial_balance_beyond_tolerance_fails() {
        let message = trial_balance_error(dec!(100.00), dec!(100.02), dec!(0.01)).unwrap();
        assert!(message.contains("100.00"));
        assert!(message.contains("100.02"));
    }
}
