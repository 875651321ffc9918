//! Closure orchestration service.
//!
//! Public entry point for closing and reopening periods. Coordinates the
//! already-closed guard, the pre-close validator, the closing-entry
//! generator, and the closure ledger write, in that order; any failure
//! aborts before the next step's writes.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use tesoria_shared::types::{ActorId, ClosureId};
use tesoria_shared::ClosureConfig;

use super::error::ClosureError;
use super::generator::ClosingEntryGenerator;
use super::ledger::ClosureLedger;
use super::period::Period;
use super::types::{
    ClosureFilter, ClosureRecord, ClosureStats, ClosureStatus, ClosureType, MonthCloseOutcome,
    ValidationReport, YearCloseOutcome,
};
use super::validator::PreCloseValidator;
use crate::gateway::{BudgetStatus, ClosureStore, LedgerGateway};

/// Orchestrates period closing, reopening, and closure queries.
///
/// All collaborators are injected; the service holds no process-wide state.
/// Close operations are serialized through one async mutex so the
/// already-closed guard and the closure write cannot interleave between
/// concurrent in-process requests; the store's unique CLOSED-key constraint
/// remains the backstop across processes.
pub struct ClosureService {
    gateway: Arc<dyn LedgerGateway>,
    ledger: ClosureLedger,
    config: ClosureConfig,
    close_lock: Mutex<()>,
}

impl ClosureService {
    /// Creates a service over the given collaborators.
    #[must_use]
    pub fn new(
        gateway: Arc<dyn LedgerGateway>,
        store: Arc<dyn ClosureStore>,
        config: ClosureConfig,
    ) -> Self {
        Self {
            gateway,
            ledger: ClosureLedger::new(store),
            config,
            close_lock: Mutex::new(()),
        }
    }

    /// Closes one calendar month.
    ///
    /// # Errors
    ///
    /// - [`ClosureError::InvalidMonth`] for a month outside 1-12
    /// - [`ClosureError::AlreadyClosed`] if the month is already closed
    /// - [`ClosureError::Validation`] if pre-close checks find blockers
    pub async fn close_month(
        &self,
        year: i32,
        month: u32,
        actor: ActorId,
        notes: Option<String>,
    ) -> Result<MonthCloseOutcome, ClosureError> {
        let period = Period::monthly(year, month)?;
        let _guard = self.close_lock.lock().await;

        self.guard_not_closed(&period).await?;
        let validation = self.run_validation(&period).await?;
        let generated = ClosingEntryGenerator::new(self.gateway.as_ref(), &self.config)
            .generate(&period)
            .await?;
        let closure = self
            .write_closure(&period, generated.totals, actor, notes)
            .await?;

        info!(
            period = %period,
            result = %closure.result,
            entries = generated.entries.len(),
            "monthly period closed"
        );

        Ok(MonthCloseOutcome {
            closure,
            entries: generated.entries,
            validation,
        })
    }

    /// Closes a calendar year.
    ///
    /// Requires all twelve months of the year to be closed first. As a side
    /// effect, an active budget for the year is transitioned to closed.
    ///
    /// # Errors
    ///
    /// - [`ClosureError::AlreadyClosed`] if the year is already closed
    /// - [`ClosureError::IncompletePeriod`] if fewer than twelve monthly
    ///   closures are in CLOSED status
    /// - [`ClosureError::Validation`] if pre-close checks find blockers
    pub async fn close_year(
        &self,
        year: i32,
        actor: ActorId,
        notes: Option<String>,
    ) -> Result<YearCloseOutcome, ClosureError> {
        let period = Period::annual(year);
        let _guard = self.close_lock.lock().await;

        self.guard_not_closed(&period).await?;

        let months_closed = self
            .ledger
            .closures(&ClosureFilter {
                year: Some(year),
                closure_type: Some(ClosureType::Monthly),
                status: Some(ClosureStatus::Closed),
            })
            .await?
            .len() as u32;
        if months_closed != 12 {
            return Err(ClosureError::IncompletePeriod {
                year,
                months_closed,
            });
        }

        let validation = self.run_validation(&period).await?;
        let generated = ClosingEntryGenerator::new(self.gateway.as_ref(), &self.config)
            .generate(&period)
            .await?;

        let budget_closed = match self.gateway.find_budget(year, BudgetStatus::Active).await? {
            Some(budget) => {
                self.gateway
                    .set_budget_status(budget.id, BudgetStatus::Closed)
                    .await?;
                true
            }
            None => false,
        };

        let closure = self
            .write_closure(&period, generated.totals, actor, notes)
            .await?;

        info!(
            year,
            result = %closure.result,
            budget_closed,
            "annual period closed"
        );

        Ok(YearCloseOutcome {
            closure,
            entries: generated.entries,
            validation,
            budget_closed,
        })
    }

    /// Reopens a closed period for correction.
    ///
    /// Delegates to the closure ledger; no rules beyond its transition check.
    pub async fn reopen_period(
        &self,
        closure_id: ClosureId,
        reason: String,
        actor: ActorId,
    ) -> Result<ClosureRecord, ClosureError> {
        let reopened = self.ledger.reopen(closure_id, reason, actor).await?;
        info!(%closure_id, period = %reopened.period(), "period reopened");
        Ok(reopened)
    }

    /// Returns true iff the period is currently closed.
    ///
    /// `month = None` queries the annual period.
    pub async fn is_period_closed(
        &self,
        year: i32,
        month: Option<u32>,
    ) -> Result<bool, ClosureError> {
        let period = match month {
            Some(m) => Period::monthly(year, m)?,
            None => Period::annual(year),
        };
        self.ledger.is_period_closed(&period).await
    }

    /// Lists closure records matching the filter.
    pub async fn closures(
        &self,
        filter: &ClosureFilter,
    ) -> Result<Vec<ClosureRecord>, ClosureError> {
        self.ledger.closures(filter).await
    }

    /// Fetches a closure record by id.
    pub async fn closure(&self, closure_id: ClosureId) -> Result<ClosureRecord, ClosureError> {
        self.ledger.get(closure_id).await
    }

    /// Computes yearly closure statistics.
    pub async fn stats(&self, year: i32) -> Result<ClosureStats, ClosureError> {
        self.ledger.stats(year).await
    }

    async fn guard_not_closed(&self, period: &Period) -> Result<(), ClosureError> {
        if self.ledger.is_period_closed(period).await? {
            return Err(ClosureError::AlreadyClosed { period: *period });
        }
        Ok(())
    }

    async fn run_validation(&self, period: &Period) -> Result<ValidationReport, ClosureError> {
        let validation = PreCloseValidator::new(self.gateway.as_ref(), &self.config)
            .validate(period)
            .await?;
        if !validation.is_valid() {
            return Err(ClosureError::Validation {
                errors: validation.errors,
            });
        }
        Ok(validation)
    }

    async fn write_closure(
        &self,
        period: &Period,
        totals: super::types::ClosureTotals,
        actor: ActorId,
        notes: Option<String>,
    ) -> Result<ClosureRecord, ClosureError> {
        match self
            .ledger
            .record_closure(period, totals, actor, notes)
            .await
        {
            // The key was taken between guard and write; surface it the same
            // way the guard would have.
            Err(ClosureError::Conflict) => Err(ClosureError::AlreadyClosed { period: *period }),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use tesoria_shared::types::{BudgetId, EntryId};

    use crate::closure::types::ClosureTotals;
    use crate::gateway::{
        Budget, EntryKind, EntryLine, JournalEntry, MockClosureStore, MockLedgerGateway,
    };

    fn balanced_income_entry() -> JournalEntry {
        JournalEntry {
            id: EntryId::new(),
            entry_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            description: "Tax collection".to_string(),
            kind: EntryKind::Regular,
            lines: vec![
                EntryLine::debit("1000", dec!(10000)),
                EntryLine::credit("4300", dec!(10000)),
            ],
        }
    }

    fn clean_gateway(entries: Vec<JournalEntry>) -> MockLedgerGateway {
        let mut gateway = MockLedgerGateway::new();
        gateway.expect_count_transactions().returning(|_, _| Ok(0));
        gateway
            .expect_count_reconciliations_excluding()
            .returning(|_, _| Ok(0));
        gateway
            .expect_entries_in_range()
            .returning(move |_| Ok(entries.clone()));
        gateway
            .expect_create_closing_entry()
            .returning(|new_entry| {
                Ok(JournalEntry {
                    id: EntryId::new(),
                    entry_date: new_entry.entry_date,
                    description: new_entry.description,
                    kind: new_entry.kind,
                    lines: new_entry.lines,
                })
            });
        gateway
    }

    fn empty_store() -> MockClosureStore {
        let mut store = MockClosureStore::new();
        store.expect_find_closed().returning(|_| Ok(None));
        store.expect_insert().returning(|_| Ok(()));
        store
    }

    fn service(gateway: MockLedgerGateway, store: MockClosureStore) -> ClosureService {
        ClosureService::new(
            Arc::new(gateway),
            Arc::new(store),
            ClosureConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_close_month_happy_path() {
        let svc = service(clean_gateway(vec![balanced_income_entry()]), empty_store());

        let outcome = svc
            .close_month(2025, 3, ActorId::new(), None)
            .await
            .unwrap();

        assert_eq!(outcome.closure.year, 2025);
        assert_eq!(outcome.closure.month, Some(3));
        assert_eq!(outcome.closure.status, ClosureStatus::Closed);
        assert_eq!(outcome.closure.total_income, dec!(10000));
        assert_eq!(outcome.entries.len(), 1);
        assert!(outcome.validation.is_valid());
    }

    #[tokio::test]
    async fn test_close_month_invalid_month() {
        // The mocks must not be touched at all.
        let svc = service(MockLedgerGateway::new(), MockClosureStore::new());
        let result = svc.close_month(2025, 13, ActorId::new(), None).await;
        assert!(matches!(result, Err(ClosureError::InvalidMonth(13))));
    }

    #[tokio::test]
    async fn test_close_month_already_closed_skips_validation() {
        // Gateway has no expectations: reaching the validator would panic.
        let gateway = MockLedgerGateway::new();
        let mut store = MockClosureStore::new();
        store.expect_find_closed().returning(|period| {
            Ok(Some(ClosureRecord::closed(
                period,
                ClosureTotals::new(dec!(0), dec!(0)),
                ActorId::new(),
                None,
            )))
        });

        let svc = service(gateway, store);
        let result = svc.close_month(2025, 3, ActorId::new(), None).await;
        assert!(matches!(result, Err(ClosureError::AlreadyClosed { .. })));
    }

    #[tokio::test]
    async fn test_close_month_validation_failure_skips_generator() {
        let mut gateway = MockLedgerGateway::new();
        gateway.expect_count_transactions().returning(|_, _| Ok(2));
        gateway
            .expect_count_reconciliations_excluding()
            .returning(|_, _| Ok(0));
        gateway.expect_entries_in_range().returning(|_| Ok(vec![]));
        // No expect_create_closing_entry: posting would panic the mock.

        let mut store = MockClosureStore::new();
        store.expect_find_closed().returning(|_| Ok(None));

        let svc = service(gateway, store);
        let result = svc.close_month(2025, 3, ActorId::new(), None).await;

        match result {
            Err(ClosureError::Validation { errors }) => {
                assert_eq!(errors.len(), 1);
                assert!(errors[0].contains("2 committed transaction(s)"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_close_month_maps_store_conflict_to_already_closed() {
        let gateway = clean_gateway(vec![]);
        let mut store = MockClosureStore::new();
        store.expect_find_closed().returning(|_| Ok(None));
        store
            .expect_insert()
            .returning(|_| Err(crate::gateway::StoreError::DuplicateClosedKey));

        let svc = service(gateway, store);
        let result = svc.close_month(2025, 3, ActorId::new(), None).await;
        assert!(matches!(result, Err(ClosureError::AlreadyClosed { .. })));
    }

    #[tokio::test]
    async fn test_close_year_incomplete_months() {
        let gateway = MockLedgerGateway::new();
        let mut store = MockClosureStore::new();
        store.expect_find_closed().returning(|_| Ok(None));
        store.expect_list().returning(|_| {
            let closures = (1..=7)
                .map(|m| {
                    ClosureRecord::closed(
                        &Period::monthly(2025, m).unwrap(),
                        ClosureTotals::new(dec!(0), dec!(0)),
                        ActorId::new(),
                        None,
                    )
                })
                .collect();
            Ok(closures)
        });

        let svc = service(gateway, store);
        let result = svc.close_year(2025, ActorId::new(), None).await;
        assert!(matches!(
            result,
            Err(ClosureError::IncompletePeriod {
                year: 2025,
                months_closed: 7
            })
        ));
    }

    #[tokio::test]
    async fn test_close_year_closes_active_budget() {
        let mut gateway = clean_gateway(vec![]);
        let budget_id = BudgetId::new();
        gateway.expect_find_budget().returning(move |year, _| {
            Ok(Some(Budget {
                id: budget_id,
                year,
                name: format!("Budget {year}"),
                status: BudgetStatus::Active,
            }))
        });
        gateway
            .expect_set_budget_status()
            .withf(move |id, status| *id == budget_id && *status == BudgetStatus::Closed)
            .times(1)
            .returning(|_, _| Ok(()));

        let mut store = MockClosureStore::new();
        store.expect_find_closed().returning(|_| Ok(None));
        store.expect_insert().returning(|_| Ok(()));
        store.expect_list().returning(|_| {
            let closures = (1..=12)
                .map(|m| {
                    ClosureRecord::closed(
                        &Period::monthly(2025, m).unwrap(),
                        ClosureTotals::new(dec!(0), dec!(0)),
                        ActorId::new(),
                        None,
                    )
                })
                .collect();
            Ok(closures)
        });

        let svc = service(gateway, store);
        let outcome = svc.close_year(2025, ActorId::new(), None).await.unwrap();

        assert!(outcome.budget_closed);
        assert_eq!(outcome.closure.closure_type, ClosureType::Annual);
        assert_eq!(outcome.closure.month, None);
    }

    #[tokio::test]
    async fn test_close_year_without_budget() {
        let mut gateway = clean_gateway(vec![]);
        gateway.expect_find_budget().returning(|_, _| Ok(None));

        let mut store = MockClosureStore::new();
        store.expect_find_closed().returning(|_| Ok(None));
        store.expect_insert().returning(|_| Ok(()));
        store.expect_list().returning(|_| {
            let closures = (1..=12)
                .map(|m| {
                    ClosureRecord::closed(
                        &Period::monthly(2025, m).unwrap(),
                        ClosureTotals::new(dec!(0), dec!(0)),
                        ActorId::new(),
                        None,
                    )
                })
                .collect();
            Ok(closures)
        });

        let svc = service(gateway, store);
        let outcome = svc.close_year(2025, ActorId::new(), None).await.unwrap();
        assert!(!outcome.budget_closed);
    }

    #[tokio::test]
    async fn test_is_period_closed_queries() {
        let gateway = MockLedgerGateway::new();
        let mut store = MockClosureStore::new();
        store
            .expect_find_closed()
            .returning(|period| match *period {
                Period::Annual { .. } => Ok(Some(ClosureRecord::closed(
                    period,
                    ClosureTotals::new(dec!(0), dec!(0)),
                    ActorId::new(),
                    None,
                ))),
                Period::Monthly { .. } => Ok(None),
            });

        let svc = service(gateway, store);
        assert!(svc.is_period_closed(2025, None).await.unwrap());
        assert!(!svc.is_period_closed(2025, Some(6)).await.unwrap());
        assert!(matches!(
            svc.is_period_closed(2025, Some(0)).await,
            Err(ClosureError::InvalidMonth(0))
        ));
    }
}
