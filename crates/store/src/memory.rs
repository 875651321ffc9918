//! In-memory ledger gateway and closure store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use tesoria_core::closure::period::Period;
use tesoria_core::closure::types::{ClosureFilter, ClosureRecord, ClosureStatus};
use tesoria_core::gateway::{
    Budget, BudgetStatus, ClosureStore, DateRange, GatewayError, JournalEntry, LedgerGateway,
    NewClosingEntry, ReconciliationStatus, StoreError, TransactionStatus,
};
use tesoria_shared::types::{BudgetId, EntryId, ReconciliationId, TransactionId};

/// A treasury transaction as held by the in-memory ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreasuryTransaction {
    /// Unique identifier.
    pub id: TransactionId,
    /// Current status.
    pub status: TransactionStatus,
    /// Creation timestamp; the pre-close check matches on this.
    pub created_at: NaiveDateTime,
    /// Human-readable description.
    pub description: String,
}

/// A bank reconciliation as held by the in-memory ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reconciliation {
    /// Unique identifier.
    pub id: ReconciliationId,
    /// Current status.
    pub status: ReconciliationStatus,
    /// First day of the reconciled span.
    pub period_start: NaiveDate,
    /// Last day of the reconciled span.
    pub period_end: NaiveDate,
}

#[derive(Default)]
struct LedgerState {
    entries: Vec<JournalEntry>,
    transactions: Vec<TreasuryTransaction>,
    reconciliations: Vec<Reconciliation>,
    budgets: Vec<Budget>,
}

/// In-memory [`LedgerGateway`] implementation.
///
/// Cheap to clone; all clones share the same state.
#[derive(Clone, Default)]
pub struct MemoryLedger {
    inner: Arc<RwLock<LedgerState>>,
}

impl MemoryLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Posts an ordinary accounting entry and returns its id.
    pub async fn post_entry(
        &self,
        entry_date: NaiveDate,
        description: impl Into<String>,
        lines: Vec<tesoria_core::gateway::EntryLine>,
    ) -> EntryId {
        let entry = JournalEntry {
            id: EntryId::new(),
            entry_date,
            description: description.into(),
            kind: tesoria_core::gateway::EntryKind::Regular,
            lines,
        };
        let id = entry.id;
        self.inner.write().await.entries.push(entry);
        id
    }

    /// Adds a treasury transaction.
    pub async fn add_transaction(
        &self,
        status: TransactionStatus,
        created_at: NaiveDateTime,
        description: impl Into<String>,
    ) -> TransactionId {
        let transaction = TreasuryTransaction {
            id: TransactionId::new(),
            status,
            created_at,
            description: description.into(),
        };
        let id = transaction.id;
        self.inner.write().await.transactions.push(transaction);
        id
    }

    /// Adds a bank reconciliation.
    pub async fn add_reconciliation(
        &self,
        status: ReconciliationStatus,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> ReconciliationId {
        let reconciliation = Reconciliation {
            id: ReconciliationId::new(),
            status,
            period_start,
            period_end,
        };
        let id = reconciliation.id;
        self.inner.write().await.reconciliations.push(reconciliation);
        id
    }

    /// Adds a budget.
    pub async fn add_budget(
        &self,
        year: i32,
        name: impl Into<String>,
        status: BudgetStatus,
    ) -> BudgetId {
        let budget = Budget {
            id: BudgetId::new(),
            year,
            name: name.into(),
            status,
        };
        let id = budget.id;
        self.inner.write().await.budgets.push(budget);
        id
    }

    /// Returns all entries currently held, closing entries included.
    pub async fn all_entries(&self) -> Vec<JournalEntry> {
        self.inner.read().await.entries.clone()
    }
}

#[async_trait]
impl LedgerGateway for MemoryLedger {
    async fn count_transactions(
        &self,
        status: TransactionStatus,
        range: &DateRange,
    ) -> Result<u64, GatewayError> {
        let state = self.inner.read().await;
        Ok(state
            .transactions
            .iter()
            .filter(|t| t.status == status && range.contains(t.created_at))
            .count() as u64)
    }

    async fn count_reconciliations_excluding(
        &self,
        status: ReconciliationStatus,
        range: &DateRange,
    ) -> Result<u64, GatewayError> {
        let state = self.inner.read().await;
        Ok(state
            .reconciliations
            .iter()
            .filter(|r| {
                r.status != status && range.contains_day_span(r.period_start, r.period_end)
            })
            .count() as u64)
    }

    async fn entries_in_range(&self, range: &DateRange) -> Result<Vec<JournalEntry>, GatewayError> {
        let state = self.inner.read().await;
        Ok(state
            .entries
            .iter()
            .filter(|e| range.contains(e.entry_date.and_hms_opt(0, 0, 0).unwrap()))
            .cloned()
            .collect())
    }

    async fn create_closing_entry(
        &self,
        entry: NewClosingEntry,
    ) -> Result<JournalEntry, GatewayError> {
        let persisted = JournalEntry {
            id: EntryId::new(),
            entry_date: entry.entry_date,
            description: entry.description,
            kind: entry.kind,
            lines: entry.lines,
        };
        debug!(id = %persisted.id, date = %persisted.entry_date, "closing entry posted");
        self.inner.write().await.entries.push(persisted.clone());
        Ok(persisted)
    }

    async fn find_budget(
        &self,
        year: i32,
        status: BudgetStatus,
    ) -> Result<Option<Budget>, GatewayError> {
        let state = self.inner.read().await;
        Ok(state
            .budgets
            .iter()
            .find(|b| b.year == year && b.status == status)
            .cloned())
    }

    async fn set_budget_status(
        &self,
        id: BudgetId,
        status: BudgetStatus,
    ) -> Result<(), GatewayError> {
        let mut state = self.inner.write().await;
        let budget = state
            .budgets
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| GatewayError(format!("budget not found: {id}")))?;
        budget.status = status;
        debug!(%id, ?status, "budget status updated");
        Ok(())
    }
}

/// In-memory [`ClosureStore`] implementation.
///
/// Enforces the unique CLOSED-key constraint at insert, the way a
/// database-backed store does with a partial unique index.
#[derive(Clone, Default)]
pub struct MemoryClosureStore {
    inner: Arc<RwLock<Vec<ClosureRecord>>>,
}

impl MemoryClosureStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn same_key(a: &ClosureRecord, b: &ClosureRecord) -> bool {
    a.year == b.year && a.month == b.month && a.closure_type == b.closure_type
}

#[async_trait]
impl ClosureStore for MemoryClosureStore {
    async fn insert(&self, record: ClosureRecord) -> Result<(), StoreError> {
        let mut records = self.inner.write().await;
        let taken = records
            .iter()
            .any(|r| r.status == ClosureStatus::Closed && same_key(r, &record));
        if taken {
            return Err(StoreError::DuplicateClosedKey);
        }
        debug!(id = %record.id, year = record.year, month = ?record.month, "closure record inserted");
        records.push(record);
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: tesoria_shared::types::ClosureId,
    ) -> Result<Option<ClosureRecord>, StoreError> {
        let records = self.inner.read().await;
        Ok(records.iter().find(|r| r.id == id).cloned())
    }

    async fn find_closed(&self, period: &Period) -> Result<Option<ClosureRecord>, StoreError> {
        let records = self.inner.read().await;
        Ok(records
            .iter()
            .find(|r| {
                r.status == ClosureStatus::Closed
                    && r.year == period.year()
                    && r.month == period.month()
                    && r.closure_type == period.closure_type()
            })
            .cloned())
    }

    async fn update(&self, record: ClosureRecord) -> Result<(), StoreError> {
        let mut records = self.inner.write().await;
        let slot = records
            .iter_mut()
            .find(|r| r.id == record.id)
            .ok_or(StoreError::RecordMissing(record.id))?;
        *slot = record;
        Ok(())
    }

    async fn list(&self, filter: &ClosureFilter) -> Result<Vec<ClosureRecord>, StoreError> {
        let records = self.inner.read().await;
        Ok(records.iter().filter(|r| filter.matches(r)).cloned().collect())
    }
}
