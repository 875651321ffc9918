//! Closure ledger: the authoritative record of closed and reopened periods.
//!
//! Wraps a [`ClosureStore`] and enforces the record-level invariants: one
//! CLOSED record per period key, and `Closed -> Reopened` as the only status
//! transition.

use std::cmp::Reverse;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tesoria_shared::types::{ActorId, ClosureId};

use super::error::ClosureError;
use super::period::Period;
use super::types::{
    ClosureFilter, ClosureRecord, ClosureStats, ClosureStatus, ClosureTotals, ClosureType,
};
use crate::gateway::{ClosureStore, StoreError};

/// Query and persistence front for closure records.
#[derive(Clone)]
pub struct ClosureLedger {
    store: Arc<dyn ClosureStore>,
}

impl ClosureLedger {
    /// Creates a ledger over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn ClosureStore>) -> Self {
        Self { store }
    }

    /// Returns true iff a CLOSED record exists for the exact period key.
    ///
    /// A reopened record does not count as closed.
    pub async fn is_period_closed(&self, period: &Period) -> Result<bool, ClosureError> {
        Ok(self.store.find_closed(period).await?.is_some())
    }

    /// Creates a new CLOSED record for the period.
    ///
    /// # Errors
    ///
    /// Returns [`ClosureError::Conflict`] if a CLOSED record already exists
    /// for the key, whether detected by the pre-check or by the store's
    /// unique-key constraint.
    pub async fn record_closure(
        &self,
        period: &Period,
        totals: ClosureTotals,
        actor: ActorId,
        notes: Option<String>,
    ) -> Result<ClosureRecord, ClosureError> {
        if self.store.find_closed(period).await?.is_some() {
            return Err(ClosureError::Conflict);
        }

        let record = ClosureRecord::closed(period, totals, actor, notes);
        match self.store.insert(record.clone()).await {
            Ok(()) => Ok(record),
            Err(StoreError::DuplicateClosedKey) => Err(ClosureError::Conflict),
            Err(other) => Err(other.into()),
        }
    }

    /// Reopens a closed period, annotating the record.
    ///
    /// # Errors
    ///
    /// Returns [`ClosureError::NotFound`] if no record with the id exists, or
    /// [`ClosureError::InvalidState`] if the record is not CLOSED.
    pub async fn reopen(
        &self,
        closure_id: ClosureId,
        reason: String,
        actor: ActorId,
    ) -> Result<ClosureRecord, ClosureError> {
        let mut record = self
            .store
            .find_by_id(closure_id)
            .await?
            .ok_or(ClosureError::NotFound(closure_id))?;

        if record.status != ClosureStatus::Closed {
            return Err(ClosureError::InvalidState {
                status: record.status,
            });
        }

        record.status = ClosureStatus::Reopened;
        record.reopened_by = Some(actor);
        record.reopened_at = Some(Utc::now());
        record.reopen_reason = Some(reason);

        self.store.update(record.clone()).await?;
        Ok(record)
    }

    /// Fetches a record by id.
    pub async fn get(&self, closure_id: ClosureId) -> Result<ClosureRecord, ClosureError> {
        self.store
            .find_by_id(closure_id)
            .await?
            .ok_or(ClosureError::NotFound(closure_id))
    }

    /// Lists records matching the filter, ordered by `(year desc, month desc)`.
    ///
    /// Annual records (no month) sort after the months of their year.
    pub async fn closures(
        &self,
        filter: &ClosureFilter,
    ) -> Result<Vec<ClosureRecord>, ClosureError> {
        let mut records = self.store.list(filter).await?;
        records.sort_by_key(|r| (Reverse(r.year), Reverse(r.month.unwrap_or(0))));
        Ok(records)
    }

    /// Computes yearly closure statistics.
    ///
    /// Income, expense, and result are summed across *all* closure records of
    /// the year. When both the twelve monthly closures and the annual closure
    /// exist, the year's activity is counted twice; this mirrors the upstream
    /// reporting behavior and is intentional.
    pub async fn stats(&self, year: i32) -> Result<ClosureStats, ClosureError> {
        let closures = self
            .closures(&ClosureFilter {
                year: Some(year),
                ..ClosureFilter::default()
            })
            .await?;

        let months_closed = closures
            .iter()
            .filter(|c| c.closure_type == ClosureType::Monthly && c.status == ClosureStatus::Closed)
            .count() as u32;
        let year_closed = closures
            .iter()
            .any(|c| c.closure_type == ClosureType::Annual && c.status == ClosureStatus::Closed);

        let mut total_income = Decimal::ZERO;
        let mut total_expense = Decimal::ZERO;
        let mut total_result = Decimal::ZERO;
        for closure in &closures {
            total_income += closure.total_income;
            total_expense += closure.total_expense;
            total_result += closure.result;
        }

        Ok(ClosureStats {
            year,
            months_closed,
            months_pending: 12 - months_closed,
            year_closed,
            total_income,
            total_expense,
            total_result,
            closures,
        })
    }
}
