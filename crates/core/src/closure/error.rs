//! Closure error types.
//!
//! All failures surface directly to the caller with a message naming the
//! precondition that was not met; the engine performs no automatic retry or
//! compensation.

use thiserror::Error;
use tesoria_shared::types::ClosureId;

use super::period::Period;
use super::types::ClosureStatus;
use crate::gateway::{GatewayError, StoreError};

/// Errors that can occur during period closure operations.
#[derive(Debug, Error)]
pub enum ClosureError {
    // ========== Close Guards ==========
    /// The requested period is already closed.
    #[error("Period {period} is already closed")]
    AlreadyClosed {
        /// The period key that was rejected.
        period: Period,
    },

    /// Pre-close validation found blocking violations.
    #[error("Pre-close validation failed: {}", errors.join("; "))]
    Validation {
        /// The complete list of violations, in check order.
        errors: Vec<String>,
    },

    /// Annual close attempted before all twelve months are closed.
    #[error("Cannot close year {year}: all months must be closed first ({months_closed}/12 closed)")]
    IncompletePeriod {
        /// The year being closed.
        year: i32,
        /// Monthly closures currently in CLOSED status.
        months_closed: u32,
    },

    // ========== Record State ==========
    /// No closure record with the given id exists.
    #[error("Closure record not found: {0}")]
    NotFound(ClosureId),

    /// Reopen attempted on a record that is not CLOSED.
    #[error("Cannot reopen closure in {status} status")]
    InvalidState {
        /// The record's actual status.
        status: ClosureStatus,
    },

    /// A CLOSED record already exists for the period key.
    #[error("A closed record already exists for this period")]
    Conflict,

    // ========== Input ==========
    /// Month number outside 1-12.
    #[error("Invalid month number: {0} (expected 1-12)")]
    InvalidMonth(u32),

    // ========== Collaborators ==========
    /// Ledger gateway failure, propagated unchanged.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Closure store failure, propagated unchanged.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ClosureError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AlreadyClosed { .. } => "ALREADY_CLOSED",
            Self::Validation { .. } => "VALIDATION_FAILED",
            Self::IncompletePeriod { .. } => "INCOMPLETE_PERIOD",
            Self::NotFound(_) => "CLOSURE_NOT_FOUND",
            Self::InvalidState { .. } => "INVALID_STATE",
            Self::Conflict => "CLOSURE_CONFLICT",
            Self::InvalidMonth(_) => "INVALID_MONTH",
            Self::Gateway(_) => "GATEWAY_ERROR",
            Self::Store(_) => "STORE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation and precondition errors
            Self::Validation { .. } | Self::IncompletePeriod { .. } | Self::InvalidMonth(_) => 400,

            // 404 Not Found
            Self::NotFound(_) => 404,

            // 409 Conflict - the period key is taken
            Self::AlreadyClosed { .. } | Self::InvalidState { .. } | Self::Conflict => 409,

            // 500 Internal Server Error
            Self::Gateway(_) | Self::Store(_) => 500,
        }
    }

    /// Returns true if the caller can retry after remediating data.
    ///
    /// A failed close is never retried by the engine itself; this only tells
    /// callers whether re-invoking after a fix can succeed without reopening.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::IncompletePeriod { .. }
        )
    }
}
