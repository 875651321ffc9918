//! In-memory implementations of the Tesoria data-access seams.
//!
//! [`MemoryLedger`] and [`MemoryClosureStore`] back the closure engine with
//! plain in-process state behind async locks. They are the reference
//! implementations used by the integration tests; a database-backed pair
//! implements the same traits against the municipal schema.

pub mod memory;

pub use memory::{MemoryClosureStore, MemoryLedger, Reconciliation, TreasuryTransaction};
