//! Core business logic for Tesoria.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `closure` - Accounting period closure engine (monthly/annual closing,
//!   pre-close validation, closing-entry generation, reopening)
//! - `gateway` - Abstract data-access seams the engine reads and writes through

pub mod closure;
pub mod gateway;
