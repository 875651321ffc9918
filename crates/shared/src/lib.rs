//! Shared types and configuration for Tesoria.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - Closure engine configuration management

pub mod config;
pub mod types;

pub use config::{AppConfig, ClosureConfig};
