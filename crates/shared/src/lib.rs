//! Shared types, errors, and configuration for Deprecia.
//!
//! This crate provides common types used across all other crates:
//! - Currencies with per-currency rounding
//! - Typed IDs for type-safe entity references
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, EngineConfig, LoggingConfig};
pub use error::{AppError, AppResult};
