//! Infrastructure layer for cross-cutting concerns.
//!
//! Provides foundational infrastructure including:
//! - Configuration management and validation
//! - The closed error-code taxonomy and result types

pub mod config;
pub mod error;
