#![forbid(unsafe_code)]

//! Core domain model and business logic for calfbook.
//!
//! This crate provides:
//! - Domain types (animal records, health events, statuses)
//! - Record identifier generation
//! - Sex-dependent status rules
//! - The session record store and its health log
//! - Derived metrics (latest weight, average daily gain)
//! - CSV reports

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod id;
pub mod status;
pub mod health;
pub mod metrics;
pub mod store;
pub mod report;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use id::generate_id;
pub use metrics::{average_daily_gain, latest_weight, registration_tag};
pub use store::RecordStore;
pub use report::{write_health_report, write_herd_report};
