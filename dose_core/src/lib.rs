#![forbid(unsafe_code)]

//! Core domain model and business logic for the dose log.
//!
//! This crate provides:
//! - Domain types (doses, rendering switches, statistics modes)
//! - The view pipeline (orientation, filtering, windowing)
//! - Unit-normalized statistics
//! - Log mutations and command dispatch
//! - Persistence (local files, fs-over-http)

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod units;
pub mod dosage;
pub mod view;
pub mod stats;
pub mod format;
pub mod ops;
pub mod command;
pub mod store;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use units::{DoseUnit, UnitTable};
pub use view::{Filter, ViewSpec};
pub use stats::{aggregate, StatRow};
pub use command::{execute, Command, Execution, Invocation, Report};
pub use store::{DoseStore, FileStore, HttpStore, SaveReport};
