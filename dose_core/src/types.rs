//! Core domain types for the dose log.
//!
//! This module defines the fundamental types used throughout the system:
//! - Dose records and the input for creating one
//! - Rendering switches shared by the view pipeline and the formatter
//! - Statistics modes

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

// ============================================================================
// Records
// ============================================================================

/// A single logged dose
///
/// `position` is the stable identity of a record: it is assigned once when
/// the dose is added and never reused, so it stays meaningful after the list
/// is re-sorted by timestamp.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Dose {
    pub position: i64,
    pub timestamp: DateTime<FixedOffset>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub timezone: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub date: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub time: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub dosage: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub drug: String,
    #[serde(default, rename = "roa", skip_serializing_if = "String::is_empty")]
    pub route: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub note: String,
}

impl Dose {
    /// Refresh the stored local date/time strings from the timestamp
    pub fn refresh_local_fields(&mut self) {
        self.date = self.timestamp.format("%Y/%m/%d").to_string();
        self.time = self.timestamp.format("%H:%M").to_string();
    }
}

/// Input for the add operation, before a position is assigned
#[derive(Clone, Debug)]
pub struct NewDose {
    pub timestamp: DateTime<FixedOffset>,
    pub timezone: String,
    pub dosage: String,
    pub drug: String,
    /// Falls back to the configured default route when `None`
    pub route: Option<String>,
    pub note: String,
}

// ============================================================================
// Rendering
// ============================================================================

/// Switches that change how a record is rendered to text
///
/// These affect filtering too, since filters match the rendered line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderOptions {
    pub ignore_notes: bool,
    pub show_unix_epoch: bool,
    pub compact_time: bool,
}

// ============================================================================
// Statistics
// ============================================================================

/// Aggregation mode for statistics
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatsMode {
    Total,
    Average,
}

impl StatsMode {
    /// Name of the synthetic summary row
    pub fn summary_label(self) -> &'static str {
        match self {
            StatsMode::Total => "Total",
            StatsMode::Average => "Average",
        }
    }
}
