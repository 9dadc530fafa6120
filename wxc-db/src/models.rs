//! Query result model structs.
//!
//! All structs derive `Serialize` so they can be written straight to JSON
//! by the command layer.

use serde::Serialize;

/// How much history is stored for one location.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LocationCoverage {
    pub location_key: String,
    pub name: String,
    /// Earliest stored date (YYYY-MM-DD), `None` without records.
    pub first_date: Option<String>,
    /// Latest stored date (YYYY-MM-DD).
    pub last_date: Option<String>,
    /// Number of stored days.
    pub days: u32,
}

/// Stored days for one location in one calendar month.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MonthCoverage {
    /// Month as YYYY-MM.
    pub month: String,
    pub days: u32,
}

/// Rows accepted and rejected by a CSV load.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct LoadSummary {
    pub loaded: u32,
    pub skipped: u32,
}
