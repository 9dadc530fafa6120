//! Core types for multi-location weather comparison: locations, daily
//! weather records, calendar months and the history-provider seam.

pub mod daily_record;
pub mod history;
pub mod location;
pub mod month;
pub mod sky;

#[cfg(feature = "api")]
pub mod archive;
