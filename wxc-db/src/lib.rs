//! In-memory SQLite store for saved locations and their daily weather history.
//!
//! # Architecture
//!
//! - `Rc<RefCell<Connection>>` wrapper for interior mutability, single-threaded
//! - In-memory SQLite via `rusqlite`
//! - CSV data loaded from the files written by the fetch commands
//! - Typed query methods returning [`wxc_core`] types or serializable
//!   [`models`] structs
//!
//! [`Database`] implements [`DailyHistory`], so it can feed the comparison
//! engine directly.
//!
//! # Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use wxc_db::Database;
//!
//! let db = Database::new().unwrap();
//! db.load_locations("name,lat,lon\nHouston,29.76,-95.37\n").unwrap();
//! db.load_daily_records(
//!     "location_key,date,high,low\n\"29.76,-95.37\",2024-06-21,94.1,77.0\n",
//! )
//! .unwrap();
//!
//! let june = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
//! let records = db
//!     .query_daily_records("29.76,-95.37", june, june + chrono::Duration::days(29))
//!     .unwrap();
//! assert_eq!(records.len(), 1);
//! ```
//!
//! # Tables
//!
//! See [`schema::create_schema`] for the full SQL schema.

pub mod schema;
mod loader;
mod queries;
pub mod models;

use chrono::NaiveDate;
use rusqlite::Connection;
use std::cell::RefCell;
use std::rc::Rc;
use wxc_core::daily_record::DailyRecord;
use wxc_core::history::DailyHistory;
use wxc_core::location::Location;

/// In-memory SQLite database of locations and daily records.
///
/// This struct is cheaply cloneable (via `Rc`); clones share one connection.
#[derive(Clone)]
pub struct Database {
    conn: Rc<RefCell<Connection>>,
}

impl Database {
    /// Create a new in-memory database with the full schema applied.
    ///
    /// The database is empty after creation; use the `load_*` methods
    /// to populate it with CSV data.
    pub fn new() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(schema::create_schema())?;
        Ok(Self {
            conn: Rc::new(RefCell::new(conn)),
        })
    }
}

impl DailyHistory for Database {
    fn daily_records(
        &self,
        location: &Location,
        start: NaiveDate,
        end: NaiveDate,
    ) -> anyhow::Result<Vec<DailyRecord>> {
        self.query_daily_records(&location.key(), start, end)
    }
}
