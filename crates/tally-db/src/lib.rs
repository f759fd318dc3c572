//! Traffic event store and aggregation engine.
//!
//! Events are appended to a single `SQLite` table and never modified.
//! Reads come in two flavors: cursor-paged scans that hand back raw events
//! without loading a whole range into memory, and aggregation reports
//! computed in SQL.
//!
//! # Architecture
//!
//! ```text
//! Ingest ---> TrafficDb::append ---> EventStore ----+
//!                                                   |
//!                                          traffic_events (SQLite, WAL)
//!                                                   |
//! Export ---> TrafficDb::stream_events --> EventCursor (id > last_id)
//!                                                   |
//! Reports --> TrafficDb::summary_stats ... --> ReportStore
//! ```
//!
//! # Modules
//!
//! - [`lifecycle`] -- The shared [`TrafficDb`] handle: open, close, facade
//! - [`sqlite`] -- Connection pool and [`StoreConfig`]
//! - [`schema`] -- Table and index definitions
//! - [`event_store`] -- Appends and latest-event lookups
//! - [`cursor`] -- Cursor-paged streaming reads
//! - [`report_store`] -- Summary, daily, and breakdown reports
//! - [`spine`] -- Date spines for zero-filled daily series
//! - [`error`] -- Shared error types

pub mod cursor;
pub mod error;
pub mod event_store;
pub mod lifecycle;
pub mod report_store;
pub mod schema;
pub mod spine;
pub mod sqlite;

// Re-export primary types for convenience.
pub use cursor::EventCursor;
pub use error::DbError;
pub use event_store::{EventRow, EventStore};
pub use lifecycle::TrafficDb;
pub use report_store::{Dimension, ReportStore};
pub use sqlite::StoreConfig;
