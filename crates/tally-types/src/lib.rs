//! Shared type definitions for the Tally traffic analytics store.
//!
//! This crate is the single source of truth for the event and report types
//! used across the workspace. Types defined here flow downstream to
//! `TypeScript` via `ts-rs` for dashboard clients.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe identifier wrappers
//! - [`structs`] -- Stored events, ingest payloads, and time ranges
//! - [`reports`] -- Aggregation report shapes
//! - [`labels`] -- Placeholder labels and shared limits

pub mod ids;
pub mod labels;
pub mod reports;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use ids::SiteId;
pub use reports::{BreakdownRow, DailyCount, ReferrerCount, SummaryReport};
pub use structs::{TimeRange, TrafficEvent, TrafficEventInput};
