//! Tradelens Core - trade ingestion, normalization and analytics.
//!
//! This crate holds the business logic for broker trade tracking. It is
//! database-agnostic: persistence is expressed through repository traits
//! implemented by the `storage-sqlite` crate.
//!
//! Three producers feed the trade store:
//!
//! ```text
//! CSV upload ──► csv_import ─┐
//! Bridge push ─► push ───────┼──► trades ──► stats (daily aggregates, dashboard)
//! Provider sync (connect) ───┘
//! ```

pub mod connections;
pub mod constants;
pub mod csv_import;
pub mod errors;
pub mod push;
pub mod secrets;
pub mod stats;
pub mod sync;
pub mod trades;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
