//! SQLite storage implementation for Tradelens.
//!
//! This crate provides all database-related functionality using Diesel ORM with SQLite.
//! It implements the repository traits defined in `tradelens-core` and contains:
//! - Database connection pooling and management
//! - Diesel migrations
//! - Repository implementations for connections, trades, daily stats and sync logs
//! - Database-specific model types (with Diesel derives)
//!
//! # Architecture
//!
//! This crate is the only place in the application where Diesel dependencies exist.
//! All other crates (`core`, `connect`) are database-agnostic and work with traits.
//!
//! ```text
//! core (domain)          connect (sync)
//!       │                      │
//!       └──────────┬───────────┘
//!                  │
//!                  ▼
//!          storage-sqlite (this crate)
//!                  │
//!                  ▼
//!              SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod schema;
mod utils;

// Repository implementations
pub mod connections;
pub mod stats;
pub mod sync_logs;
pub mod trades;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, init, run_migrations, spawn_writer, DbConnection, DbPool,
    WriteHandle,
};

pub use connections::ConnectionRepository;
pub use stats::DailyStatRepository;
pub use sync_logs::SyncLogRepository;
pub use trades::TradeRepository;

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

// Re-export from tradelens-core for convenience
pub use tradelens_core::errors::{DatabaseError, Error, Result};
