//! SQLite storage implementation for sync logs.

mod model;
mod repository;

pub use model::SyncLogDB;
pub use repository::SyncLogRepository;
