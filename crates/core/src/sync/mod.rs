//! Sync module - records of provider sync attempts.

mod sync_model;
mod sync_traits;

pub use sync_model::{SyncLog, SyncLogStatus, SyncResetResult, SyncStatusSummary};
pub use sync_traits::SyncLogRepositoryTrait;
