use async_trait::async_trait;

use super::sync_model::SyncLog;
use crate::errors::Result;

/// Persistence contract for sync logs.
#[async_trait]
pub trait SyncLogRepositoryTrait: Send + Sync {
    async fn create(&self, log: SyncLog) -> Result<SyncLog>;

    async fn update(&self, log: SyncLog) -> Result<SyncLog>;

    /// Logs of the connection still in the running state.
    fn find_running(&self, connection_id: &str) -> Result<Vec<SyncLog>>;

    /// Logs of the connection, most recently started first.
    fn list_for_connection(&self, connection_id: &str, limit: i64) -> Result<Vec<SyncLog>>;

    /// Failed logs across every connection, most recently started first.
    fn list_failed(&self, limit: i64) -> Result<Vec<SyncLog>>;
}
