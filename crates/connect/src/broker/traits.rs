//! Traits defining the contract for providers and sync operations.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use super::models::{AccountInfo, NormalizedTrade};
use tradelens_core::connections::{Connection, ProviderKind};
use tradelens_core::errors::Result;
use tradelens_core::sync::{SyncLog, SyncResetResult, SyncStatusSummary};

/// Capabilities every broker integration offers.
#[async_trait]
pub trait BrokerProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Checks that the credentials needed by the selected platform are present.
    async fn validate_credentials(&self) -> Result<bool>;

    /// Trades executed in the optional window, closed or still open.
    async fn fetch_trades(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<NormalizedTrade>>;

    async fn fetch_account_info(&self) -> Result<Option<AccountInfo>>;

    async fn fetch_open_positions(&self) -> Result<Vec<NormalizedTrade>>;
}

/// Trait for the sync service operations
#[async_trait]
pub trait SyncServiceTrait: Send + Sync {
    /// Pulls trades from the connection's provider and merges them by external id.
    ///
    /// Fails only when the sync is refused (already running or cooling down).
    /// Failures past that point are recorded on the returned log.
    async fn trigger_sync(&self, connection: &Connection) -> Result<SyncLog>;

    fn get_sync_status(&self, connection: &Connection) -> Result<SyncStatusSummary>;

    /// Latest attempts first.
    fn list_sync_logs(&self, connection_id: &str, limit: i64) -> Result<Vec<SyncLog>>;

    /// Force-fails running logs older than `older_than`, or all of them when `None`.
    async fn reset_stuck_syncs(
        &self,
        connection: &Connection,
        older_than: Option<Duration>,
    ) -> Result<SyncResetResult>;

    /// Failed attempts across every connection, latest first.
    fn list_failed_sync_logs(&self, limit: i64) -> Result<Vec<SyncLog>>;
}
