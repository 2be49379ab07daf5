//! Sync attempt records.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::connections::{Connection, ConnectionStatus, LastSyncStatus};
use crate::constants::SYNC_LOG_ERROR_MAX_CHARS;
use crate::errors::Error;
use crate::utils::text_utils::truncate_chars;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncLogStatus {
    Running,
    Success,
    Failed,
}

impl SyncLogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncLogStatus::Running => "running",
            SyncLogStatus::Success => "success",
            SyncLogStatus::Failed => "failed",
        }
    }
}

impl FromStr for SyncLogStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(SyncLogStatus::Running),
            "success" => Ok(SyncLogStatus::Success),
            "failed" => Ok(SyncLogStatus::Failed),
            other => Err(Error::Unexpected(format!("Unknown sync log status '{other}'"))),
        }
    }
}

/// One sync attempt. Moves from running to success or failed exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncLog {
    pub id: String,
    pub connection_id: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: SyncLogStatus,
    pub trades_synced: i64,
    pub error_message: Option<String>,
}

impl SyncLog {
    pub fn start(connection_id: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            connection_id: connection_id.to_string(),
            started_at: Utc::now(),
            completed_at: None,
            status: SyncLogStatus::Running,
            trades_synced: 0,
            error_message: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == SyncLogStatus::Running
    }

    pub fn succeed(mut self, trades_synced: usize) -> Self {
        self.status = SyncLogStatus::Success;
        self.completed_at = Some(Utc::now());
        self.trades_synced = trades_synced as i64;
        self.error_message = None;
        self
    }

    /// Marks the attempt failed, keeping at most 1000 characters of the message.
    pub fn fail(mut self, message: &str) -> Self {
        self.status = SyncLogStatus::Failed;
        self.completed_at = Some(Utc::now());
        self.error_message = Some(truncate_chars(message, SYNC_LOG_ERROR_MAX_CHARS));
        self
    }
}

/// Snapshot of a connection's sync state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncStatusSummary {
    pub connection_id: String,
    pub status: ConnectionStatus,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub last_sync_status: Option<LastSyncStatus>,
    pub last_sync_error: Option<String>,
    pub current_sync_running: bool,
}

impl SyncStatusSummary {
    pub fn new(connection: &Connection, current_sync_running: bool) -> Self {
        Self {
            connection_id: connection.id.clone(),
            status: connection.status,
            last_sync_at: connection.last_sync_at,
            last_sync_status: connection.last_sync_status,
            last_sync_error: connection.last_sync_error.clone(),
            current_sync_running,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResetResult {
    pub reset_count: usize,
}
