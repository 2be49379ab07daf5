//! Database models for sync logs.

use std::str::FromStr;

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::utils::to_utc;
use tradelens_core::sync::{SyncLog, SyncLogStatus};

#[derive(Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::broker_sync_logs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct SyncLogDB {
    pub id: String,
    pub connection_id: String,
    pub started_at: NaiveDateTime,
    pub completed_at: Option<NaiveDateTime>,
    pub status: String,
    pub trades_synced: i64,
    pub error_message: Option<String>,
}

impl From<SyncLogDB> for SyncLog {
    fn from(db: SyncLogDB) -> Self {
        let status = SyncLogStatus::from_str(&db.status).unwrap_or_else(|e| {
            log::warn!("Sync log {}: {}, treating as failed", db.id, e);
            SyncLogStatus::Failed
        });
        Self {
            id: db.id,
            connection_id: db.connection_id,
            started_at: to_utc(db.started_at),
            completed_at: db.completed_at.map(to_utc),
            status,
            trades_synced: db.trades_synced,
            error_message: db.error_message,
        }
    }
}

impl From<SyncLog> for SyncLogDB {
    fn from(domain: SyncLog) -> Self {
        Self {
            id: domain.id,
            connection_id: domain.connection_id,
            started_at: domain.started_at.naive_utc(),
            completed_at: domain.completed_at.map(|dt| dt.naive_utc()),
            status: domain.status.as_str().to_string(),
            trades_synced: domain.trades_synced,
            error_message: domain.error_message,
        }
    }
}
