use async_trait::async_trait;
use diesel::prelude::*;
use std::sync::Arc;

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::broker_sync_logs;

use super::model::SyncLogDB;
use tradelens_core::errors::{Error, Result};
use tradelens_core::sync::{SyncLog, SyncLogRepositoryTrait, SyncLogStatus};

/// Repository for sync attempt logs
pub struct SyncLogRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl SyncLogRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl SyncLogRepositoryTrait for SyncLogRepository {
    async fn create(&self, log: SyncLog) -> Result<SyncLog> {
        self.writer
            .exec(move |conn| {
                let row: SyncLogDB = log.into();
                diesel::insert_into(broker_sync_logs::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(row.into())
            })
            .await
    }

    async fn update(&self, log: SyncLog) -> Result<SyncLog> {
        self.writer
            .exec(move |conn| {
                let row: SyncLogDB = log.into();
                let updated = diesel::update(broker_sync_logs::table.find(&row.id))
                    .set(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                if updated == 0 {
                    return Err(Error::NotFound(format!("Sync log {}", row.id)));
                }
                Ok(row.into())
            })
            .await
    }

    fn find_running(&self, connection_id: &str) -> Result<Vec<SyncLog>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = broker_sync_logs::table
            .filter(broker_sync_logs::connection_id.eq(connection_id))
            .filter(broker_sync_logs::status.eq(SyncLogStatus::Running.as_str()))
            .order(broker_sync_logs::started_at.asc())
            .select(SyncLogDB::as_select())
            .load(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    fn list_for_connection(&self, connection_id: &str, limit: i64) -> Result<Vec<SyncLog>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = broker_sync_logs::table
            .filter(broker_sync_logs::connection_id.eq(connection_id))
            .order(broker_sync_logs::started_at.desc())
            .limit(limit)
            .select(SyncLogDB::as_select())
            .load(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    fn list_failed(&self, limit: i64) -> Result<Vec<SyncLog>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = broker_sync_logs::table
            .filter(broker_sync_logs::status.eq(SyncLogStatus::Failed.as_str()))
            .order(broker_sync_logs::started_at.desc())
            .limit(limit)
            .select(SyncLogDB::as_select())
            .load(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
