use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use std::sync::Arc;

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{broker_connections, broker_daily_stats, broker_sync_logs, broker_trades};

use super::model::{ConnectionChangesDB, ConnectionDB};
use tradelens_core::connections::{
    Connection, ConnectionChanges, ConnectionRepositoryTrait, SyncStateUpdate,
};
use tradelens_core::errors::{Error, Result};

fn into_domain(rows: Vec<ConnectionDB>) -> Result<Vec<Connection>> {
    rows.into_iter().map(Connection::try_from).collect()
}

/// Repository for broker connections
pub struct ConnectionRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl ConnectionRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl ConnectionRepositoryTrait for ConnectionRepository {
    async fn create(&self, connection: Connection) -> Result<Connection> {
        self.writer
            .exec(move |conn| {
                let row: ConnectionDB = connection.into();
                diesel::insert_into(broker_connections::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Connection::try_from(row)
            })
            .await
    }

    async fn update(&self, connection_id: &str, changes: ConnectionChanges) -> Result<Connection> {
        let id = connection_id.to_string();
        self.writer
            .exec(move |conn| {
                let changeset = ConnectionChangesDB::new(changes, Utc::now().naive_utc());
                let updated = diesel::update(broker_connections::table.find(&id))
                    .set(&changeset)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                if updated == 0 {
                    return Err(Error::NotFound(format!("Connection {id}")));
                }
                let row = broker_connections::table
                    .find(&id)
                    .select(ConnectionDB::as_select())
                    .first(conn)
                    .map_err(StorageError::from)?;
                Connection::try_from(row)
            })
            .await
    }

    async fn delete(&self, connection_id: &str) -> Result<usize> {
        let id = connection_id.to_string();
        self.writer
            .exec(move |conn| {
                diesel::delete(broker_trades::table.filter(broker_trades::connection_id.eq(&id)))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                diesel::delete(
                    broker_daily_stats::table.filter(broker_daily_stats::connection_id.eq(&id)),
                )
                .execute(conn)
                .map_err(StorageError::from)?;
                diesel::delete(
                    broker_sync_logs::table.filter(broker_sync_logs::connection_id.eq(&id)),
                )
                .execute(conn)
                .map_err(StorageError::from)?;
                let deleted = diesel::delete(broker_connections::table.find(&id))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(deleted)
            })
            .await
    }

    async fn update_sync_state(
        &self,
        connection_id: &str,
        update: SyncStateUpdate,
    ) -> Result<()> {
        let id = connection_id.to_string();
        self.writer
            .exec(move |conn| {
                let now = Utc::now().naive_utc();
                let status = Some(update.last_sync_status.as_str().to_string());
                let target = broker_connections::table.find(&id);
                let updated = match update.last_sync_at {
                    Some(at) => diesel::update(target)
                        .set((
                            broker_connections::last_sync_at.eq(Some(at.naive_utc())),
                            broker_connections::last_sync_status.eq(status),
                            broker_connections::last_sync_error.eq(update.last_sync_error),
                            broker_connections::updated_at.eq(now),
                        ))
                        .execute(conn),
                    None => diesel::update(target)
                        .set((
                            broker_connections::last_sync_status.eq(status),
                            broker_connections::last_sync_error.eq(update.last_sync_error),
                            broker_connections::updated_at.eq(now),
                        ))
                        .execute(conn),
                }
                .map_err(StorageError::from)?;
                if updated == 0 {
                    return Err(Error::NotFound(format!("Connection {id}")));
                }
                Ok(())
            })
            .await
    }

    async fn set_push_token(&self, connection_id: &str, push_token: &str) -> Result<Connection> {
        let id = connection_id.to_string();
        let token = push_token.to_string();
        self.writer
            .exec(move |conn| {
                let updated = diesel::update(broker_connections::table.find(&id))
                    .set((
                        broker_connections::push_token.eq(Some(token)),
                        broker_connections::updated_at.eq(Utc::now().naive_utc()),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                if updated == 0 {
                    return Err(Error::NotFound(format!("Connection {id}")));
                }
                let row = broker_connections::table
                    .find(&id)
                    .select(ConnectionDB::as_select())
                    .first(conn)
                    .map_err(StorageError::from)?;
                Connection::try_from(row)
            })
            .await
    }

    fn get_by_id(&self, connection_id: &str) -> Result<Option<Connection>> {
        let mut conn = get_connection(&self.pool)?;
        broker_connections::table
            .find(connection_id)
            .select(ConnectionDB::as_select())
            .first(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .map(Connection::try_from)
            .transpose()
    }

    fn find_by_account(
        &self,
        owner_id: &str,
        provider: &str,
        account_identifier: &str,
    ) -> Result<Option<Connection>> {
        let mut conn = get_connection(&self.pool)?;
        broker_connections::table
            .filter(broker_connections::owner_id.eq(owner_id))
            .filter(broker_connections::provider.eq(provider))
            .filter(broker_connections::account_identifier.eq(account_identifier))
            .select(ConnectionDB::as_select())
            .first(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .map(Connection::try_from)
            .transpose()
    }

    fn find_by_push_token(&self, push_token: &str) -> Result<Option<Connection>> {
        let mut conn = get_connection(&self.pool)?;
        broker_connections::table
            .filter(broker_connections::push_token.eq(push_token))
            .select(ConnectionDB::as_select())
            .first(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .map(Connection::try_from)
            .transpose()
    }

    fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Connection>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = broker_connections::table
            .filter(broker_connections::owner_id.eq(owner_id))
            .order(broker_connections::created_at.desc())
            .select(ConnectionDB::as_select())
            .load(&mut conn)
            .map_err(StorageError::from)?;
        into_domain(rows)
    }

    fn list_all(&self) -> Result<Vec<Connection>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = broker_connections::table
            .order(broker_connections::created_at.desc())
            .select(ConnectionDB::as_select())
            .load(&mut conn)
            .map_err(StorageError::from)?;
        into_domain(rows)
    }
}
