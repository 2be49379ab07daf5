//! Database models for broker connections.

use std::str::FromStr;

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde_json::{Map, Value};

use crate::utils::{from_json_column, to_json_column, to_utc};
use tradelens_core::connections::{
    Connection, ConnectionChanges, ConnectionStatus, LastSyncStatus, ProviderKind,
};
use tradelens_core::errors::Error;

/// Database model for broker connections
#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::broker_connections)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ConnectionDB {
    pub id: String,
    pub owner_id: String,
    pub provider: String,
    pub account_identifier: String,
    pub credentials_encrypted: Option<String>,
    pub status: String,
    pub last_sync_at: Option<NaiveDateTime>,
    pub last_sync_status: Option<String>,
    pub last_sync_error: Option<String>,
    pub push_token: Option<String>,
    pub metadata: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<ConnectionDB> for Connection {
    type Error = Error;

    fn try_from(db: ConnectionDB) -> Result<Self, Self::Error> {
        let status = ConnectionStatus::from_str(&db.status).unwrap_or_else(|e| {
            log::warn!("Connection {}: {}, treating as active", db.id, e);
            ConnectionStatus::Active
        });
        Ok(Self {
            provider: ProviderKind::from_str(&db.provider)?,
            status,
            last_sync_status: db
                .last_sync_status
                .as_deref()
                .and_then(|s| LastSyncStatus::from_str(s).ok()),
            last_sync_at: db.last_sync_at.map(to_utc),
            metadata: from_json_column::<Map<String, Value>>(db.metadata.as_deref(), "metadata"),
            created_at: to_utc(db.created_at),
            updated_at: to_utc(db.updated_at),
            id: db.id,
            owner_id: db.owner_id,
            account_identifier: db.account_identifier,
            credentials_encrypted: db.credentials_encrypted,
            last_sync_error: db.last_sync_error,
            push_token: db.push_token,
        })
    }
}

impl From<Connection> for ConnectionDB {
    fn from(domain: Connection) -> Self {
        Self {
            metadata: to_json_column(&domain.metadata, domain.metadata.is_empty()),
            provider: domain.provider.as_str().to_string(),
            status: domain.status.as_str().to_string(),
            last_sync_status: domain.last_sync_status.map(|s| s.as_str().to_string()),
            last_sync_at: domain.last_sync_at.map(|dt| dt.naive_utc()),
            created_at: domain.created_at.naive_utc(),
            updated_at: domain.updated_at.naive_utc(),
            id: domain.id,
            owner_id: domain.owner_id,
            account_identifier: domain.account_identifier,
            credentials_encrypted: domain.credentials_encrypted,
            last_sync_error: domain.last_sync_error,
            push_token: domain.push_token,
        }
    }
}

/// Changeset over the user-editable connection columns. `None` fields are
/// skipped; `Some(None)` metadata clears the column.
#[derive(AsChangeset, Debug)]
#[diesel(table_name = crate::schema::broker_connections)]
pub struct ConnectionChangesDB {
    pub account_identifier: Option<String>,
    pub credentials_encrypted: Option<String>,
    pub status: Option<String>,
    pub metadata: Option<Option<String>>,
    pub updated_at: NaiveDateTime,
}

impl ConnectionChangesDB {
    pub fn new(changes: ConnectionChanges, updated_at: NaiveDateTime) -> Self {
        Self {
            account_identifier: changes.account_identifier,
            credentials_encrypted: changes.credentials_encrypted,
            status: changes.status.map(|s| s.as_str().to_string()),
            metadata: changes
                .metadata
                .map(|metadata| to_json_column(&metadata, metadata.is_empty())),
            updated_at,
        }
    }
}
