//! Connection repository and service traits.

use async_trait::async_trait;

use super::connections_model::{
    CallerIdentity, Connection, ConnectionChanges, ConnectionUpdate, NewConnection, OwnerSummary, PushTokenGrant,
    SyncStateUpdate,
};
use crate::errors::Result;
use crate::secrets::CredentialMap;

/// Persistence contract for broker connections.
#[async_trait]
pub trait ConnectionRepositoryTrait: Send + Sync {
    /// Inserts a fully built connection.
    async fn create(&self, connection: Connection) -> Result<Connection>;

    /// Writes the given user-editable columns only. Sync bookkeeping and the
    /// push token keep their stored values.
    async fn update(&self, connection_id: &str, changes: ConnectionChanges)
        -> Result<Connection>;

    /// Deletes a connection together with its trades, daily stats and sync logs.
    ///
    /// Returns the number of deleted connection rows.
    async fn delete(&self, connection_id: &str) -> Result<usize>;

    async fn update_sync_state(&self, connection_id: &str, update: SyncStateUpdate)
        -> Result<()>;

    async fn set_push_token(&self, connection_id: &str, push_token: &str) -> Result<Connection>;

    fn get_by_id(&self, connection_id: &str) -> Result<Option<Connection>>;

    fn find_by_account(
        &self,
        owner_id: &str,
        provider: &str,
        account_identifier: &str,
    ) -> Result<Option<Connection>>;

    /// Exact-match lookup on the push token column.
    fn find_by_push_token(&self, push_token: &str) -> Result<Option<Connection>>;

    /// Connections of one owner, newest first.
    fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Connection>>;

    /// All connections, newest first.
    fn list_all(&self) -> Result<Vec<Connection>>;
}

/// Business operations on connections.
#[async_trait]
pub trait ConnectionServiceTrait: Send + Sync {
    async fn create_connection(&self, new_connection: NewConnection) -> Result<Connection>;

    async fn update_connection(
        &self,
        connection_id: &str,
        update: ConnectionUpdate,
    ) -> Result<Connection>;

    async fn delete_connection(&self, connection_id: &str) -> Result<()>;

    /// Issues a new push token, replacing any previous one.
    async fn rotate_push_token(&self, connection_id: &str) -> Result<PushTokenGrant>;

    fn get_connection(&self, connection_id: &str) -> Result<Connection>;

    /// Loads a connection the caller owns, or any connection for admins.
    fn get_authorized(&self, connection_id: &str, caller: &CallerIdentity)
        -> Result<Connection>;

    fn list_connections(&self, owner_id: &str) -> Result<Vec<Connection>>;

    fn list_all_connections(&self) -> Result<Vec<Connection>>;

    fn list_owner_summaries(&self) -> Result<Vec<OwnerSummary>>;

    /// Decrypts the stored credentials. Connections without credentials yield an empty map.
    fn decrypted_credentials(&self, connection: &Connection) -> Result<CredentialMap>;
}
