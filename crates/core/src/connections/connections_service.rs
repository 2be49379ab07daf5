use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use log::{debug, info};
use rand::{rngs::OsRng, RngCore};
use uuid::Uuid;

use super::connections_model::{
    CallerIdentity, Connection, ConnectionChanges, ConnectionStatus, ConnectionUpdate,
    NewConnection, OwnerSummary, ProviderKind, PushTokenGrant,
};
use super::connections_traits::{ConnectionRepositoryTrait, ConnectionServiceTrait};
use crate::errors::{Error, Result, ValidationError};
use crate::secrets::{CredentialCipher, CredentialMap};

const PUSH_TOKEN_BYTES: usize = 32;

/// Generates an opaque, URL-safe push token.
pub fn generate_push_token() -> String {
    let mut bytes = [0u8; PUSH_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Service for managing broker connections
pub struct ConnectionService {
    repository: Arc<dyn ConnectionRepositoryTrait>,
    cipher: Arc<dyn CredentialCipher>,
}

impl ConnectionService {
    pub fn new(
        repository: Arc<dyn ConnectionRepositoryTrait>,
        cipher: Arc<dyn CredentialCipher>,
    ) -> Self {
        Self { repository, cipher }
    }

    fn encrypt_credentials(&self, credentials: Option<&CredentialMap>) -> Result<Option<String>> {
        match credentials {
            Some(map) => self.cipher.encrypt(map).map(Some),
            None => Ok(None),
        }
    }
}

#[async_trait::async_trait]
impl ConnectionServiceTrait for ConnectionService {
    async fn create_connection(&self, new_connection: NewConnection) -> Result<Connection> {
        let provider = ProviderKind::from_str(&new_connection.provider)?;
        let account_identifier = new_connection.account_identifier.trim().to_string();
        if account_identifier.is_empty() {
            return Err(ValidationError::MissingField("account_identifier".to_string()).into());
        }
        if new_connection.owner_id.trim().is_empty() {
            return Err(ValidationError::MissingField("owner_id".to_string()).into());
        }

        if self
            .repository
            .find_by_account(&new_connection.owner_id, provider.as_str(), &account_identifier)?
            .is_some()
        {
            return Err(Error::Conflict(format!(
                "Connection already exists for {provider} account '{account_identifier}'"
            )));
        }

        let now = Utc::now();
        let connection = Connection {
            id: Uuid::new_v4().to_string(),
            owner_id: new_connection.owner_id,
            provider,
            account_identifier,
            credentials_encrypted: self
                .encrypt_credentials(new_connection.credentials.as_ref())?,
            status: ConnectionStatus::Active,
            last_sync_at: None,
            last_sync_status: None,
            last_sync_error: None,
            push_token: None,
            metadata: new_connection.metadata.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };

        let created = self.repository.create(connection).await?;
        info!(
            "Created {} connection {} for owner {}",
            created.provider, created.id, created.owner_id
        );
        Ok(created)
    }

    async fn update_connection(
        &self,
        connection_id: &str,
        update: ConnectionUpdate,
    ) -> Result<Connection> {
        let connection = self.get_connection(connection_id)?;

        let changes = ConnectionChanges {
            account_identifier: update
                .account_identifier
                .map(|account| account.trim().to_string()),
            credentials_encrypted: self.encrypt_credentials(update.credentials.as_ref())?,
            status: update.status,
            metadata: update.metadata,
        };

        debug!("Updating connection {}", connection.id);
        self.repository.update(&connection.id, changes).await
    }

    async fn delete_connection(&self, connection_id: &str) -> Result<()> {
        let deleted = self.repository.delete(connection_id).await?;
        if deleted == 0 {
            return Err(Error::NotFound(format!("Connection {connection_id}")));
        }
        info!("Deleted connection {connection_id}");
        Ok(())
    }

    async fn rotate_push_token(&self, connection_id: &str) -> Result<PushTokenGrant> {
        // Fails with NotFound before a token is minted.
        self.get_connection(connection_id)?;
        let push_token = generate_push_token();
        let connection = self
            .repository
            .set_push_token(connection_id, &push_token)
            .await?;
        info!("Issued a new push token for connection {}", connection.id);
        Ok(PushTokenGrant {
            connection_id: connection.id,
            push_token,
        })
    }

    fn get_connection(&self, connection_id: &str) -> Result<Connection> {
        self.repository
            .get_by_id(connection_id)?
            .ok_or_else(|| Error::NotFound(format!("Connection {connection_id}")))
    }

    fn get_authorized(
        &self,
        connection_id: &str,
        caller: &CallerIdentity,
    ) -> Result<Connection> {
        let connection = self.get_connection(connection_id)?;
        if !caller.can_access(&connection) {
            return Err(Error::Forbidden(format!(
                "Connection {connection_id} belongs to another user"
            )));
        }
        Ok(connection)
    }

    fn list_connections(&self, owner_id: &str) -> Result<Vec<Connection>> {
        self.repository.list_by_owner(owner_id)
    }

    fn list_all_connections(&self) -> Result<Vec<Connection>> {
        self.repository.list_all()
    }

    fn list_owner_summaries(&self) -> Result<Vec<OwnerSummary>> {
        let mut by_owner: BTreeMap<String, Vec<ProviderKind>> = BTreeMap::new();
        for connection in self.repository.list_all()? {
            by_owner
                .entry(connection.owner_id)
                .or_default()
                .push(connection.provider);
        }

        Ok(by_owner
            .into_iter()
            .map(|(owner_id, mut providers)| {
                let connection_count = providers.len();
                providers.sort();
                providers.dedup();
                OwnerSummary {
                    owner_id,
                    connection_count,
                    providers,
                }
            })
            .collect())
    }

    fn decrypted_credentials(&self, connection: &Connection) -> Result<CredentialMap> {
        match connection.credentials_encrypted.as_deref() {
            Some(encrypted) => self.cipher.decrypt(encrypted),
            None => Ok(CredentialMap::new()),
        }
    }
}
